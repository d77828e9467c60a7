use sourcewire::sink::{DirectorySourceSink, SourceSink};
use sourcewire::source::{DeclarationSource, FileDeclarationSource};
use sourcewire_di::generator::GeneratedSource;
use sourcewire_di::marker::MarkerKind;
use sourcewire_di::model::{AttributeValue, TypeKind};
use sourcewire_di::types::TypeRef;
use std::fs;
use std::path::PathBuf;

fn scratch_directory(name: &str) -> PathBuf {
    let directory = std::env::temp_dir().join(format!("sourcewire-{name}-{}", std::process::id()));
    fs::create_dir_all(&directory).unwrap();
    directory
}

const DUMP: &str = r#"{
    "declarations": [
        {
            "namespace": "App",
            "name": "IClock",
            "kind": "interface"
        },
        {
            "namespace": "App",
            "name": "Reporter",
            "is_partial": true,
            "interfaces": ["App.IReporter"],
            "attributes": [
                { "name": "Scoped" },
                {
                    "name": "ConditionalService",
                    "named_arguments": [
                        { "name": "Environment", "value": { "str": "Production" } }
                    ]
                }
            ],
            "fields": [
                {
                    "name": "_clock",
                    "type": "App.IClock",
                    "attributes": [{ "name": "Inject" }]
                }
            ]
        }
    ]
}"#;

#[test]
fn should_read_declaration_dump() {
    let directory = scratch_directory("source");
    let path = directory.join("declarations.json");
    fs::write(&path, DUMP).unwrap();

    let declarations = FileDeclarationSource::new(path.to_string_lossy().into_owned())
        .load()
        .unwrap();

    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].kind, TypeKind::Interface);

    let reporter = &declarations[1];
    assert!(reporter.is_partial);
    assert_eq!(reporter.interfaces, vec![TypeRef::parse("App.IReporter").unwrap()]);
    assert!(reporter.has_marker(MarkerKind::Scoped));
    assert_eq!(
        reporter.attributes[1].named("Environment"),
        Some(&AttributeValue::Str("Production".to_string()))
    );
    assert_eq!(
        reporter.fields[0].field_type,
        TypeRef::parse("App.IClock").unwrap()
    );

    fs::remove_dir_all(directory).unwrap();
}

#[test]
fn should_fail_for_missing_dump() {
    let directory = scratch_directory("missing");
    let path = directory.join("missing.json");

    assert!(FileDeclarationSource::new(path.to_string_lossy().into_owned())
        .load()
        .is_err());

    fs::remove_dir_all(directory).unwrap();
}

#[test]
fn should_write_sources_by_hint_name() {
    let directory = scratch_directory("sink").join("generated");
    let sink = DirectorySourceSink::new(directory.clone());

    sink.write(&GeneratedSource {
        hint_name: "App.Reporter.Constructor.g.cs".to_string(),
        text: "// <auto-generated/>\n".to_string(),
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(directory.join("App.Reporter.Constructor.g.cs")).unwrap(),
        "// <auto-generated/>\n"
    );

    fs::remove_dir_all(directory.parent().unwrap()).unwrap();
}
