use sourcewire_di::generator::{Generator, GeneratorOptions};
use sourcewire_di::model::{AttributeData, AttributeValue, FieldDeclaration, TypeDeclaration, TypeKind};
use sourcewire_di::type_system::StaticTypeSystem;
use sourcewire_di::types::TypeRef;

fn ty(text: &str) -> TypeRef {
    TypeRef::parse(text).unwrap()
}

fn interface(name: &str) -> TypeDeclaration {
    TypeDeclaration {
        kind: TypeKind::Interface,
        ..TypeDeclaration::new(Some("App"), name)
    }
}

fn service(name: &str, interfaces: &[&str]) -> TypeDeclaration {
    TypeDeclaration {
        is_partial: true,
        interfaces: interfaces.iter().map(|name| ty(name)).collect(),
        ..TypeDeclaration::new(Some("App"), name)
    }
}

fn environment(name: &str) -> AttributeData {
    AttributeData::new("ConditionalService")
        .with_named_argument("Environment", AttributeValue::Str(name.to_string()))
}

fn registration_module(declarations: Vec<TypeDeclaration>) -> String {
    let type_system = StaticTypeSystem::new(declarations);
    let options = GeneratorOptions {
        assembly_name: "Shop".to_string(),
        root_namespace: "Shop".to_string(),
        ..GeneratorOptions::default()
    };

    let output = Generator::new(&type_system, &type_system, &options).generate();
    output
        .source("GeneratedServiceCollectionExtensions.g.cs")
        .map(|source| source.text.clone())
        .unwrap()
}

#[test]
fn should_share_singleton_instance_between_interfaces() {
    let text = registration_module(vec![
        interface("IA"),
        interface("IB"),
        service("Both", &["App.IA", "App.IB"])
            .with_attribute(AttributeData::new("Singleton"))
            .with_attribute(
                AttributeData::new("RegisterAsAll")
                    .with_argument(AttributeValue::Enum("RegistrationMode.All".to_string()))
                    .with_argument(AttributeValue::Enum("InstanceSharing.Shared".to_string())),
            ),
    ]);

    assert!(text.contains("services.AddSingleton<global::App.Both>();"));
    assert!(text.contains(
        "services.AddSingleton<global::App.IA>(provider => provider.GetRequiredService<global::App.Both>());"
    ));
    assert!(text.contains(
        "services.AddSingleton<global::App.IB>(provider => provider.GetRequiredService<global::App.Both>());"
    ));
    assert_eq!(text.matches("services.AddSingleton").count(), 3);
}

#[test]
fn should_chain_mutually_exclusive_alternatives() {
    let text = registration_module(vec![
        interface("INotifier"),
        service("EmailNotifier", &["App.INotifier"])
            .with_attribute(AttributeData::new("Scoped"))
            .with_attribute(environment("Production")),
        service("ConsoleNotifier", &["App.INotifier"])
            .with_attribute(AttributeData::new("Scoped"))
            .with_attribute(environment("Development")),
    ]);

    let expected = r#"public static class GeneratedServiceCollectionExtensions
{
    public static global::Microsoft.Extensions.DependencyInjection.IServiceCollection AddShopRegisteredServices(this global::Microsoft.Extensions.DependencyInjection.IServiceCollection services)
    {
        var environment = global::System.Environment.GetEnvironmentVariable("ASPNETCORE_ENVIRONMENT") ?? global::System.Environment.GetEnvironmentVariable("DOTNET_ENVIRONMENT") ?? string.Empty;

        if (string.Equals(environment, "Development", global::System.StringComparison.OrdinalIgnoreCase))
        {
            services.AddScoped<global::App.ConsoleNotifier>();
            services.AddScoped<global::App.INotifier, global::App.ConsoleNotifier>();
        }
        else if (string.Equals(environment, "Production", global::System.StringComparison.OrdinalIgnoreCase))
        {
            services.AddScoped<global::App.EmailNotifier>();
            services.AddScoped<global::App.INotifier, global::App.EmailNotifier>();
        }

        return services;
    }
}
"#;

    assert!(text.contains("namespace Shop.Extensions.Generated;"));
    assert!(text.ends_with(expected), "{text}");
    assert!(!text.contains("else\n"));
}

#[test]
fn should_guard_overlapping_alternatives_independently() {
    let text = registration_module(vec![
        interface("ICache"),
        service("RedisCache", &["App.ICache"])
            .with_attribute(AttributeData::new("Singleton"))
            .with_attribute(
                AttributeData::new("ConditionalService")
                    .with_named_argument("ConfigValue", AttributeValue::Str("Cache:Redis".to_string())),
            ),
        service("MemoryCache", &["App.ICache"])
            .with_attribute(AttributeData::new("Singleton"))
            .with_attribute(environment("Development")),
    ]);

    assert!(!text.contains("else if"));
    assert!(text.contains("if (!string.IsNullOrEmpty(configuration[\"Cache:Redis\"]))"));
    assert!(text.contains(
        "AddShopRegisteredServices(this global::Microsoft.Extensions.DependencyInjection.IServiceCollection services, global::Microsoft.Extensions.Configuration.IConfiguration configuration)"
    ));
}

#[test]
fn should_bind_options_and_register_hosted_services() {
    let text = registration_module(vec![
        service("Mailer", &[])
            .with_attribute(AttributeData::new("Transient"))
            .with_field(
                FieldDeclaration::new("_smtp", ty("IOptions<App.SmtpSettings>"))
                    .with_attribute(AttributeData::new("InjectConfiguration")),
            ),
        TypeDeclaration {
            base_type: Some(ty("Microsoft.Extensions.Hosting.BackgroundService")),
            ..service("Worker", &[])
        }
        .with_attribute(AttributeData::new("BackgroundService")),
    ]);

    assert!(text.contains(
        "services.Configure<global::App.SmtpSettings>(configuration.GetSection(\"Smtp\"));"
    ));
    assert!(text.contains("services.AddHostedService<global::App.Worker>();"));
    assert!(text.contains("using Microsoft.Extensions.Configuration;"));
}
