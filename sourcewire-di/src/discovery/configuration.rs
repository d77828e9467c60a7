use crate::configuration::ConfigurationInjectionInfo;
use crate::marker::{ConfigurationAttributes, MarkerKind};
use crate::model::FieldDeclaration;
use tracing::debug;

/// Instance fields carrying the `InjectConfiguration` marker.
pub fn configuration_fields(fields: &[FieldDeclaration]) -> Vec<ConfigurationInjectionInfo> {
    fields
        .iter()
        .filter(|field| field.is_instance())
        .filter_map(|field| {
            field
                .marker(MarkerKind::InjectConfiguration)
                .map(|marker| (field, marker))
        })
        .filter_map(
            |(field, marker)| match ConfigurationAttributes::try_from(marker) {
                Ok(attributes) => Some(ConfigurationInjectionInfo::new(field, attributes)),
                Err(error) => {
                    debug!(field = %field.name, %error, "Skipping malformed marker.");
                    None
                }
            },
        )
        .collect()
}
