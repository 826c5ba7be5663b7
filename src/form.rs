//! Configuration forms built from an indexer's setting descriptors
//!
//! The backend describes each indexer's settings as a list of descriptors.
//! `build_fields` pairs those descriptors with the current config values to
//! get an editable working set, and `collect_values` turns the working set
//! back into the config patch sent on save. No validation happens here:
//! empty values are submitted as empty strings and the backend decides what
//! is acceptable.

use crate::backend::types::{Config, Indexer, SettingDescriptor, SettingKind, URL_KEY};

/// One editable field of a configuration form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub descriptor: SettingDescriptor,
    pub value: String,
}

impl FormField {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }

    /// Placeholder text; `build_fields` always fills it in
    pub fn placeholder(&self) -> &str {
        self.descriptor
            .placeholder
            .as_deref()
            .unwrap_or(&self.descriptor.label)
    }

    pub fn is_secret(&self) -> bool {
        self.descriptor.kind.is_secret()
    }
}

/// Editable configuration of one indexer
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigForm {
    pub indexer_id: String,
    pub indexer_name: String,
    pub fields: Vec<FormField>,
}

impl ConfigForm {
    /// Record an edit. Names that are not part of the form are ignored.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.descriptor.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => {
                tracing::debug!("Ignoring edit of unknown field {:?}", name);
                false
            }
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.descriptor.name == name)
            .map(|f| f.value.as_str())
    }
}

fn url_descriptor() -> SettingDescriptor {
    SettingDescriptor {
        name: URL_KEY.to_string(),
        label: "URL".to_string(),
        kind: SettingKind::Text,
        placeholder: None,
    }
}

/// Pair each setting descriptor of `indexer` with its value in `config`
pub fn build_fields(indexer: &Indexer, config: &Config) -> ConfigForm {
    // The url field always leads, declared or not
    let url = indexer
        .settings
        .iter()
        .find(|s| s.name == URL_KEY)
        .cloned()
        .unwrap_or_else(url_descriptor);

    let fields = std::iter::once(url)
        .chain(indexer.settings.iter().filter(|s| s.name != URL_KEY).cloned())
        .map(|mut descriptor| {
            let value = config.get(&descriptor.name).unwrap_or_default().to_string();
            if descriptor.placeholder.is_none() {
                descriptor.placeholder = Some(descriptor.label.clone());
            }
            FormField { descriptor, value }
        })
        .collect();

    ConfigForm {
        indexer_id: indexer.id.clone(),
        indexer_name: indexer.name.clone(),
        fields,
    }
}

/// Read the form back into a config patch. Saving always (re-)enables.
pub fn collect_values(form: &ConfigForm) -> Config {
    let mut config: Config = form
        .fields
        .iter()
        .map(|f| (f.descriptor.name.clone(), f.value.clone()))
        .collect();
    config.set_enabled(true);
    config
}
