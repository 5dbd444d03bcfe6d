use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Settings read from the legacy Python `config.py` module (or an equivalent
/// TOML/JSON file). Every member is optional; an attribute set to `None` is
/// indistinguishable from one that was never defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySettings {
    #[serde(rename = "SCRYPT_ID_PEPPER", default)]
    pub scrypt_id_pepper: Option<Value>,

    #[serde(rename = "SCRYPT_GPG_PEPPER", default)]
    pub scrypt_gpg_pepper: Option<Value>,

    #[serde(rename = "DEFAULT_LOCALE", default)]
    pub default_locale: Option<Value>,

    #[serde(rename = "SUPPORTED_LOCALES", default)]
    pub supported_locales: Option<Value>,

    #[serde(rename = "SCRYPT_PARAMS", default)]
    pub scrypt_params: Option<Value>,

    #[serde(rename = "SourceInterfaceFlaskConfig", default)]
    pub source_interface: Option<FlaskSettings>,

    #[serde(rename = "JournalistInterfaceFlaskConfig", default)]
    pub journalist_interface: Option<FlaskSettings>,

    #[serde(rename = "CUSTOM_HEADER_IMAGE", default)]
    pub custom_header_image: Option<Value>,
}

/// One of the per-interface Flask config classes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlaskSettings {
    #[serde(rename = "SECRET_KEY", default)]
    pub secret_key: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct I18n {
    pub default_locale: Value,
    pub supported_locales: Value,
}

impl I18n {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("default_locale".to_string(), self.default_locale.clone());
        map.insert("supported_locales".to_string(), self.supported_locales.clone());
        Value::Object(map)
    }
}

/// The fields pulled out of a legacy source. `None` means "not provided" and
/// is never written to an output document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub id_pepper: Option<Value>,
    pub gpg_pepper: Option<Value>,
    pub i18n: Option<I18n>,
    pub scrypt_params: Option<Value>,
    pub source_secret_key: Option<Value>,
    pub journalist_secret_key: Option<Value>,
    pub custom_header_image: Option<Value>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A JSON object destined for one output file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument(Map<String, Value>);

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub document: ConfigDocument,
}

/// How the migration lock is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Wait for the holder to finish.
    Blocking,
    /// Fail at once if the lock is held.
    NonBlocking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated { written: Vec<PathBuf> },
    /// Destination(s) existed and `--force` was not given; nothing was written.
    AlreadyMigrated { existing: Vec<PathBuf> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_settings_from_json() {
        let settings: LegacySettings = serde_json::from_value(json!({
            "SCRYPT_ID_PEPPER": "abc",
            "SCRYPT_PARAMS": {"N": 16384, "r": 8, "p": 1},
            "JournalistInterfaceFlaskConfig": {"SECRET_KEY": "j", "DEBUG": false},
            "STORE_DIR": "/var/lib/securedrop/store"
        }))
        .unwrap();

        assert_eq!(settings.scrypt_id_pepper, Some(json!("abc")));
        assert_eq!(settings.scrypt_params, Some(json!({"N": 16384, "r": 8, "p": 1})));
        assert_eq!(
            settings.journalist_interface,
            Some(FlaskSettings { secret_key: Some(json!("j")) })
        );
        assert!(settings.source_interface.is_none());
        assert!(settings.default_locale.is_none());
    }

    #[test]
    fn test_null_attribute_is_absent() {
        let settings: LegacySettings =
            serde_json::from_value(json!({"DEFAULT_LOCALE": null})).unwrap();
        assert!(settings.default_locale.is_none());
    }

    #[test]
    fn test_document_serializes_as_plain_object() {
        let mut doc = ConfigDocument::new();
        doc.insert("scrypt_id_pepper", json!("abc"));
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"scrypt_id_pepper":"abc"}"#);
        assert_eq!(serde_json::to_string(&ConfigDocument::new()).unwrap(), "{}");
    }
}
