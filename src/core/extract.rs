use crate::domain::model::{ExtractedFields, FlaskSettings, I18n, LegacySettings};
use serde_json::Value;

/// Pull the migrated fields out of the legacy settings. A source that could not
/// be loaded at all (`None`) yields an empty set of fields.
pub fn extract(settings: Option<&LegacySettings>) -> ExtractedFields {
    let Some(settings) = settings else {
        return ExtractedFields::default();
    };

    let i18n = match (&settings.default_locale, &settings.supported_locales) {
        (Some(default_locale), Some(supported_locales)) => Some(I18n {
            default_locale: default_locale.clone(),
            supported_locales: supported_locales.clone(),
        }),
        _ => None,
    };

    ExtractedFields {
        id_pepper: settings.scrypt_id_pepper.clone().filter(is_truthy),
        gpg_pepper: settings.scrypt_gpg_pepper.clone().filter(is_truthy),
        i18n,
        scrypt_params: settings.scrypt_params.clone(),
        source_secret_key: secret_key(settings.source_interface.as_ref()),
        journalist_secret_key: secret_key(settings.journalist_interface.as_ref()),
        custom_header_image: settings.custom_header_image.clone(),
    }
}

fn secret_key(flask: Option<&FlaskSettings>) -> Option<Value> {
    flask.and_then(|f| f.secret_key.clone())
}

/// Python truthiness for the value types a settings module can hold.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
