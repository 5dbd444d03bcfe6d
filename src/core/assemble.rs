use crate::domain::model::{ConfigDocument, ExtractedFields, I18n};

/// The per-interface documents produced from one set of extracted fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleDocuments {
    pub source: ConfigDocument,
    pub journalist: ConfigDocument,
}

impl RoleDocuments {
    /// Single-file layout: both roles nested under their interface keys.
    pub fn combined(self) -> ConfigDocument {
        let mut combined = ConfigDocument::new();
        combined.insert("source_interface", self.source.into_value());
        combined.insert("journalist_interface", self.journalist.into_value());
        combined
    }
}

/// Route each present field to the role document(s) that use it. Absent
/// fields are left out entirely.
pub fn assemble(fields: &ExtractedFields) -> RoleDocuments {
    let mut docs = RoleDocuments::default();

    let shared = [
        ("scrypt_id_pepper", fields.id_pepper.clone()),
        ("scrypt_gpg_pepper", fields.gpg_pepper.clone()),
        ("i18n", fields.i18n.as_ref().map(I18n::to_value)),
        ("scrypt_params", fields.scrypt_params.clone()),
        ("custom_header_image", fields.custom_header_image.clone()),
    ];

    for (key, value) in shared {
        if let Some(value) = value {
            docs.source.insert(key, value.clone());
            docs.journalist.insert(key, value);
        }
    }

    if let Some(key) = &fields.source_secret_key {
        docs.source.insert("secret_key", key.clone());
    }

    if let Some(key) = &fields.journalist_secret_key {
        docs.journalist.insert("secret_key", key.clone());
    }

    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn keys(doc: &ConfigDocument) -> Vec<&str> {
        let mut keys: Vec<&str> = doc.keys().collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn test_only_id_pepper() {
        let fields = ExtractedFields {
            id_pepper: Some(json!("abc")),
            ..Default::default()
        };

        let docs = assemble(&fields);

        assert_eq!(docs.source.clone().into_value(), json!({"scrypt_id_pepper": "abc"}));
        assert_eq!(docs.journalist.into_value(), json!({"scrypt_id_pepper": "abc"}));
    }

    #[test]
    fn test_secret_keys_stay_with_their_role() {
        let fields = ExtractedFields {
            source_secret_key: Some(json!("s")),
            journalist_secret_key: Some(json!("j")),
            ..Default::default()
        };

        let docs = assemble(&fields);

        assert_eq!(docs.source.get("secret_key"), Some(&json!("s")));
        assert_eq!(docs.journalist.get("secret_key"), Some(&json!("j")));
        assert_eq!(docs.source.len(), 1);
        assert_eq!(docs.journalist.len(), 1);
    }

    #[test]
    fn test_routed_keys_for_every_field_subset() {
        let present = |mask: u8, bit: u8, value: Value| (mask & (1 << bit) != 0).then_some(value);
        let i18n = || I18n {
            default_locale: json!("en_US"),
            supported_locales: json!(["en_US"]),
        };

        for mask in 0u8..128 {
            let fields = ExtractedFields {
                id_pepper: present(mask, 0, json!("id")),
                gpg_pepper: present(mask, 1, json!("gpg")),
                i18n: (mask & (1 << 2) != 0).then(i18n),
                scrypt_params: present(mask, 3, json!({"N": 1})),
                source_secret_key: present(mask, 4, json!("s")),
                journalist_secret_key: present(mask, 5, json!("j")),
                custom_header_image: present(mask, 6, json!("logo.png")),
            };

            let docs = assemble(&fields);

            let mut shared = Vec::new();
            if fields.gpg_pepper.is_some() {
                shared.push("scrypt_gpg_pepper");
            }
            if fields.id_pepper.is_some() {
                shared.push("scrypt_id_pepper");
            }
            if fields.i18n.is_some() {
                shared.push("i18n");
            }
            if fields.scrypt_params.is_some() {
                shared.push("scrypt_params");
            }
            if fields.custom_header_image.is_some() {
                shared.push("custom_header_image");
            }

            let mut source = shared.clone();
            if fields.source_secret_key.is_some() {
                source.push("secret_key");
            }
            let mut journalist = shared;
            if fields.journalist_secret_key.is_some() {
                journalist.push("secret_key");
            }
            source.sort_unstable();
            journalist.sort_unstable();

            assert_eq!(keys(&docs.source), source, "mask {mask:#08b}");
            assert_eq!(keys(&docs.journalist), journalist, "mask {mask:#08b}");
            assert!(docs
                .source
                .clone()
                .into_value()
                .as_object()
                .unwrap()
                .values()
                .all(|v| !v.is_null()));
        }
    }

    #[test]
    fn test_i18n_shape() {
        let fields = ExtractedFields {
            i18n: Some(I18n {
                default_locale: json!("en_US"),
                supported_locales: json!(["en_US", "de_DE"]),
            }),
            ..Default::default()
        };

        let docs = assemble(&fields);

        assert_eq!(
            docs.journalist.get("i18n"),
            Some(&json!({"default_locale": "en_US", "supported_locales": ["en_US", "de_DE"]}))
        );
    }

    #[test]
    fn test_combined_layout() {
        let fields = ExtractedFields {
            custom_header_image: Some(json!("logo.png")),
            source_secret_key: Some(json!("s")),
            ..Default::default()
        };

        let combined = assemble(&fields).combined();

        assert_eq!(
            combined.into_value(),
            json!({
                "source_interface": {"custom_header_image": "logo.png", "secret_key": "s"},
                "journalist_interface": {"custom_header_image": "logo.png"}
            })
        );
    }

    #[test]
    fn test_empty_fields_give_empty_documents() {
        let docs = assemble(&ExtractedFields::default());
        assert!(docs.source.is_empty());
        assert!(docs.journalist.is_empty());

        assert_eq!(
            docs.combined().into_value(),
            json!({"source_interface": {}, "journalist_interface": {}})
        );
    }
}
