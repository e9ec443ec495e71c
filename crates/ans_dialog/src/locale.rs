use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::error;

pub const REQUEST_NOTIFICATION_KEY: &str = "message.requestNotification";
pub const ALLOW_BUTTON_KEY: &str = "message.allowButton";
pub const CANCEL_BUTTON_KEY: &str = "message.cancelButton";

const ENGLISH: &str = include_str!("../resources/en.json");

/// Flattened localization resource, addressed by dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    strings: HashMap<String, String>,
}

impl LocaleTable {
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("invalid locale resource")?;
        let mut strings = HashMap::new();
        flatten("", &value, &mut strings);
        Ok(Self { strings })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read locale resource {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn english() -> Self {
        Self::from_json(ENGLISH).unwrap_or_else(|err| {
            error!(%err, "built-in locale resource is broken");
            Self::default()
        })
    }

    /// Looks up `key`; an untranslated key is returned as is.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(key)
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_table_has_dialog_keys() {
        let table = LocaleTable::english();
        assert_eq!(table.translate(ALLOW_BUTTON_KEY), "Allow");
        assert_ne!(table.translate(REQUEST_NOTIFICATION_KEY), REQUEST_NOTIFICATION_KEY);
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let table = LocaleTable::from_json(r#"{"message": {"allowButton": "Oui"}}"#).unwrap();
        assert_eq!(table.translate(ALLOW_BUTTON_KEY), "Oui");
        assert_eq!(table.translate(CANCEL_BUTTON_KEY), CANCEL_BUTTON_KEY);
    }
}
