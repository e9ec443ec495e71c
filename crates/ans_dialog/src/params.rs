use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parameters the dialog page is routed with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteParams {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_notification: Option<String>,
    #[serde(default)]
    pub allow_button: Option<String>,
    #[serde(default)]
    pub cancel_button: Option<String>,
    /// Held in its textual form; numeric uids are stringified on parse.
    #[serde(default, deserialize_with = "uid_as_string")]
    pub uid: Option<String>,
}

impl RouteParams {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).context("invalid dialog route parameters")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid dialog route parameters")
    }

    pub fn uid(&self) -> Result<&str> {
        self.uid
            .as_deref()
            .ok_or_else(|| anyhow!("dialog route parameters carry no uid"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUid {
    Number(serde_json::Number),
    Text(String),
}

fn uid_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawUid> = Option::deserialize(deserializer)?;
    Ok(raw.map(|uid| match uid {
        RawUid::Number(number) => number.to_string(),
        RawUid::Text(text) => text,
    }))
}
