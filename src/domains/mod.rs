pub mod chatbot;
pub mod conversation;
pub mod prompt;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Nullable text columns read as empty strings.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier columns may be text (uuid) or integer (bigserial) depending on
/// the schema; both are carried as opaque strings.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
