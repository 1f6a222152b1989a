use serde::{Deserialize, Serialize};

use super::{null_as_empty, opaque_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chatbot {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub business_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub about_us: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
}

/// Row sent when creating a chatbot; the owner comes from the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChatbot {
    pub name: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub about_us: String,
}

/// Scalar fields the editor writes back in one update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatbotPatch {
    pub name: String,
    pub business_name: String,
    pub about_us: String,
}
