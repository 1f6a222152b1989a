use serde::{Deserialize, Serialize};

use super::{null_as_empty, opaque_id};

/// One logged exchange from the live widget. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub chatbot_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bot_answer: String,
}
