use serde::{Deserialize, Serialize};

use super::{null_as_empty, opaque_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub chatbot_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    #[serde(default)]
    pub question_number: i32,
}

pub fn sort_by_question_number(prompts: &mut [Prompt]) {
    prompts.sort_by_key(|prompt| prompt.question_number);
}
