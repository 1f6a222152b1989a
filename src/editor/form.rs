use serde::Serialize;

use crate::domains::new_id;
use crate::domains::prompt::Prompt;

/// One question row in the editor. `key` is stable for the life of the
/// editor and independent of `id`, which is set when the row is loaded or
/// first sent in a save and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionEntry {
    key: String,
    id: Option<String>,
    pub question: String,
}

impl QuestionEntry {
    pub fn blank() -> Self {
        Self {
            key: new_id(),
            id: None,
            question: String::new(),
        }
    }

    pub fn from_prompt(prompt: Prompt) -> Self {
        Self {
            key: new_id(),
            id: Some(prompt.id),
            question: prompt.question,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// An entry without an id has never been sent and can be dropped
    /// without a backend call.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn mark_persisted(&mut self, id: String) {
        self.id = Some(id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotForm {
    pub name: String,
    pub business_name: String,
    pub about_us: String,
    pub questions: Vec<QuestionEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the user, the server-side counterpart of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Saved,
    Failed(String),
}

impl WriteOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Result of a save. The two halves are independent: either can fail while
/// the other lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub chatbot: WriteOutcome,
    pub questions: WriteOutcome,
}

impl SaveReport {
    pub fn is_saved(&self) -> bool {
        self.chatbot.is_saved() && self.questions.is_saved()
    }

    pub fn notices(&self) -> Vec<Notice> {
        let mut notices = Vec::new();
        match &self.chatbot {
            WriteOutcome::Saved => notices.push(Notice::success("Chatbot details updated")),
            WriteOutcome::Failed(_) => {
                notices.push(Notice::error("Unable to update chatbot details"))
            }
        }
        match &self.questions {
            WriteOutcome::Saved => notices.push(Notice::success("Questions updated")),
            WriteOutcome::Failed(_) => notices.push(Notice::error("Unable to update questions")),
        }
        notices
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Never existed remotely; removed without a backend call.
    Discarded,
    /// Deleted remotely, then removed locally.
    Deleted,
    /// Remote delete failed; the entry is still in the form.
    Failed(String),
}

impl RemoveOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Discarded => None,
            Self::Deleted => Some(Notice::success("Deleted successfully")),
            Self::Failed(_) => Some(Notice::error("Unable to delete")),
        }
    }
}
