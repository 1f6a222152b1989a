//! Bot configuration editor.
//!
//! Holds one chatbot's scalar fields and its ordered questions. Field edits,
//! appends and reorders stay local until [`BotEditor::save`]; removing a
//! question that already exists remotely deletes it immediately so it cannot
//! come back on the next revalidation.

mod form;

use serde_json::Value;
use tracing::{info, warn};

use crate::domains::chatbot::{Chatbot, ChatbotPatch};
use crate::domains::new_id;
use crate::domains::prompt::{sort_by_question_number, Prompt};
use crate::error::{BotboardError, Result};
use crate::interfaces::gateway::{
    Filter, GatewayResponse, PersistenceGateway, Session, Table,
};

pub use form::{
    BotForm, Notice, NoticeLevel, QuestionEntry, RemoveOutcome, SaveReport, WriteOutcome,
};

/// What the editor is initialised from: one chatbot row and its questions.
#[derive(Debug, Clone)]
pub struct EditorSnapshot {
    pub chatbot: Chatbot,
    pub questions: Vec<Prompt>,
}

/// A finished drag gesture. `destination` is `None` when the entry was
/// dropped outside the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragDrop {
    pub source: usize,
    pub destination: Option<usize>,
}

/// Everything a save sends, computed from the current form.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePlan {
    pub patch: ChatbotPatch,
    pub rows: Vec<Prompt>,
}

pub struct BotEditor {
    chatbot_id: String,
    form: BotForm,
}

impl BotEditor {
    pub fn load(snapshot: EditorSnapshot) -> Self {
        let EditorSnapshot {
            chatbot,
            mut questions,
        } = snapshot;
        sort_by_question_number(&mut questions);
        Self {
            chatbot_id: chatbot.id,
            form: BotForm {
                name: chatbot.name,
                business_name: chatbot.business_name,
                about_us: chatbot.about_us,
                questions: questions
                    .into_iter()
                    .map(QuestionEntry::from_prompt)
                    .collect(),
            },
        }
    }

    pub fn chatbot_id(&self) -> &str {
        &self.chatbot_id
    }

    pub fn form(&self) -> &BotForm {
        &self.form
    }

    pub fn questions(&self) -> &[QuestionEntry] {
        &self.form.questions
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.form.name = value.into();
    }

    pub fn set_business_name(&mut self, value: impl Into<String>) {
        self.form.business_name = value.into();
    }

    pub fn set_about_us(&mut self, value: impl Into<String>) {
        self.form.about_us = value.into();
    }

    pub fn set_question(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.form.questions[index].question = text.into();
        Ok(())
    }

    /// Returns false when no entry has `key`.
    pub fn set_question_by_key(&mut self, key: &str, text: impl Into<String>) -> bool {
        match self
            .form
            .questions
            .iter_mut()
            .find(|entry| entry.key() == key)
        {
            Some(entry) => {
                entry.question = text.into();
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.form
            .questions
            .iter()
            .position(|entry| entry.key() == key)
    }

    pub fn append_question(&mut self) -> &QuestionEntry {
        self.form.questions.push(QuestionEntry::blank());
        let last = self.form.questions.len() - 1;
        &self.form.questions[last]
    }

    pub async fn remove_question(
        &mut self,
        gateway: &dyn PersistenceGateway,
        session: &Session,
        index: usize,
    ) -> Result<RemoveOutcome> {
        self.check_index(index)?;
        let Some(id) = self.form.questions[index].id().map(str::to_string) else {
            self.form.questions.remove(index);
            return Ok(RemoveOutcome::Discarded);
        };

        let outcome = match gateway
            .delete(session, Table::ChatQuestions, &[Filter::eq("id", id.as_str())])
            .await
        {
            Ok(response) => match response.error_message() {
                None => RemoveOutcome::Deleted,
                Some(message) => RemoveOutcome::Failed(message),
            },
            Err(err) => RemoveOutcome::Failed(err.to_string()),
        };

        match &outcome {
            RemoveOutcome::Deleted => {
                self.form.questions.remove(index);
                info!(chatbot_id = %self.chatbot_id, question_id = %id, "question deleted");
            }
            RemoveOutcome::Failed(message) => {
                warn!(chatbot_id = %self.chatbot_id, question_id = %id, "delete failed: {}", message);
            }
            RemoveOutcome::Discarded => {}
        }
        Ok(outcome)
    }

    /// Moves the entry at `from` so that it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let entry = self.form.questions.remove(from);
            self.form.questions.insert(to, entry);
        }
        Ok(())
    }

    pub fn drag_end(&mut self, drop: DragDrop) -> Result<()> {
        match drop.destination {
            Some(destination) => self.reorder(drop.source, destination),
            None => Ok(()),
        }
    }

    /// Numbers every entry by its position and gives unsaved entries a
    /// fresh id. Nothing in the form changes.
    pub fn plan(&self) -> Result<SavePlan> {
        let name = self.form.name.trim();
        if name.is_empty() {
            return Err(BotboardError::Validation(
                "chatbot name is required".to_string(),
            ));
        }
        let rows = self
            .form
            .questions
            .iter()
            .enumerate()
            .map(|(position, entry)| Prompt {
                id: entry.id().map(str::to_string).unwrap_or_else(new_id),
                chatbot_id: self.chatbot_id.clone(),
                question: entry.question.clone(),
                question_number: position as i32 + 1,
            })
            .collect();
        Ok(SavePlan {
            patch: ChatbotPatch {
                name: name.to_string(),
                business_name: self.form.business_name.clone(),
                about_us: self.form.about_us.clone(),
            },
            rows,
        })
    }

    /// Sends the chatbot update and the question upsert side by side. Each
    /// half reports on its own; a failure leaves the form as the user left
    /// it and nothing is retried or rolled back.
    ///
    /// Generated ids are written onto the entries before anything is sent,
    /// so saving again after a lost reply updates the same rows.
    pub async fn save(
        &mut self,
        gateway: &dyn PersistenceGateway,
        session: &Session,
    ) -> Result<SaveReport> {
        let plan = self.plan()?;
        for (entry, row) in self.form.questions.iter_mut().zip(&plan.rows) {
            if !entry.is_persisted() {
                entry.mark_persisted(row.id.clone());
            }
        }
        let patch = serde_json::to_value(&plan.patch)?;
        let rows = plan
            .rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;

        let chatbot_filter = [Filter::eq("id", self.chatbot_id.as_str())];
        let update = gateway.update(session, Table::Chatbots, patch, &chatbot_filter);
        let upsert = async {
            if rows.is_empty() {
                return Ok(GatewayResponse::ok(201, None));
            }
            gateway.upsert(session, Table::ChatQuestions, rows).await
        };
        let (chatbot_result, questions_result) = tokio::join!(update, upsert);

        let chatbot = outcome_of(chatbot_result);
        let questions = outcome_of(questions_result);

        if let WriteOutcome::Failed(message) = &chatbot {
            warn!(chatbot_id = %self.chatbot_id, "chatbot update failed: {}", message);
        }
        if let WriteOutcome::Failed(message) = &questions {
            warn!(chatbot_id = %self.chatbot_id, "question upsert failed: {}", message);
        }
        info!(
            chatbot_id = %self.chatbot_id,
            questions = self.form.questions.len(),
            chatbot_saved = chatbot.is_saved(),
            questions_saved = questions.is_saved(),
            "editor save finished"
        );

        Ok(SaveReport { chatbot, questions })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.form.questions.len() {
            Ok(())
        } else {
            Err(BotboardError::Validation(format!(
                "question index {index} is out of range"
            )))
        }
    }
}

fn outcome_of(result: Result<GatewayResponse>) -> WriteOutcome {
    match result {
        Ok(response) => match response.error_message() {
            None => WriteOutcome::Saved,
            Some(message) => WriteOutcome::Failed(message),
        },
        Err(err) => WriteOutcome::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chatbot() -> Chatbot {
        Chatbot {
            id: "bot-1".to_string(),
            user_id: "user-1".to_string(),
            name: "Helper".to_string(),
            business_name: "Acme".to_string(),
            about_us: "We sell anvils".to_string(),
            created_at: String::new(),
        }
    }

    fn prompt(id: &str, question: &str, number: i32) -> Prompt {
        Prompt {
            id: id.to_string(),
            chatbot_id: "bot-1".to_string(),
            question: question.to_string(),
            question_number: number,
        }
    }

    fn editor(questions: Vec<Prompt>) -> BotEditor {
        BotEditor::load(EditorSnapshot {
            chatbot: chatbot(),
            questions,
        })
    }

    fn order(editor: &BotEditor) -> Vec<String> {
        editor
            .questions()
            .iter()
            .map(|entry| entry.question.clone())
            .collect()
    }

    #[test]
    fn question_text_is_set_by_key() {
        let mut editor = editor(vec![prompt("a", "A", 1), prompt("b", "B", 2)]);
        let key = editor.questions()[1].key().to_string();

        assert!(editor.set_question_by_key(&key, "Bee"));
        assert!(!editor.set_question_by_key("gone", "Lost"));
        assert_eq!(order(&editor), vec!["A", "Bee"]);
    }

    #[test]
    fn load_sorts_by_question_number() {
        let editor = editor(vec![prompt("b", "B", 2), prompt("a", "A", 1)]);
        assert_eq!(order(&editor), vec!["A", "B"]);
        assert_eq!(editor.questions()[0].id(), Some("a"));
    }

    #[test]
    fn reorder_moves_to_destination_index() {
        let mut editor = editor(vec![
            prompt("a", "A", 1),
            prompt("b", "B", 2),
            prompt("c", "C", 3),
        ]);
        editor.reorder(2, 0).unwrap();
        assert_eq!(order(&editor), vec!["C", "A", "B"]);
        editor.reorder(0, 2).unwrap();
        assert_eq!(order(&editor), vec!["A", "B", "C"]);
        assert!(editor.reorder(0, 3).is_err());
    }

    #[test]
    fn drop_outside_the_list_changes_nothing() {
        let mut editor = editor(vec![prompt("a", "A", 1), prompt("b", "B", 2)]);
        let keys: Vec<String> = editor
            .questions()
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        editor
            .drag_end(DragDrop {
                source: 0,
                destination: None,
            })
            .unwrap();
        let after: Vec<String> = editor
            .questions()
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        assert_eq!(keys, after);
    }

    #[test]
    fn keys_survive_reordering() {
        let mut editor = editor(vec![prompt("a", "A", 1), prompt("b", "B", 2)]);
        let key_of_b = editor.questions()[1].key().to_string();
        editor.reorder(1, 0).unwrap();
        assert_eq!(editor.index_of(&key_of_b), Some(0));
    }

    #[test]
    fn plan_numbers_by_position_and_fills_missing_ids() {
        let mut editor = editor(vec![
            prompt("a", "A", 1),
            prompt("b", "B", 2),
            prompt("c", "C", 3),
        ]);
        editor.reorder(2, 0).unwrap();
        editor.append_question();
        editor.set_question(3, "D").unwrap();

        let plan = editor.plan().unwrap();
        let numbered: Vec<(String, i32)> = plan
            .rows
            .iter()
            .map(|row| (row.question.clone(), row.question_number))
            .collect();
        assert_eq!(
            numbered,
            vec![
                ("C".to_string(), 1),
                ("A".to_string(), 2),
                ("B".to_string(), 3),
                ("D".to_string(), 4),
            ]
        );
        assert!(!plan.rows[3].id.is_empty());
        assert!(["a", "b", "c"].iter().all(|id| *id != plan.rows[3].id));
        assert!(plan.rows.iter().all(|row| row.chatbot_id == "bot-1"));
        // planning does not touch the form
        assert!(!editor.questions()[3].is_persisted());
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut editor = editor(Vec::new());
        editor.set_name("   ");
        assert!(matches!(editor.plan(), Err(BotboardError::Validation(_))));
    }

    #[test]
    fn partial_failure_reports_each_half() {
        let report = SaveReport {
            chatbot: WriteOutcome::Failed("boom".to_string()),
            questions: WriteOutcome::Saved,
        };
        assert!(!report.is_saved());
        let notices = report.notices();
        assert_eq!(notices[0], Notice::error("Unable to update chatbot details"));
        assert_eq!(notices[1], Notice::success("Questions updated"));
    }
}
