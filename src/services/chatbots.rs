use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domains::chatbot::{Chatbot, NewChatbot};
use crate::domains::new_id;
use crate::domains::prompt::Prompt;
use crate::error::{BotboardError, Result};
use crate::interfaces::gateway::{Filter, GatewayResponse, PersistenceGateway, Session, Table};

/// Single-row writes and reads that do not go through the editor.
pub struct ChatbotService {
    gateway: Arc<dyn PersistenceGateway>,
}

fn ensure_success(response: &GatewayResponse) -> Result<()> {
    match response.error_message() {
        Some(message) => Err(BotboardError::Runtime(message)),
        None => Ok(()),
    }
}

impl ChatbotService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create_chatbot(&self, session: &Session, new: NewChatbot) -> Result<Chatbot> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(BotboardError::Validation(
                "chatbot name is required".to_string(),
            ));
        }
        let row = json!({
            "id": new_id(),
            "user_id": session.user_id,
            "name": name,
            "business_name": new.business_name,
            "about_us": new.about_us,
        });
        let response = self.gateway.insert(session, Table::Chatbots, row).await?;
        ensure_success(&response)?;
        let chatbot = response
            .first_row::<Chatbot>()?
            .ok_or_else(|| BotboardError::Runtime("insert returned no row".to_string()))?;
        info!(chatbot_id = %chatbot.id, user_id = %session.user_id, "chatbot created");
        Ok(chatbot)
    }

    pub async fn retrieve_chatbots(&self, session: &Session) -> Result<Vec<Chatbot>> {
        let response = self
            .gateway
            .select(
                session,
                Table::Chatbots,
                &[Filter::eq("user_id", session.user_id.as_str())],
            )
            .await?;
        response.rows()
    }

    /// Appends one question after the highest existing number.
    pub async fn add_question(
        &self,
        session: &Session,
        chatbot_id: &str,
        question: &str,
    ) -> Result<Prompt> {
        let owner = self
            .gateway
            .select(session, Table::Chatbots, &[Filter::eq("id", chatbot_id)])
            .await?;
        if owner.rows::<Chatbot>()?.is_empty() {
            return Err(BotboardError::NotFound(format!("chatbot {chatbot_id}")));
        }

        let existing = self
            .gateway
            .select(
                session,
                Table::ChatQuestions,
                &[Filter::eq("chatbot_id", chatbot_id)],
            )
            .await?
            .rows::<Prompt>()?;
        let next_number = existing
            .iter()
            .map(|prompt| prompt.question_number)
            .max()
            .unwrap_or(0)
            + 1;

        let row = json!({
            "id": new_id(),
            "chatbot_id": chatbot_id,
            "question": question,
            "question_number": next_number,
        });
        let response = self
            .gateway
            .insert(session, Table::ChatQuestions, row)
            .await?;
        ensure_success(&response)?;
        response
            .first_row::<Prompt>()?
            .ok_or_else(|| BotboardError::Runtime("insert returned no row".to_string()))
    }

    pub async fn update_question(
        &self,
        session: &Session,
        question_id: &str,
        question: &str,
    ) -> Result<()> {
        let response = self
            .gateway
            .update(
                session,
                Table::ChatQuestions,
                json!({"question": question}),
                &[Filter::eq("id", question_id)],
            )
            .await?;
        ensure_success(&response)
    }

    pub async fn update_user_name(&self, session: &Session, full_name: &str) -> Result<()> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(BotboardError::Validation("name is required".to_string()));
        }
        let response = self
            .gateway
            .update(
                session,
                Table::Users,
                json!({"full_name": full_name}),
                &[Filter::eq("id", session.user_id.as_str())],
            )
            .await?;
        ensure_success(&response)
    }
}
