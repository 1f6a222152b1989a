use crate::domains::chatbot::Chatbot;
use crate::domains::conversation::ConversationTurn;
use crate::domains::prompt::{sort_by_question_number, Prompt};
use crate::domains::user::User;
use crate::interfaces::gateway::{Filter, Table};

use super::fetch::ResourceQuery;

pub struct BotListQuery {
    pub user_id: Option<String>,
}

impl ResourceQuery for BotListQuery {
    type Item = Chatbot;

    fn table(&self) -> Table {
        Table::Chatbots
    }

    fn filters(&self) -> Option<Vec<Filter>> {
        let user_id = self.user_id.as_deref()?;
        Some(vec![Filter::eq("user_id", user_id)])
    }

    fn error_message(&self) -> &'static str {
        "error in getting all bots"
    }
}

pub struct ChatbotDetailsQuery {
    pub chatbot_id: Option<String>,
}

impl ResourceQuery for ChatbotDetailsQuery {
    type Item = Chatbot;

    fn table(&self) -> Table {
        Table::Chatbots
    }

    fn filters(&self) -> Option<Vec<Filter>> {
        let chatbot_id = self.chatbot_id.as_deref()?;
        Some(vec![Filter::eq("id", chatbot_id)])
    }

    fn error_message(&self) -> &'static str {
        "error in getting chatbot details"
    }
}

pub struct PromptListQuery {
    pub chatbot_id: Option<String>,
}

impl ResourceQuery for PromptListQuery {
    type Item = Prompt;

    fn table(&self) -> Table {
        Table::ChatQuestions
    }

    fn filters(&self) -> Option<Vec<Filter>> {
        let chatbot_id = self.chatbot_id.as_deref()?;
        Some(vec![Filter::eq("chatbot_id", chatbot_id)])
    }

    fn error_message(&self) -> &'static str {
        "error in getting all prompts"
    }

    fn arrange(&self, items: &mut Vec<Prompt>) {
        sort_by_question_number(items);
    }
}

pub enum ConversationScope {
    /// Every turn the session user can see.
    All,
    Chatbot(Option<String>),
}

pub struct ConversationListQuery {
    pub scope: ConversationScope,
}

impl ConversationListQuery {
    pub fn all() -> Self {
        Self {
            scope: ConversationScope::All,
        }
    }

    pub fn for_chatbot(chatbot_id: Option<String>) -> Self {
        Self {
            scope: ConversationScope::Chatbot(chatbot_id),
        }
    }
}

impl ResourceQuery for ConversationListQuery {
    type Item = ConversationTurn;

    fn table(&self) -> Table {
        Table::UserResponse
    }

    fn filters(&self) -> Option<Vec<Filter>> {
        match &self.scope {
            ConversationScope::All => Some(Vec::new()),
            ConversationScope::Chatbot(chatbot_id) => {
                let chatbot_id = chatbot_id.as_deref()?;
                Some(vec![Filter::eq("chatbot_id", chatbot_id)])
            }
        }
    }

    fn error_message(&self) -> &'static str {
        "error in getting all conversations"
    }
}

pub struct UserDetailsQuery {
    pub user_id: Option<String>,
}

impl ResourceQuery for UserDetailsQuery {
    type Item = User;

    fn table(&self) -> Table {
        Table::Users
    }

    fn filters(&self) -> Option<Vec<Filter>> {
        let user_id = self.user_id.as_deref()?;
        Some(vec![Filter::eq("id", user_id)])
    }

    fn error_message(&self) -> &'static str {
        "error in getting user details"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_parameters_disable_the_read() {
        assert!(BotListQuery { user_id: None }.filters().is_none());
        assert!(PromptListQuery { chatbot_id: None }.filters().is_none());
        assert!(ConversationListQuery::for_chatbot(None).filters().is_none());
        assert_eq!(ConversationListQuery::all().filters(), Some(Vec::new()));
    }

    #[test]
    fn prompts_are_arranged_by_question_number() {
        let query = PromptListQuery {
            chatbot_id: Some("bot".to_string()),
        };
        let prompt = |id: &str, n: i32| Prompt {
            id: id.to_string(),
            chatbot_id: "bot".to_string(),
            question: id.to_string(),
            question_number: n,
        };
        let mut items = vec![prompt("c", 3), prompt("a", 1), prompt("b", 2)];
        query.arrange(&mut items);
        let order: Vec<&str> = items.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
