use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BotboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Chatbots,
    ChatQuestions,
    UserResponse,
    Users,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chatbots => "chatbots",
            Self::ChatQuestions => "chat_questions",
            Self::UserResponse => "user_response",
            Self::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Select,
    Insert,
    Update,
    Upsert,
    Delete,
}

/// Equality predicate `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match row.get(&self.column) {
            Some(Value::String(value)) => value == &self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// The `{ data, error, status }` triple every gateway call answers with.
/// Backend failures are carried in `error`; only transport failures are
/// returned as `Err` from the trait methods.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub data: Option<Value>,
    pub error: Option<GatewayError>,
    pub status: u16,
}

impl GatewayResponse {
    pub fn ok(status: u16, data: Option<Value>) -> Self {
        Self {
            data,
            error: None,
            status,
        }
    }

    pub fn failed(status: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(GatewayError {
                message: message.into(),
                code: None,
            }),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }

    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.message.clone());
        }
        if !(200..300).contains(&self.status) {
            return Some(format!("unexpected status {}", self.status));
        }
        None
    }

    /// Decodes `data` as a row list. A single object is treated as one row;
    /// an empty body as no rows.
    pub fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if let Some(message) = self.error_message() {
            return Err(BotboardError::Runtime(message));
        }
        match &self.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).map_err(BotboardError::from))
                .collect(),
            Some(other) => Ok(vec![serde_json::from_value(other.clone())?]),
        }
    }

    pub fn first_row<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        Ok(self.rows::<T>()?.into_iter().next())
    }
}

/// Resolved auth identity plus the bearer token the backend evaluates
/// row-level security against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn select(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse>;

    async fn insert(&self, session: &Session, table: Table, row: Value)
        -> Result<GatewayResponse>;

    async fn update(
        &self,
        session: &Session,
        table: Table,
        patch: Value,
        filters: &[Filter],
    ) -> Result<GatewayResponse>;

    /// Rows are keyed by `id`: existing ids merge, unknown ids insert.
    async fn upsert(
        &self,
        session: &Session,
        table: Table,
        rows: Vec<Value>,
    ) -> Result<GatewayResponse>;

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse>;

    /// `None` when the token is unknown or expired.
    async fn user_for_token(&self, access_token: &str) -> Result<Option<Session>>;

    /// `None` when the credentials are rejected.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_strings_and_numbers() {
        let row = json!({"id": 7, "chatbot_id": "bot-1", "note": null});
        assert!(Filter::eq("chatbot_id", "bot-1").matches(&row));
        assert!(Filter::eq("id", "7").matches(&row));
        assert!(!Filter::eq("note", "null").matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }

    #[test]
    fn error_response_is_not_success_even_with_2xx() {
        let mut response = GatewayResponse::ok(200, Some(json!([])));
        assert!(response.is_success());
        response.error = Some(GatewayError {
            message: "boom".to_string(),
            code: None,
        });
        assert!(!response.is_success());
        assert_eq!(response.error_message().as_deref(), Some("boom"));
    }

    #[test]
    fn rows_accepts_single_object_and_empty_body() {
        #[derive(Deserialize)]
        struct Row {
            id: String,
        }

        let single = GatewayResponse::ok(201, Some(json!({"id": "a"})));
        let rows: Vec<Row> = single.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "a");

        let empty = GatewayResponse::ok(204, None);
        assert!(empty.rows::<Row>().unwrap().is_empty());

        let failed = GatewayResponse::failed(500, "down");
        assert!(failed.rows::<Row>().is_err());
    }
}
