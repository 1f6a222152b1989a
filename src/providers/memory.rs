use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::domains::new_id;
use crate::error::Result;
use crate::interfaces::gateway::{
    Filter, GatewayResponse, Operation, PersistenceGateway, Session, Table,
};

const RLS_VIOLATION: &str = "new row violates row-level security policy";

/// In-process stand-in for the hosted backend. Applies the same row-level
/// security rules, records every table call and can be told to fail.
#[derive(Default)]
pub struct MemoryGateway {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub operation: Operation,
    pub table: Table,
    pub filters: Vec<Filter>,
    pub rows: usize,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Value>>,
    accounts: Vec<Account>,
    sessions: HashMap<String, Session>,
    failures: HashMap<(Table, Operation), String>,
    calls: Vec<GatewayCall>,
}

struct Account {
    email: String,
    password: String,
    user_id: String,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an auth account plus its `users` row and returns the user id.
    pub async fn register_account(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> String {
        let user_id = new_id();
        let mut state = self.state.write().await;
        state.accounts.push(Account {
            email: email.trim().to_ascii_lowercase(),
            password: password.to_string(),
            user_id: user_id.clone(),
        });
        let mut row = Map::new();
        row.insert("id".to_string(), Value::String(user_id.clone()));
        row.insert(
            "full_name".to_string(),
            full_name
                .map(|name| Value::String(name.to_string()))
                .unwrap_or(Value::Null),
        );
        state
            .tables
            .entry(Table::Users)
            .or_default()
            .push(Value::Object(row));
        user_id
    }

    pub async fn issue_session(&self, user_id: &str) -> Session {
        let mut state = self.state.write().await;
        let email = state
            .accounts
            .iter()
            .find(|account| account.user_id == user_id)
            .map(|account| account.email.clone());
        let session = Session {
            access_token: format!("mem-{}", new_id()),
            user_id: user_id.to_string(),
            email,
        };
        state
            .sessions
            .insert(session.access_token.clone(), session.clone());
        session
    }

    /// Writes a row as the service role: no RLS check, not recorded.
    pub async fn seed(&self, table: Table, row: Value) -> Value {
        let row = with_defaults(table, row);
        let mut state = self.state.write().await;
        state.tables.entry(table).or_default().push(row.clone());
        row
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        let state = self.state.read().await;
        state.tables.get(&table).cloned().unwrap_or_default()
    }

    pub async fn fail(&self, table: Table, operation: Operation, message: &str) {
        let mut state = self.state.write().await;
        state
            .failures
            .insert((table, operation), message.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }
}

impl MemoryState {
    fn record(&mut self, operation: Operation, table: Table, filters: &[Filter], rows: usize) {
        self.calls.push(GatewayCall {
            operation,
            table,
            filters: filters.to_vec(),
            rows,
        });
    }

    fn injected_failure(&self, table: Table, operation: Operation) -> Option<GatewayResponse> {
        self.failures
            .get(&(table, operation))
            .map(|message| GatewayResponse::failed(500, message.clone()))
    }

    fn owned_chatbot_ids(&self, user_id: &str) -> HashSet<String> {
        self.tables
            .get(&Table::Chatbots)
            .map(|rows| {
                rows.iter()
                    .filter(|row| text(row, "user_id").as_deref() == Some(user_id))
                    .filter_map(|row| text(row, "id"))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn visible(&self, session: &Session, table: Table, row: &Value) -> bool {
        match table {
            Table::Chatbots => text(row, "user_id").as_deref() == Some(session.user_id.as_str()),
            Table::Users => text(row, "id").as_deref() == Some(session.user_id.as_str()),
            Table::ChatQuestions | Table::UserResponse => text(row, "chatbot_id")
                .map(|id| self.owned_chatbot_ids(&session.user_id).contains(&id))
                .unwrap_or(false),
        }
    }

    fn position_of(&self, table: Table, id: &str) -> Option<usize> {
        self.tables
            .get(&table)?
            .iter()
            .position(|row| text(row, "id").as_deref() == Some(id))
    }
}

fn text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(value) => Some(value.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn with_defaults(table: Table, row: Value) -> Value {
    let mut map = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if !map.contains_key("id") || map.get("id") == Some(&Value::Null) {
        map.insert("id".to_string(), Value::String(new_id()));
    }
    if matches!(table, Table::Chatbots | Table::UserResponse) && !map.contains_key("created_at")
    {
        map.insert(
            "created_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    Value::Object(map)
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn select(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.record(Operation::Select, table, filters, 0);
        if let Some(failure) = state.injected_failure(table, Operation::Select) {
            return Ok(failure);
        }
        let rows: Vec<Value> = state
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| state.visible(session, table, row))
                    .filter(|row| filters.iter().all(|filter| filter.matches(row)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(GatewayResponse::ok(200, Some(Value::Array(rows))))
    }

    async fn insert(
        &self,
        session: &Session,
        table: Table,
        row: Value,
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.record(Operation::Insert, table, &[], 1);
        if let Some(failure) = state.injected_failure(table, Operation::Insert) {
            return Ok(failure);
        }
        let row = with_defaults(table, row);
        if !state.visible(session, table, &row) {
            return Ok(GatewayResponse::failed(403, RLS_VIOLATION));
        }
        if let Some(id) = text(&row, "id") {
            if state.position_of(table, &id).is_some() {
                return Ok(GatewayResponse::failed(
                    409,
                    "duplicate key value violates unique constraint",
                ));
            }
        }
        state.tables.entry(table).or_default().push(row.clone());
        Ok(GatewayResponse::ok(201, Some(Value::Array(vec![row]))))
    }

    async fn update(
        &self,
        session: &Session,
        table: Table,
        patch: Value,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.record(Operation::Update, table, filters, 0);
        if let Some(failure) = state.injected_failure(table, Operation::Update) {
            return Ok(failure);
        }
        let targets: Vec<usize> = state
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .enumerate()
                    .filter(|(_, row)| state.visible(session, table, row))
                    .filter(|(_, row)| filters.iter().all(|filter| filter.matches(row)))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(rows) = state.tables.get_mut(&table) {
            for index in targets {
                merge(&mut rows[index], &patch);
            }
        }
        Ok(GatewayResponse::ok(204, None))
    }

    async fn upsert(
        &self,
        session: &Session,
        table: Table,
        rows: Vec<Value>,
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.record(Operation::Upsert, table, &[], rows.len());
        if let Some(failure) = state.injected_failure(table, Operation::Upsert) {
            return Ok(failure);
        }

        // The batch is one statement upstream: check everything before writing.
        let rows: Vec<Value> = rows
            .into_iter()
            .map(|row| with_defaults(table, row))
            .collect();
        let mut planned = Vec::with_capacity(rows.len());
        for row in &rows {
            let position = text(row, "id").and_then(|id| state.position_of(table, &id));
            let mut merged = match position {
                Some(index) => {
                    let existing = &state.tables[&table][index];
                    if !state.visible(session, table, existing) {
                        return Ok(GatewayResponse::failed(403, RLS_VIOLATION));
                    }
                    existing.clone()
                }
                None => Value::Object(Map::new()),
            };
            merge(&mut merged, row);
            if !state.visible(session, table, &merged) {
                return Ok(GatewayResponse::failed(403, RLS_VIOLATION));
            }
            planned.push((position, merged));
        }

        let stored = state.tables.entry(table).or_default();
        let mut returned = Vec::with_capacity(planned.len());
        for (position, row) in planned {
            match position {
                Some(index) => stored[index] = row.clone(),
                None => stored.push(row.clone()),
            }
            returned.push(row);
        }
        Ok(GatewayResponse::ok(201, Some(Value::Array(returned))))
    }

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.record(Operation::Delete, table, filters, 0);
        if let Some(failure) = state.injected_failure(table, Operation::Delete) {
            return Ok(failure);
        }
        let keep: Vec<bool> = state
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        !(state.visible(session, table, row)
                            && filters.iter().all(|filter| filter.matches(row)))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(rows) = state.tables.get_mut(&table) {
            let mut flags = keep.into_iter();
            rows.retain(|_| flags.next().unwrap_or(true));
        }
        Ok(GatewayResponse::ok(204, None))
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<Session>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(access_token.trim()).cloned())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let email = email.trim().to_ascii_lowercase();
        let user_id = {
            let state = self.state.read().await;
            state
                .accounts
                .iter()
                .find(|account| account.email == email && account.password == password)
                .map(|account| account.user_id.clone())
        };
        match user_id {
            Some(user_id) => Ok(Some(self.issue_session(&user_id).await)),
            None => Ok(None),
        }
    }
}
