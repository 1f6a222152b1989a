use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use botboard::domains::chatbot::Chatbot;
use botboard::domains::prompt::Prompt;
use botboard::editor::{BotEditor, EditorSnapshot, RemoveOutcome, WriteOutcome};
use botboard::error::{BotboardError, Result};
use botboard::interfaces::gateway::{
    Filter, GatewayResponse, Operation, PersistenceGateway, Session, Table,
};
use botboard::providers::memory::MemoryGateway;
use botboard::services::fetch::Resource;
use botboard::services::queries::PromptListQuery;

async fn owner(gateway: &MemoryGateway) -> Session {
    let user_id = gateway
        .register_account("owner@example.com", "pw", None)
        .await;
    gateway.issue_session(&user_id).await
}

/// Seeds `bot-1` with the given questions and returns an editor loaded from
/// what the gateway hands back, the way the editor page does it.
async fn seeded_editor(
    gateway: &Arc<MemoryGateway>,
    session: &Session,
    questions: &[(&str, &str, i32)],
) -> BotEditor {
    gateway
        .seed(
            Table::Chatbots,
            json!({
                "id": "bot-1",
                "user_id": session.user_id,
                "name": "Helper",
                "business_name": "Acme",
                "about_us": "We sell anvils"
            }),
        )
        .await;
    for (id, question, number) in questions {
        gateway
            .seed(
                Table::ChatQuestions,
                json!({
                    "id": id,
                    "chatbot_id": "bot-1",
                    "question": question,
                    "question_number": number
                }),
            )
            .await;
    }

    let chatbot: Chatbot =
        serde_json::from_value(gateway.rows(Table::Chatbots).await.remove(0)).unwrap();
    let questions: Vec<Prompt> = gateway
        .rows(Table::ChatQuestions)
        .await
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap())
        .collect();
    BotEditor::load(EditorSnapshot { chatbot, questions })
}

async fn stored_questions(gateway: &MemoryGateway) -> Vec<Prompt> {
    let mut prompts: Vec<Prompt> = gateway
        .rows(Table::ChatQuestions)
        .await
        .into_iter()
        .map(|row| serde_json::from_value(row).unwrap())
        .collect();
    prompts.sort_by_key(|prompt| prompt.question_number);
    prompts
}

#[tokio::test]
async fn appended_question_is_saved_with_a_fresh_id_and_next_number() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("q1", "Q1", 1)]).await;
    gateway.clear_calls().await;

    editor.append_question();
    editor.set_question(1, "Q2").unwrap();
    let report = editor.save(gateway.as_ref(), &session).await.unwrap();
    assert!(report.is_saved());

    let calls = gateway.calls().await;
    let upsert = calls
        .iter()
        .find(|call| call.operation == Operation::Upsert)
        .unwrap();
    assert_eq!(upsert.table, Table::ChatQuestions);
    assert_eq!(upsert.rows, 2);

    let stored = stored_questions(&gateway).await;
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, "q1");
    assert_eq!(stored[0].question_number, 1);
    assert_eq!(stored[1].question, "Q2");
    assert_eq!(stored[1].question_number, 2);
    assert_ne!(stored[1].id, "q1");
    assert!(!stored[1].id.is_empty());

    // the generated id sticks, so a second save updates instead of inserting
    assert_eq!(editor.questions()[1].id(), Some(stored[1].id.as_str()));
    editor.save(gateway.as_ref(), &session).await.unwrap();
    assert_eq!(stored_questions(&gateway).await.len(), 2);
}

#[tokio::test]
async fn reordered_questions_are_renumbered_by_position() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(
        &gateway,
        &session,
        &[("a", "A", 1), ("b", "B", 2), ("c", "C", 3)],
    )
    .await;

    editor.reorder(2, 0).unwrap();
    let report = editor.save(gateway.as_ref(), &session).await.unwrap();
    assert!(report.is_saved());

    let numbered: Vec<(String, i32)> = stored_questions(&gateway)
        .await
        .into_iter()
        .map(|prompt| (prompt.id, prompt.question_number))
        .collect();
    assert_eq!(
        numbered,
        vec![
            ("c".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn removing_a_saved_question_deletes_it_for_good() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1), ("b", "B", 2)]).await;
    gateway.clear_calls().await;

    let outcome = editor
        .remove_question(gateway.as_ref(), &session, 0)
        .await
        .unwrap();
    assert_eq!(outcome, RemoveOutcome::Deleted);
    assert_eq!(editor.questions().len(), 1);

    let calls = gateway.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, Operation::Delete);
    assert_eq!(calls[0].table, Table::ChatQuestions);
    assert_eq!(calls[0].filters[0].column, "id");
    assert_eq!(calls[0].filters[0].value, "a");

    let prompts = Resource::new(
        gateway.clone(),
        Some(session.clone()),
        PromptListQuery {
            chatbot_id: Some("bot-1".to_string()),
        },
    );
    prompts.mount().await;
    prompts.revalidate().await;
    let ids: Vec<String> = prompts
        .state()
        .await
        .data
        .unwrap()
        .into_iter()
        .map(|prompt| prompt.id)
        .collect();
    assert_eq!(ids, vec!["b".to_string()]);
}

#[tokio::test]
async fn removing_an_unsaved_question_never_reaches_the_backend() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1)]).await;
    gateway.clear_calls().await;

    editor.append_question();
    let outcome = editor
        .remove_question(gateway.as_ref(), &session, 1)
        .await
        .unwrap();
    assert_eq!(outcome, RemoveOutcome::Discarded);
    assert!(outcome.notice().is_none());
    assert_eq!(editor.questions().len(), 1);
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn failed_delete_keeps_the_entry() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1)]).await;
    gateway
        .fail(Table::ChatQuestions, Operation::Delete, "timeout")
        .await;

    let outcome = editor
        .remove_question(gateway.as_ref(), &session, 0)
        .await
        .unwrap();
    assert!(matches!(outcome, RemoveOutcome::Failed(_)));
    assert_eq!(outcome.notice().unwrap().message, "Unable to delete");
    assert_eq!(editor.questions().len(), 1);
    assert_eq!(gateway.rows(Table::ChatQuestions).await.len(), 1);
}

#[tokio::test]
async fn chatbot_update_failure_does_not_block_questions() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1)]).await;
    gateway
        .fail(Table::Chatbots, Operation::Update, "update refused")
        .await;

    editor.set_name("Renamed");
    editor.append_question();
    editor.set_question(1, "B").unwrap();
    let report = editor.save(gateway.as_ref(), &session).await.unwrap();

    assert!(matches!(report.chatbot, WriteOutcome::Failed(_)));
    assert_eq!(report.questions, WriteOutcome::Saved);
    let messages: Vec<String> = report
        .notices()
        .into_iter()
        .map(|notice| notice.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Unable to update chatbot details", "Questions updated"]
    );
    assert_eq!(stored_questions(&gateway).await.len(), 2);
    assert!(editor.questions()[1].is_persisted());
    // the form keeps what the user typed
    assert_eq!(editor.form().name, "Renamed");
    assert_eq!(gateway.rows(Table::Chatbots).await[0]["name"], "Helper");
}

#[tokio::test]
async fn refused_upsert_then_retry_inserts_once() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1)]).await;
    gateway
        .fail(Table::ChatQuestions, Operation::Upsert, "upsert refused")
        .await;

    editor.set_name("Renamed");
    editor.append_question();
    editor.set_question(1, "B").unwrap();
    let report = editor.save(gateway.as_ref(), &session).await.unwrap();

    assert_eq!(report.chatbot, WriteOutcome::Saved);
    assert!(matches!(report.questions, WriteOutcome::Failed(_)));
    assert_eq!(editor.questions().len(), 2);
    assert_eq!(gateway.rows(Table::Chatbots).await[0]["name"], "Renamed");
    assert_eq!(gateway.rows(Table::ChatQuestions).await.len(), 1);
    let assigned = editor.questions()[1].id().map(str::to_string);
    assert!(assigned.is_some());

    gateway.clear_failures().await;
    let report = editor.save(gateway.as_ref(), &session).await.unwrap();
    assert!(report.is_saved());
    let stored = stored_questions(&gateway).await;
    assert_eq!(stored.len(), 2);
    assert_eq!(Some(stored[1].id.clone()), assigned);
}

/// Writes the upsert through, then reports a transport error once, the way
/// a client timeout looks after the backend already committed.
struct LostReplyGateway {
    inner: Arc<MemoryGateway>,
    lose_next_upsert: AtomicBool,
}

#[async_trait]
impl PersistenceGateway for LostReplyGateway {
    async fn select(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        self.inner.select(session, table, filters).await
    }

    async fn insert(&self, session: &Session, table: Table, row: Value) -> Result<GatewayResponse> {
        self.inner.insert(session, table, row).await
    }

    async fn update(
        &self,
        session: &Session,
        table: Table,
        patch: Value,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        self.inner.update(session, table, patch, filters).await
    }

    async fn upsert(
        &self,
        session: &Session,
        table: Table,
        rows: Vec<Value>,
    ) -> Result<GatewayResponse> {
        let response = self.inner.upsert(session, table, rows).await?;
        if self.lose_next_upsert.swap(false, Ordering::SeqCst) {
            return Err(BotboardError::Http("operation timed out".to_string()));
        }
        Ok(response)
    }

    async fn delete(
        &self,
        session: &Session,
        table: Table,
        filters: &[Filter],
    ) -> Result<GatewayResponse> {
        self.inner.delete(session, table, filters).await
    }

    async fn user_for_token(&self, access_token: &str) -> Result<Option<Session>> {
        self.inner.user_for_token(access_token).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<Session>> {
        self.inner.sign_in(email, password).await
    }
}

#[tokio::test]
async fn retry_after_lost_upsert_reply_does_not_duplicate() {
    let memory = Arc::new(MemoryGateway::new());
    let session = owner(&memory).await;
    let mut editor = seeded_editor(&memory, &session, &[("q1", "Hi", 1)]).await;
    let gateway = LostReplyGateway {
        inner: memory.clone(),
        lose_next_upsert: AtomicBool::new(true),
    };

    editor.append_question();
    editor.set_question(1, "Bye").unwrap();
    let first = editor.save(&gateway, &session).await.unwrap();
    assert!(matches!(first.questions, WriteOutcome::Failed(_)));

    let second = editor.save(&gateway, &session).await.unwrap();
    assert_eq!(second.questions, WriteOutcome::Saved);

    let stored = stored_questions(&gateway.inner).await;
    let numbered: Vec<(String, i32)> = stored
        .iter()
        .map(|prompt| (prompt.question.clone(), prompt.question_number))
        .collect();
    assert_eq!(
        numbered,
        vec![("Hi".to_string(), 1), ("Bye".to_string(), 2)]
    );
}

#[tokio::test]
async fn blank_name_sends_nothing() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[("a", "A", 1)]).await;
    gateway.clear_calls().await;

    editor.set_name("  ");
    let err = editor.save(gateway.as_ref(), &session).await.unwrap_err();
    assert!(matches!(err, BotboardError::Validation(_)));
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn no_questions_skips_the_upsert() {
    let gateway = Arc::new(MemoryGateway::new());
    let session = owner(&gateway).await;
    let mut editor = seeded_editor(&gateway, &session, &[]).await;
    gateway.clear_calls().await;

    let report = editor.save(gateway.as_ref(), &session).await.unwrap();
    assert!(report.is_saved());
    let operations: Vec<Operation> = gateway
        .calls()
        .await
        .into_iter()
        .map(|call| call.operation)
        .collect();
    assert_eq!(operations, vec![Operation::Update]);
}
