use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Form, Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domains::chatbot::{Chatbot, NewChatbot};
use crate::domains::prompt::Prompt;
use crate::editor::{BotEditor, DragDrop, EditorSnapshot, Notice};
use crate::embed;
use crate::error::{BotboardError, Result};
use crate::interfaces::gateway::{PersistenceGateway, Session};
use crate::services::chatbots::ChatbotService;
use crate::services::fetch::Resource;
use crate::services::queries::{
    BotListQuery, ChatbotDetailsQuery, ConversationListQuery, PromptListQuery, UserDetailsQuery,
};
use crate::ui;

const UNTITLED_CHATBOT: &str = "Untitled chatbot";

type EditorKey = (String, String);

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn PersistenceGateway>,
    pub config: Arc<Config>,
    pub editors: Arc<RwLock<HashMap<EditorKey, Arc<Mutex<BotEditor>>>>>,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
            editors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn chatbots(&self) -> ChatbotService {
        ChatbotService::new(self.gateway.clone())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    git_sha: String,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct CreateChatbotRequest {
    #[serde(default)]
    prompt: String,
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateChatbotResponse {
    chatbot: Chatbot,
}

#[derive(Serialize)]
struct RetrieveChatbotsResponse {
    chatbots: Vec<Chatbot>,
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
}

#[derive(Serialize)]
struct QuestionResponse {
    question: Prompt,
}

#[derive(Deserialize)]
struct SignInForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct CreateBotForm {
    name: String,
    #[serde(default)]
    business_name: String,
    #[serde(default)]
    about_us: String,
}

#[derive(Deserialize)]
struct AccountNameForm {
    full_name: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/create-chatbot",
            post(api_create_chatbot).fallback(allow_post),
        )
        .route(
            "/api/retrieve-chatbots",
            get(api_retrieve_chatbots).fallback(allow_get),
        )
        .route("/api/chatbots/{id}/questions", post(api_add_question))
        .route("/api/questions/{id}", patch(api_update_question))
        .route("/signin", get(sign_in_form).post(sign_in))
        .route("/signout", get(sign_out))
        .route("/", get(|| async { Redirect::to("/chatbot") }))
        .route("/chatbot", get(bot_list).post(create_bot))
        .route("/conversations", get(all_conversations))
        .route("/chatbot/conversation/{id}", get(bot_conversations))
        .route("/chatbot/embedding/{id}", get(embed_snippets))
        .route("/chatbot/prompt/{id}", get(editor_page).post(editor_action))
        .route("/account/name", post(update_account_name))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        git_sha: crate::GIT_SHA.to_string(),
    })
}

async fn allow_post() -> Response {
    method_not_allowed("POST")
}

async fn allow_get() -> Response {
    method_not_allowed("GET")
}

fn method_not_allowed(allow: &'static str) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        "Method Not Allowed",
    )
        .into_response()
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorBody {
                status_code: status.as_u16(),
                message: message.into(),
            },
        }),
    )
        .into_response()
}

fn api_error_for(err: BotboardError) -> Response {
    match err {
        BotboardError::Validation(message) => api_error(StatusCode::BAD_REQUEST, message),
        BotboardError::NotFound(message) => api_error(StatusCode::NOT_FOUND, message),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Body rejections keep the API error shape.
fn json_rejection(rejection: JsonRejection) -> Response {
    api_error(rejection.status(), rejection.body_text())
}

/// Bearer header first, then the session cookie.
fn access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn current_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = access_token(headers, &state.config.auth.cookie_name)?;
    match state.gateway.user_for_token(&token).await {
        Ok(session) => session,
        Err(err) => {
            warn!("session lookup failed: {}", err);
            None
        }
    }
}

/// API routes answer 500 without a session; they never redirect.
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> std::result::Result<Session, Response> {
    current_session(state, headers)
        .await
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not get user"))
}

async fn require_page_session(
    state: &AppState,
    headers: &HeaderMap,
) -> std::result::Result<Session, Response> {
    current_session(state, headers)
        .await
        .ok_or_else(|| Redirect::to(&state.config.auth.sign_in_path).into_response())
}

async fn api_create_chatbot(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CreateChatbotRequest>, JsonRejection>,
) -> Response {
    let session = match authorize(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return json_rejection(rejection),
    };

    let name = payload
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNTITLED_CHATBOT.to_string());
    let new = NewChatbot {
        name,
        business_name: String::new(),
        about_us: payload.prompt,
    };

    match state.chatbots().create_chatbot(&session, new).await {
        Ok(chatbot) => (StatusCode::OK, Json(CreateChatbotResponse { chatbot })).into_response(),
        Err(err) => {
            warn!(user_id = %session.user_id, "create chatbot failed: {}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn api_retrieve_chatbots(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match authorize(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match state.chatbots().retrieve_chatbots(&session).await {
        Ok(chatbots) => (StatusCode::OK, Json(RetrieveChatbotsResponse { chatbots })).into_response(),
        Err(err) => {
            warn!(user_id = %session.user_id, "retrieve chatbots failed: {}", err);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn api_add_question(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    let session = match authorize(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return json_rejection(rejection),
    };
    if payload.question.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "question is required");
    }

    match state
        .chatbots()
        .add_question(&session, &chatbot_id, &payload.question)
        .await
    {
        Ok(question) => (StatusCode::CREATED, Json(QuestionResponse { question })).into_response(),
        Err(err) => api_error_for(err),
    }
}

async fn api_update_question(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    headers: HeaderMap,
    payload: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Response {
    let session = match authorize(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return json_rejection(rejection),
    };

    match state
        .chatbots()
        .update_question(&session, &question_id, &payload.question)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => api_error_for(err),
    }
}

async fn sign_in_form(State(state): State<AppState>) -> Html<String> {
    Html(ui::sign_in_page(&state.config.auth.sign_in_path, None))
}

async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let action = state.config.auth.sign_in_path.clone();
    match state.gateway.sign_in(form.email.trim(), &form.password).await {
        Ok(Some(session)) => {
            info!(user_id = %session.user_id, "signed in");
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                state.config.auth.cookie_name, session.access_token
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/chatbot")).into_response()
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Html(ui::sign_in_page(&action, Some("Invalid login credentials"))),
        )
            .into_response(),
        Err(err) => {
            warn!("sign in failed: {}", err);
            (
                StatusCode::BAD_GATEWAY,
                Html(ui::sign_in_page(&action, Some("Unable to sign in"))),
            )
                .into_response()
        }
    }
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = current_session(&state, &headers).await {
        let mut editors = state.editors.write().await;
        let before = editors.len();
        editors.retain(|(user_id, _), _| user_id != &session.user_id);
        info!(
            user_id = %session.user_id,
            dropped = before - editors.len(),
            "signed out"
        );
    }
    let cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        state.config.auth.cookie_name
    );
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to(&state.config.auth.sign_in_path),
    )
        .into_response()
}

/// The bot list page's reads. Writes from the page happen between `mount`
/// and `revalidate`.
struct BotListView {
    bots: Resource<BotListQuery>,
    user: Resource<UserDetailsQuery>,
}

impl BotListView {
    async fn mount(state: &AppState, session: &Session) -> Self {
        let user_id = Some(session.user_id.clone());
        let view = Self {
            bots: Resource::new(
                state.gateway.clone(),
                Some(session.clone()),
                BotListQuery {
                    user_id: user_id.clone(),
                },
            ),
            user: Resource::new(
                state.gateway.clone(),
                Some(session.clone()),
                UserDetailsQuery { user_id },
            ),
        };
        tokio::join!(view.bots.mount(), view.user.mount());
        view
    }

    async fn revalidate(&self) {
        tokio::join!(self.bots.revalidate(), self.user.revalidate());
        debug!(
            bots = self.bots.revalidation_count(),
            user = self.user.revalidation_count(),
            "bot list revalidated"
        );
    }

    async fn render(self, notices: &[Notice]) -> Html<String> {
        let bots = self.bots.state().await;
        let user = self
            .user
            .state()
            .await
            .data
            .and_then(|rows| rows.into_iter().next());
        self.bots.unmount();
        self.user.unmount();
        Html(ui::bot_list_page(&bots, user.as_ref(), notices))
    }
}

async fn bot_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };
    BotListView::mount(&state, &session)
        .await
        .render(&[])
        .await
        .into_response()
}

async fn create_bot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CreateBotForm>,
) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };

    let view = BotListView::mount(&state, &session).await;
    let new = NewChatbot {
        name: form.name,
        business_name: form.business_name,
        about_us: form.about_us,
    };
    let notice = match state.chatbots().create_chatbot(&session, new).await {
        Ok(_) => Notice::success("Chatbot created"),
        Err(BotboardError::Validation(_)) => Notice::error("Chatbot name is required"),
        Err(err) => {
            warn!(user_id = %session.user_id, "create chatbot failed: {}", err);
            Notice::error("Unable to create chatbot")
        }
    };
    view.revalidate().await;
    view.render(&[notice]).await.into_response()
}

async fn update_account_name(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AccountNameForm>,
) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };

    let view = BotListView::mount(&state, &session).await;
    let notice = match state
        .chatbots()
        .update_user_name(&session, &form.full_name)
        .await
    {
        Ok(()) => Notice::success("Name updated"),
        Err(BotboardError::Validation(_)) => Notice::error("Name is required"),
        Err(err) => {
            warn!(user_id = %session.user_id, "name update failed: {}", err);
            Notice::error("Unable to update name")
        }
    };
    view.revalidate().await;
    view.render(&[notice]).await.into_response()
}

async fn all_conversations(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };
    let turns = Resource::new(
        state.gateway.clone(),
        Some(session),
        ConversationListQuery::all(),
    );
    turns.mount().await;
    Html(ui::conversation_page("Conversations", &turns.state().await)).into_response()
}

async fn bot_conversations(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };
    let turns = Resource::new(
        state.gateway.clone(),
        Some(session),
        ConversationListQuery::for_chatbot(Some(chatbot_id)),
    );
    turns.mount().await;
    Html(ui::conversation_page("Conversations", &turns.state().await)).into_response()
}

async fn embed_snippets(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(redirect) = require_page_session(&state, &headers).await {
        return redirect;
    }
    match embed::snippets(&state.config.widget, &chatbot_id) {
        Ok(snippets) => Html(ui::embed_page(&snippets)).into_response(),
        Err(err) => {
            warn!("embed snippets failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(ui::error_page("Embed on website", "Unable to build embed code")),
            )
                .into_response()
        }
    }
}

/// Reads the chatbot and its questions and builds a fresh editor from them.
async fn load_editor(
    state: &AppState,
    session: &Session,
    chatbot_id: &str,
) -> std::result::Result<BotEditor, Response> {
    let details = Resource::new(
        state.gateway.clone(),
        Some(session.clone()),
        ChatbotDetailsQuery {
            chatbot_id: Some(chatbot_id.to_string()),
        },
    );
    let prompts = Resource::new(
        state.gateway.clone(),
        Some(session.clone()),
        PromptListQuery {
            chatbot_id: Some(chatbot_id.to_string()),
        },
    );
    tokio::join!(details.mount(), prompts.mount());
    let details = details.state().await;
    let prompts = prompts.state().await;

    let failure = details.error.or(prompts.error);
    if let Some(message) = failure {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(ui::error_page("Chatbot details", &message)),
        )
            .into_response());
    }

    let Some(chatbot) = details.data.and_then(|rows| rows.into_iter().next()) else {
        return Err((
            StatusCode::NOT_FOUND,
            Html(ui::error_page("Chatbot details", "Chatbot not found")),
        )
            .into_response());
    };
    Ok(BotEditor::load(EditorSnapshot {
        chatbot,
        questions: prompts.data.unwrap_or_default(),
    }))
}

fn render_editor(state: &AppState, editor: &BotEditor, notices: &[Notice]) -> Response {
    match embed::widget_url(&state.config.widget, editor.chatbot_id()) {
        Ok(preview) => Html(ui::editor_page(editor, &preview, notices)).into_response(),
        Err(err) => {
            warn!("preview url failed: {}", err);
            Html(ui::editor_page(editor, "about:blank", notices)).into_response()
        }
    }
}

async fn editor_page(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };
    let editor = match load_editor(&state, &session, &chatbot_id).await {
        Ok(editor) => editor,
        Err(response) => return response,
    };

    let response = render_editor(&state, &editor, &[]);
    state
        .editors
        .write()
        .await
        .insert((session.user_id, chatbot_id), Arc::new(Mutex::new(editor)));
    response
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EditorAction {
    Save,
    Append,
    Remove(String),
    Up(String),
    Down(String),
    Drop(DragDrop),
}

fn parse_action(raw: &str) -> Option<EditorAction> {
    match raw {
        "save" => return Some(EditorAction::Save),
        "append" => return Some(EditorAction::Append),
        _ => {}
    }
    let (verb, rest) = raw.split_once(':')?;
    match verb {
        "remove" => Some(EditorAction::Remove(rest.to_string())),
        "up" => Some(EditorAction::Up(rest.to_string())),
        "down" => Some(EditorAction::Down(rest.to_string())),
        "drop" => {
            let (source, destination) = match rest.split_once(':') {
                Some((source, destination)) => (source, destination),
                None => (rest, ""),
            };
            let source = source.parse().ok()?;
            let destination = if destination.is_empty() {
                None
            } else {
                Some(destination.parse().ok()?)
            };
            Some(EditorAction::Drop(DragDrop {
                source,
                destination,
            }))
        }
        _ => None,
    }
}

/// Copies posted field and question texts into the editor so that no edit
/// is lost whichever button was pressed.
fn apply_fields(editor: &mut BotEditor, fields: &[(String, String)]) {
    for (name, value) in fields {
        match name.as_str() {
            "name" => editor.set_name(value.as_str()),
            "business_name" => editor.set_business_name(value.as_str()),
            "about_us" => editor.set_about_us(value.as_str()),
            other => {
                let Some(key) = other.strip_prefix("question.") else {
                    continue;
                };
                if !editor.set_question_by_key(key, value.as_str()) {
                    debug!(key, "ignoring text for a question no longer in the editor");
                }
            }
        }
    }
}

async fn run_action(
    state: &AppState,
    session: &Session,
    editor: &mut BotEditor,
    action: EditorAction,
) -> Result<Vec<Notice>> {
    let missing = || Notice::error("Question not found");
    match action {
        EditorAction::Save => match editor.save(state.gateway.as_ref(), session).await {
            Ok(report) => Ok(report.notices()),
            Err(BotboardError::Validation(_)) => Ok(vec![Notice::error("Chatbot name is required")]),
            Err(err) => Err(err),
        },
        EditorAction::Append => {
            editor.append_question();
            Ok(Vec::new())
        }
        EditorAction::Remove(key) => {
            let Some(index) = editor.index_of(&key) else {
                return Ok(vec![missing()]);
            };
            let outcome = editor
                .remove_question(state.gateway.as_ref(), session, index)
                .await?;
            Ok(outcome.notice().into_iter().collect())
        }
        EditorAction::Up(key) => {
            let Some(index) = editor.index_of(&key) else {
                return Ok(vec![missing()]);
            };
            if index > 0 {
                editor.reorder(index, index - 1)?;
            }
            Ok(Vec::new())
        }
        EditorAction::Down(key) => {
            let Some(index) = editor.index_of(&key) else {
                return Ok(vec![missing()]);
            };
            if index + 1 < editor.questions().len() {
                editor.reorder(index, index + 1)?;
            }
            Ok(Vec::new())
        }
        EditorAction::Drop(drop) => match editor.drag_end(drop) {
            Ok(()) => Ok(Vec::new()),
            Err(BotboardError::Validation(_)) => Ok(vec![missing()]),
            Err(err) => Err(err),
        },
    }
}

async fn editor_action(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let session = match require_page_session(&state, &headers).await {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };

    let action = match fields.iter().find(|(name, _)| name == "action") {
        Some((_, raw)) => match parse_action(raw) {
            Some(action) => Some(action),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Html(ui::error_page("Chatbot details", "Unknown editor action")),
                )
                    .into_response()
            }
        },
        None => None,
    };

    let key = (session.user_id.clone(), chatbot_id.clone());
    let existing = state.editors.read().await.get(&key).cloned();
    let editor = match existing {
        Some(editor) => editor,
        None => {
            let loaded = match load_editor(&state, &session, &chatbot_id).await {
                Ok(editor) => editor,
                Err(response) => return response,
            };
            state
                .editors
                .write()
                .await
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(loaded)))
                .clone()
        }
    };

    let mut editor = if action == Some(EditorAction::Save) {
        match editor.try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                return (
                    StatusCode::CONFLICT,
                    Html(ui::error_page("Chatbot details", "A save is already in progress")),
                )
                    .into_response()
            }
        }
    } else {
        editor.lock_owned().await
    };

    apply_fields(&mut editor, &fields);
    let notices = match action {
        Some(action) => match run_action(&state, &session, &mut editor, action).await {
            Ok(notices) => notices,
            Err(err) => {
                warn!(chatbot_id = %chatbot_id, "editor action failed: {}", err);
                vec![Notice::error("Something went wrong")]
            }
        },
        None => Vec::new(),
    };
    render_editor(&state, &editor, &notices)
}

pub async fn run(config: Config, gateway: Arc<dyn PersistenceGateway>) -> Result<()> {
    run_with_shutdown(config, gateway, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(
    config: Config,
    gateway: Arc<dyn PersistenceGateway>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(AppState::new(config, gateway));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BotboardError::Runtime(e.to_string()))?;
    info!(%addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BotboardError::Runtime(e.to_string()))?;

    Ok(())
}
