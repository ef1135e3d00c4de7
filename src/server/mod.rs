//! HTTP surface for the Languito activities.
//!
//! Every user gets a [`Session`] holding their quiz and block-quiz state,
//! looked up by id in the [`SessionRegistry`]. Chat history is shared by the
//! whole process and saved to the configured JSON document.

mod chat;
mod error;
mod quiz;
mod tools;

pub use error::AppError;

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::block_quiz::BlockQuizRound;
use crate::chat::{ChatBook, ChatTutor, DocumentStore, JsonFileStore};
use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::gemini::{GeminiClient, TextGenerator};
use crate::quiz::{QuestionGenerator, QuizSession};
use crate::retry::RetryPolicy;
use crate::speech::SpeechSynthesizer;
use crate::translation::Translator;

/// Header carrying the shared API key when one is configured
pub const API_KEY_HEADER: &str = "x-api-key";

const SESSION_ID_LEN: usize = 24;

/// Per-user activity state
#[derive(Debug)]
pub struct Session {
    pub quiz: QuizSession,
    pub block_quiz: BlockQuizRound,
}

impl Session {
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            quiz: QuizSession::new(),
            block_quiz: BlockQuizRound::new(&mut rng),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Live sessions by id. Each session has its own lock, so one user's slow
/// quiz generation never blocks another user.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> String {
        let id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(char::from)
            .collect();

        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(Session::new())));
        id
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub struct AppState {
    pub config: Config,
    pub generator: QuestionGenerator,
    pub tutor: ChatTutor,
    pub translator: Translator,
    pub speech: SpeechSynthesizer,
    pub dictionary: Dictionary,
    pub chat_book: Mutex<ChatBook>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Wire the production services from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let client = config.http_client()?;
        let gemini: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(client.clone(), &config));
        let store: Arc<dyn DocumentStore> =
            Arc::new(JsonFileStore::new(config.chat_history_path.clone()));

        Self::with_services(config, client, gemini, store)
    }

    /// Build the state around an explicit text generator and chat store
    pub fn with_services(
        config: Config,
        client: reqwest::Client,
        text: Arc<dyn TextGenerator>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let chat_book = ChatBook::open(store).context("Failed to open chat history")?;
        let speech = SpeechSynthesizer::new(client.clone(), &config);

        if config.google_api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set; quiz, tutor and dictionary will be unavailable");
        }
        if config.huggingface_api_token.is_none() {
            warn!("HUGGINGFACE_API_TOKEN is not set; translation will be unavailable");
        }

        Ok(Self {
            generator: QuestionGenerator::new(
                text.clone(),
                RetryPolicy::immediate(config.quiz_max_attempts),
            ),
            tutor: ChatTutor::new(text.clone()),
            translator: Translator::new(client, &config),
            dictionary: Dictionary::new(text, speech.clone()),
            speech,
            chat_book: Mutex::new(chat_book),
            sessions: SessionRegistry::new(),
            config,
        })
    }

    /// Look up a session or fail with 404
    pub async fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", id)))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", delete(end_session))
        .route(
            "/sessions/:id/quiz",
            post(quiz::start_quiz)
                .get(quiz::current_question)
                .delete(quiz::reset_quiz),
        )
        .route("/sessions/:id/quiz/answer", post(quiz::submit_answer))
        .route("/sessions/:id/quiz/previous", post(quiz::previous_question))
        .route("/sessions/:id/quiz/results", get(quiz::results))
        .route("/sessions/:id/block-quiz", get(quiz::block_round))
        .route("/sessions/:id/block-quiz/select", post(quiz::block_select))
        .route("/sessions/:id/block-quiz/reset", post(quiz::block_reset))
        .route("/sessions/:id/block-quiz/audio", get(quiz::block_audio))
        .route("/chats", get(chat::list_chats).post(chat::create_chat))
        .route("/chats/message", post(chat::send_message))
        .route("/chats/:id/select", post(chat::select_chat))
        .route("/chats/:id", delete(chat::delete_chat))
        .route("/translate", post(tools::translate))
        .route("/speech", post(tools::speech))
        .route("/dictionary", post(tools::dictionary))
        .route("/languages", get(tools::languages))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.sessions.create().await;
    info!("Started session ({} active)", state.sessions.len().await);
    (StatusCode::CREATED, Json(json!({ "session_id": id })))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session '{}' not found", id)))
    }
}

/// Reject requests without the configured API key; a no-op when none is set
async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        next.run(request).await
    } else {
        warn!("Rejected request to {} with missing or wrong API key", request.uri().path());
        AppError::Unauthorized("Missing or invalid API key".to_string()).into_response()
    }
}
