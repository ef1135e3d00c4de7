use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AppError, AppState};
use crate::chat::{ChatBook, Turn};

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub name: String,
    pub message_count: usize,
}

/// Chat list plus the turns of the current chat
#[derive(Debug, Serialize)]
pub struct ChatsView {
    pub current_chat_id: Option<String>,
    pub chats: Vec<ChatSummary>,
    pub messages: Vec<Turn>,
}

impl From<&ChatBook> for ChatsView {
    fn from(book: &ChatBook) -> Self {
        Self {
            current_chat_id: book.current_id().map(str::to_string),
            chats: book
                .chats()
                .map(|(id, chat)| ChatSummary {
                    id: id.to_string(),
                    name: chat.name.clone(),
                    message_count: chat.messages.len(),
                })
                .collect(),
            messages: book.current_messages().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyView {
    pub chat_id: Option<String>,
    pub reply: String,
}

pub async fn list_chats(State(state): State<Arc<AppState>>) -> Json<ChatsView> {
    let book = state.chat_book.lock().await;
    Json(ChatsView::from(&*book))
}

pub async fn create_chat(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ChatsView>), AppError> {
    let mut book = state.chat_book.lock().await;
    book.create_chat()?;
    Ok((StatusCode::CREATED, Json(ChatsView::from(&*book))))
}

pub async fn select_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ChatsView>, AppError> {
    let mut book = state.chat_book.lock().await;
    book.switch_chat(&id)?;
    Ok(Json(ChatsView::from(&*book)))
}

pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.chat_book.lock().await.delete_chat(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask the tutor and record the exchange in the current chat.
///
/// The book stays locked for the whole call so exchanges land in order.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<ReplyView>, AppError> {
    let mut book = state.chat_book.lock().await;

    let reply = state
        .tutor
        .respond(book.current_messages(), &body.message)
        .await?;
    book.record_exchange(body.message.trim(), &reply)?;

    Ok(Json(ReplyView {
        chat_id: book.current_id().map(str::to_string),
        reply,
    }))
}
