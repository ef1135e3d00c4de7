use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::block_quiz::BlockQuizError;
use crate::chat::ChatError;
use crate::error::ServiceError;
use crate::quiz::{GenerationError, QuizSessionError};

/// Handler error, rendered as `{"error": message}` with a matching status
#[derive(Debug, Error)]
pub enum AppError {
    // 400
    #[error("{0}")]
    BadRequest(String),

    // 401
    #[error("{0}")]
    Unauthorized(String),

    // 404
    #[error("{0}")]
    NotFound(String),

    // 409
    #[error("{0}")]
    Conflict(String),

    // 502, the upstream service failed or gave unusable answers
    #[error("{0}")]
    BadGateway(String),

    // 503, the feature's credential is not configured
    #[error("{0}")]
    ServiceUnavailable(String),

    // 500
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                msg
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingCredential(_) => AppError::ServiceUnavailable(err.to_string()),
            ServiceError::InvalidInput(msg) => AppError::BadRequest(msg),
            ServiceError::Transport { .. }
            | ServiceError::Status { .. }
            | ServiceError::MalformedResponse { .. } => AppError::BadGateway(err.to_string()),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Service(e) => e.into(),
            GenerationError::Exhausted { .. } => AppError::BadGateway(err.to_string()),
        }
    }
}

impl From<QuizSessionError> for AppError {
    fn from(err: QuizSessionError) -> Self {
        match err {
            QuizSessionError::InvalidAnswer(_) => AppError::BadRequest(err.to_string()),
            QuizSessionError::NotStarted
            | QuizSessionError::AlreadyCompleted
            | QuizSessionError::NotCompleted => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<BlockQuizError> for AppError {
    fn from(err: BlockQuizError) -> Self {
        match err {
            BlockQuizError::UnknownWord(_) => AppError::BadRequest(err.to_string()),
            BlockQuizError::AlreadySelected(_) | BlockQuizError::Complete => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotFound(_) => AppError::NotFound(err.to_string()),
            ChatError::CurrentChatEmpty => AppError::Conflict(err.to_string()),
            ChatError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{AttemptError, ParseError};

    #[test]
    fn test_service_error_mapping() {
        let missing: AppError = ServiceError::MissingCredential("GOOGLE_API_KEY").into();
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(missing.to_string(), "GOOGLE_API_KEY is not set");

        let invalid: AppError = ServiceError::InvalidInput("empty".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let malformed: AppError = ServiceError::MalformedResponse {
            service: "Gemini",
            detail: "no candidates".to_string(),
        }
        .into();
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_exhaustion_is_bad_gateway() {
        let err: AppError = GenerationError::Exhausted {
            attempts: 5,
            last: AttemptError::Parse(ParseError::Empty),
        }
        .into();

        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("after 5 attempts"));
    }

    #[test]
    fn test_state_conflicts() {
        let quiz: AppError = QuizSessionError::NotStarted.into();
        assert_eq!(quiz.status(), StatusCode::CONFLICT);

        let chat: AppError = ChatError::CurrentChatEmpty.into();
        assert_eq!(chat.status(), StatusCode::CONFLICT);

        let block: AppError = BlockQuizError::UnknownWord("x".to_string()).into();
        assert_eq!(block.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = ChatError::NotFound("abc".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
