//! Errors raised when talking to the external services.

use thiserror::Error;

/// Failure of an outbound call to the generative text, translation or speech service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The credential for a feature is not configured. Not retried.
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network failure or timeout before a status was received
    #[error("Failed to reach {service}: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{service} API error ({status}): {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A success status whose body did not have the expected shape
    #[error("Unexpected {service} response: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },
}

impl ServiceError {
    pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ServiceError::Transport { service, source }
    }

    /// Read a failed response into a `Status` error, keeping whatever body was returned
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        ServiceError::Status {
            service,
            status,
            body,
        }
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ServiceError::MissingCredential(_))
    }
}
