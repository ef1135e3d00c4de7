use anyhow::{Context, Result};
use std::time::Duration;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct Config {
    // Gemini (quiz, chat tutor, dictionary)
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_url: String,

    // Hugging Face (translator)
    pub huggingface_api_token: Option<String>,
    pub translation_api_url: String,

    // Google Translate TTS
    pub tts_api_url: String,

    // Chat history document
    pub chat_history_path: String,

    // Quiz
    pub quiz_questions: usize,
    pub quiz_max_attempts: u32,

    // HTTP
    pub http_timeout_secs: u64,
    pub port: u16,
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Credentials are optional here; each feature checks for its own key
            google_api_key: non_empty_var("GOOGLE_API_KEY"),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-pro".to_string()),
            gemini_api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),

            huggingface_api_token: non_empty_var("HUGGINGFACE_API_TOKEN"),
            translation_api_url: std::env::var("TRANSLATION_API_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co/models".to_string()),

            tts_api_url: std::env::var("TTS_API_URL")
                .unwrap_or_else(|_| "https://translate.google.com".to_string()),

            chat_history_path: std::env::var("CHAT_HISTORY_PATH")
                .unwrap_or_else(|_| "chat_history.json".to_string()),

            quiz_questions: std::env::var("QUIZ_QUESTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            quiz_max_attempts: std::env::var("QUIZ_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u32| n >= 1)
                .unwrap_or(5),

            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            port: std::env::var("PORT")
                .ok()
                .map(|v| v.parse())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(8080),
            api_key: non_empty_var("API_KEY"),
        })
    }

    /// Build the shared HTTP client used by every outbound service call
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }

    pub fn require_google_api_key(&self) -> Result<&str, ServiceError> {
        self.google_api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential("GOOGLE_API_KEY"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        google_api_key: Some("test-google-key".to_string()),
        gemini_model: "gemini-pro".to_string(),
        gemini_api_url: "http://127.0.0.1:9".to_string(),
        huggingface_api_token: Some("test-hf-token".to_string()),
        translation_api_url: "http://127.0.0.1:9".to_string(),
        tts_api_url: "http://127.0.0.1:9".to_string(),
        chat_history_path: "chat_history.json".to_string(),
        quiz_questions: 10,
        quiz_max_attempts: 5,
        http_timeout_secs: 5,
        port: 8080,
        api_key: None,
    }
}
