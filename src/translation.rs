use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ServiceError;

const SERVICE: &str = "Translation";

/// Longest text sent to the translation model in one request
pub const MAX_TRANSLATION_CHARS: usize = 5000;

/// Hugging Face inference request for an opus-mt model
#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    translation_text: String,
}

/// Character and word counts shown next to translated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }
}

/// Client for the `Helsinki-NLP/opus-mt-{src}-{tgt}` translation models
#[derive(Debug, Clone)]
pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl Translator {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.translation_api_url.trim_end_matches('/').to_string(),
            token: config.huggingface_api_token.clone(),
        }
    }

    fn model_url(&self, source_code: &str, target_code: &str) -> String {
        format!(
            "{}/Helsinki-NLP/opus-mt-{}-{}",
            self.api_url, source_code, target_code
        )
    }

    /// Translate `text` between two language codes (e.g. `en` → `es`)
    pub async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> Result<String, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Text to translate must not be empty".to_string(),
            ));
        }
        let length = text.chars().count();
        if length > MAX_TRANSLATION_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "Text to translate is {} characters, the limit is {}",
                length, MAX_TRANSLATION_CHARS
            )));
        }
        if source_code == target_code {
            return Err(ServiceError::InvalidInput(format!(
                "Source and target language are both '{}'",
                source_code
            )));
        }

        let token = self
            .token
            .as_deref()
            .ok_or(ServiceError::MissingCredential("HUGGINGFACE_API_TOKEN"))?;

        debug!(
            "Translating {} characters from {} to {}",
            text.len(),
            source_code,
            target_code
        );

        let response = self
            .client
            .post(self.model_url(source_code, target_code))
            .bearer_auth(token)
            .json(&TranslationRequest { inputs: text })
            .send()
            .await
            .map_err(ServiceError::transport(SERVICE))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let items: Vec<TranslationItem> =
            response
                .json()
                .await
                .map_err(|e| ServiceError::MalformedResponse {
                    service: SERVICE,
                    detail: e.to_string(),
                })?;

        let translated = items
            .into_iter()
            .next()
            .map(|item| item.translation_text)
            .ok_or_else(|| ServiceError::MalformedResponse {
                service: SERVICE,
                detail: "response contained no translations".to_string(),
            })?;

        info!("Translated text from {} to {}", source_code, target_code);
        Ok(translated)
    }
}
