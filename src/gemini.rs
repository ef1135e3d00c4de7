use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::ServiceError;

const SERVICE: &str = "Gemini";

/// A service that turns a prompt into free text.
///
/// The quiz generator, chat tutor and dictionary only depend on this trait,
/// so tests can drive them with canned replies.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.google_api_key.clone(),
            temperature: 0.7,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url, self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredential("GOOGLE_API_KEY"))?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        debug!("Sending {} character prompt to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ServiceError::transport(SERVICE))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ServiceError::MalformedResponse {
                    service: SERVICE,
                    detail: e.to_string(),
                })?;

        extract_text(body)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: GenerateResponse) -> Result<String, ServiceError> {
    let content = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| ServiceError::MalformedResponse {
            service: SERVICE,
            detail: "response contained no candidates".to_string(),
        })?;

    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(ServiceError::MalformedResponse {
            service: SERVICE,
            detail: "candidate contained no text".to_string(),
        });
    }

    Ok(text)
}
