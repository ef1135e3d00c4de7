use std::sync::Arc;
use tracing::debug;

use super::store::Turn;
use crate::error::ServiceError;
use crate::gemini::TextGenerator;

/// Render the tutor prompt from the earlier turns and the new question
pub fn build_tutor_prompt(history: &[Turn], question: &str) -> String {
    let history_text = history
        .iter()
        .map(|(role, text)| format!("{}: {}", role.label(), text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a multilingual language teacher specializing in teaching and translating various languages.
Your name is Languito.
When answering questions:
1. If the user asks for translations, provide accurate translations for the requested languages.
2. If the user asks for grammar rules or language tips, explain them clearly and concisely.
3. If the user asks for examples, provide them with practical, everyday scenarios.
4. If the user asks for a quiz, create a brief, fun language quiz with answers.

Previous conversation:
{history_text}

Current Question: {question}
If it is not a question, answer as a human would.
Response:"#
    )
}

/// Conversational language tutor backed by the generative text service
#[derive(Clone)]
pub struct ChatTutor {
    client: Arc<dyn TextGenerator>,
}

impl ChatTutor {
    pub fn new(client: Arc<dyn TextGenerator>) -> Self {
        Self { client }
    }

    /// Answer `question` in the context of `history`
    pub async fn respond(&self, history: &[Turn], question: &str) -> Result<String, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Message must not be empty".to_string(),
            ));
        }

        debug!("Tutor prompt with {} previous turns", history.len());
        let reply = self
            .client
            .generate(&build_tutor_prompt(history, question))
            .await?;

        Ok(reply.trim().to_string())
    }
}
