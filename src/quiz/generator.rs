use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{build_question_prompt, fingerprint, parse, Category, ParseError, Question, QuizSession};
use crate::error::ServiceError;
use crate::gemini::TextGenerator;
use crate::retry::RetryPolicy;

/// Languages and category a quiz is generated for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub user_language: String,
    pub target_language: String,
    pub category: Category,
}

/// Why a single attempt was rejected
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("malformed question: {0}")]
    Parse(#[from] ParseError),

    #[error("duplicate question {0}")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Failed before any attempt could succeed, e.g. no API key
    #[error(transparent)]
    Service(ServiceError),

    #[error("Could not generate a valid unique question after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: AttemptError,
    },
}

/// Drives prompt → reply → parse → dedupe until a question is accepted or the
/// retry budget is spent.
#[derive(Clone)]
pub struct QuestionGenerator {
    client: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl QuestionGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Generate one question that the session has not seen before
    pub async fn generate(
        &self,
        session: &mut QuizSession,
        request: &QuizRequest,
    ) -> Result<Question, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<AttemptError> = None;

        for attempt in 0..max_attempts {
            self.policy.pause_before(attempt, "Quiz question").await;

            match self.attempt(session, request).await {
                Ok(question) => {
                    if attempt > 0 {
                        debug!(
                            "Quiz question: succeeded on attempt {}/{}",
                            attempt + 1,
                            max_attempts
                        );
                    }
                    return Ok(question);
                }
                Err(AttemptError::Service(e)) if e.is_missing_credential() => {
                    error!("Quiz question: {}", e);
                    return Err(GenerationError::Service(e));
                }
                Err(e @ AttemptError::Duplicate(_)) => {
                    info!(
                        "Quiz question: duplicate on attempt {}/{}, retrying",
                        attempt + 1,
                        max_attempts
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!(
                        "Quiz question: attempt {}/{} failed: {}",
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.expect("At least one attempt should have been made");
        error!(
            "Quiz question: all {} attempts failed. Last error: {}",
            max_attempts, last
        );
        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last,
        })
    }

    /// Generate up to `count` questions, skipping any that exhaust their attempts.
    ///
    /// Only a missing credential aborts the batch; an empty result means every
    /// question exhausted its budget.
    pub async fn generate_quiz(
        &self,
        session: &mut QuizSession,
        request: &QuizRequest,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        let mut questions = Vec::with_capacity(count);

        for index in 0..count {
            match self.generate(session, request).await {
                Ok(question) => questions.push(question),
                Err(GenerationError::Service(e)) => return Err(GenerationError::Service(e)),
                Err(e) => error!("Skipping question {}/{}: {}", index + 1, count, e),
            }
        }

        info!(
            "Generated {}/{} {} questions ({} → {})",
            questions.len(),
            count,
            request.category,
            request.user_language,
            request.target_language
        );

        Ok(questions)
    }

    async fn attempt(
        &self,
        session: &mut QuizSession,
        request: &QuizRequest,
    ) -> Result<Question, AttemptError> {
        let difficulty = {
            let mut rng = rand::thread_rng();
            session.balancer_mut().next_difficulty(&mut rng)
        };

        let prompt = build_question_prompt(
            &request.user_language,
            &request.target_language,
            request.category,
            difficulty,
        );

        let reply = self.client.generate(&prompt).await?;
        let question = parse(&reply)?;

        let hash = fingerprint(&question);
        if !session.ledger_mut().is_new(&hash) {
            return Err(AttemptError::Duplicate(hash));
        }

        Ok(question)
    }
}
