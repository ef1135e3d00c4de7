//! AI-generated multiple-choice quiz.
//!
//! - `balancer`: keeps the three difficulty tiers evenly represented
//! - `prompt`: renders the generation prompt for a category and tier
//! - `parser`: turns a free-text model reply into a validated [`Question`]
//! - `fingerprint`: content hashes used to reject repeated questions
//! - `generator`: the bounded retry loop tying the above together
//! - `session`: per-user quiz progress and scoring

mod balancer;
mod fingerprint;
mod generator;
mod parser;
mod prompt;
mod session;

pub use balancer::{DifficultyBalancer, HISTORY_WINDOW};
pub use fingerprint::{fingerprint, Fingerprint, QuestionLedger};
pub use generator::{AttemptError, GenerationError, QuestionGenerator, QuizRequest};
pub use parser::{parse, ParseError};
pub use prompt::build_question_prompt;
pub use session::{Grade, QuestionReview, QuizResults, QuizSession, QuizSessionError, Submission};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of a generated question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }

    /// What a question of this tier should exercise
    pub fn focus_area(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "basic vocabulary and simple structures",
            Difficulty::Intermediate => "moderate complexity and common usage patterns",
            Difficulty::Advanced => "complex language features and nuanced usage",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown difficulty '{}'", s))
    }
}

/// Quiz subject area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Grammar,
    Vocabulary,
    #[serde(rename = "Common Phrases")]
    CommonPhrases,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Grammar,
        Category::Vocabulary,
        Category::CommonPhrases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grammar => "Grammar",
            Category::Vocabulary => "Vocabulary",
            Category::CommonPhrases => "Common Phrases",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// A validated multiple-choice question. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    /// Exactly four distinct options, in the order the model returned them
    pub options: Vec<String>,
    /// Byte-identical to one of `options`
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: String,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

#[cfg(test)]
pub(crate) fn sample_question(text: &str) -> Question {
    Question {
        text: text.to_string(),
        options: vec![
            "soy".to_string(),
            "eres".to_string(),
            "es".to_string(),
            "somos".to_string(),
        ],
        correct_answer: "soy".to_string(),
        explanation: "First person singular of ser".to_string(),
        difficulty: Difficulty::Beginner,
        topic: "ser conjugation".to_string(),
    }
}
