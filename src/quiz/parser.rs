use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use super::{Difficulty, Question};

/// Why a model reply could not be turned into a [`Question`].
///
/// Every variant is a signal to ask again; no field is ever guessed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply is empty")]
    Empty,

    #[error("reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("expected 4 options, got {0}")]
    WrongOptionCount(usize),

    #[error("options contain duplicate '{0}'")]
    DuplicateOption(String),

    #[error("correct answer '{0}' is not one of the options")]
    AnswerNotInOptions(String),

    #[error("unknown difficulty '{0}'")]
    UnknownDifficulty(String),
}

/// Reply shape with every field optional, so absence is reported by name
#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: Option<String>,
    options: Option<Vec<String>>,
    correct_answer: Option<String>,
    explanation: Option<String>,
    difficulty: Option<String>,
    topic: Option<String>,
}

/// Strip an optional code fence and the control whitespace around the JSON
fn unwrap_reply(raw: &str) -> String {
    let text = raw.trim();

    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = text.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        text
    };

    inner
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Parse a generative-service reply into a validated question
pub fn parse(raw: &str) -> Result<Question, ParseError> {
    let body = unwrap_reply(raw);
    if body.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let raw: RawQuestion =
        serde_json::from_str(&body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let text = raw.question.ok_or(ParseError::MissingField("question"))?;
    let options = raw.options.ok_or(ParseError::MissingField("options"))?;
    let correct_answer = raw
        .correct_answer
        .ok_or(ParseError::MissingField("correct_answer"))?;
    let explanation = raw
        .explanation
        .ok_or(ParseError::MissingField("explanation"))?;
    let difficulty = raw
        .difficulty
        .ok_or(ParseError::MissingField("difficulty"))?;

    if options.len() != 4 {
        return Err(ParseError::WrongOptionCount(options.len()));
    }

    let mut seen = HashSet::new();
    for option in &options {
        if !seen.insert(option.as_str()) {
            return Err(ParseError::DuplicateOption(option.clone()));
        }
    }

    if !options.contains(&correct_answer) {
        return Err(ParseError::AnswerNotInOptions(correct_answer));
    }

    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|_| ParseError::UnknownDifficulty(difficulty))?;

    Ok(Question {
        text,
        options,
        correct_answer,
        explanation,
        difficulty,
        topic: raw.topic.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> serde_json::Value {
        serde_json::json!({
            "question": "¿Cómo se dice 'apple'?",
            "options": ["manzana", "pera", "naranja", "uva"],
            "correct_answer": "manzana",
            "explanation": "Manzana means apple.",
            "difficulty": "beginner",
            "topic": "fruit"
        })
    }

    #[test]
    fn test_parse_plain_json() {
        let question = parse(&valid_json().to_string()).expect("should parse");

        assert_eq!(question.text, "¿Cómo se dice 'apple'?");
        assert_eq!(question.options[0], "manzana");
        assert_eq!(question.correct_answer, "manzana");
        assert_eq!(question.difficulty, Difficulty::Beginner);
        assert_eq!(question.topic, "fruit");
    }

    #[test]
    fn test_parse_json_fence() {
        let reply = format!(
            "Here you go:\n```json\n{}\n```\nGood luck!",
            serde_json::to_string_pretty(&valid_json()).unwrap()
        );
        assert!(parse(&reply).is_ok());
    }

    #[test]
    fn test_parse_bare_fence() {
        let reply = format!("```\n{}\n```", valid_json());
        assert!(parse(&reply).is_ok());
    }

    #[test]
    fn test_parse_strips_tabs_and_newlines() {
        let reply = "{\n\t\"question\": \"Q\",\r\n\t\"options\": [\"a\", \"b\", \"c\", \"d\"],\n\t\"correct_answer\": \"b\",\n\t\"explanation\": \"E\",\n\t\"difficulty\": \"Advanced\"\n}";
        let question = parse(reply).expect("should parse");
        assert_eq!(question.difficulty, Difficulty::Advanced);
        assert_eq!(question.topic, "");
    }

    #[test]
    fn test_parse_empty_string() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   \n"), Err(ParseError::Empty));
        assert_eq!(parse("```json\n```"), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(matches!(
            parse("Sorry, I cannot help with that."),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_missing_correct_answer() {
        let mut json = valid_json();
        json.as_object_mut().unwrap().remove("correct_answer");

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::MissingField("correct_answer"))
        );
    }

    #[test]
    fn test_parse_missing_explanation() {
        let mut json = valid_json();
        json.as_object_mut().unwrap().remove("explanation");

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::MissingField("explanation"))
        );
    }

    #[test]
    fn test_parse_three_options() {
        let mut json = valid_json();
        json["options"] = serde_json::json!(["manzana", "pera", "naranja"]);

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::WrongOptionCount(3))
        );
    }

    #[test]
    fn test_parse_options_not_a_list() {
        let mut json = valid_json();
        json["options"] = serde_json::json!("manzana, pera, naranja, uva");

        assert!(matches!(
            parse(&json.to_string()),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_duplicate_options() {
        let mut json = valid_json();
        json["options"] = serde_json::json!(["manzana", "pera", "pera", "uva"]);

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::DuplicateOption("pera".to_string()))
        );
    }

    #[test]
    fn test_parse_answer_not_in_options() {
        let mut json = valid_json();
        json["correct_answer"] = serde_json::json!("Manzana");

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::AnswerNotInOptions("Manzana".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_difficulty() {
        let mut json = valid_json();
        json["difficulty"] = serde_json::json!("expert");

        assert_eq!(
            parse(&json.to_string()),
            Err(ParseError::UnknownDifficulty("expert".to_string()))
        );
    }

    #[test]
    fn test_parse_preserves_option_order() {
        let mut json = valid_json();
        json["options"] = serde_json::json!(["uva", "naranja", "manzana", "pera"]);

        let question = parse(&json.to_string()).unwrap();
        assert_eq!(question.options, vec!["uva", "naranja", "manzana", "pera"]);
    }
}
