use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::{DifficultyBalancer, Question, QuestionLedger};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizSessionError {
    #[error("No quiz in progress")]
    NotStarted,

    #[error("Quiz is already completed")]
    AlreadyCompleted,

    #[error("Quiz is not completed yet")]
    NotCompleted,

    #[error("'{0}' is not one of the options")]
    InvalidAnswer(String),
}

/// Outcome of answering the current question
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub completed: bool,
    /// Index of the question now shown, unchanged once the quiz completes
    pub current_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Outstanding,
    Great,
    Good,
    KeepStudying,
}

impl Grade {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Grade::Outstanding
        } else if percentage >= 70.0 {
            Grade::Great
        } else if percentage >= 50.0 {
            Grade::Good
        } else {
            Grade::KeepStudying
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Grade::Outstanding => "Outstanding! You're a language master! 🌟",
            Grade::Great => "Great job! Keep up the good work! 👏",
            Grade::Good => "Good effort! Keep practicing! 💪",
            Grade::KeepStudying => "Keep studying! You'll improve! 📚",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReview {
    pub question: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResults {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
    pub grade: Grade,
    pub message: &'static str,
    pub review: Vec<QuestionReview>,
}

/// One user's quiz state: difficulty history, seen-question ledger and progress.
///
/// The history and ledger live for the whole session so later quizzes keep
/// avoiding questions asked earlier; [`QuizSession::reset`] only clears progress.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    balancer: DifficultyBalancer,
    ledger: QuestionLedger,
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<usize, String>,
    completed: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balancer(&self) -> &DifficultyBalancer {
        &self.balancer
    }

    pub fn balancer_mut(&mut self) -> &mut DifficultyBalancer {
        &mut self.balancer
    }

    pub fn ledger(&self) -> &QuestionLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut QuestionLedger {
        &mut self.ledger
    }

    /// Begin a new quiz with freshly generated questions
    pub fn start(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.completed = false;
    }

    pub fn is_started(&self) -> bool {
        !self.questions.is_empty()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of correctly answered questions
    pub fn score(&self) -> usize {
        self.answers
            .iter()
            .filter(|(idx, answer)| {
                self.questions
                    .get(**idx)
                    .is_some_and(|q| q.is_correct(answer))
            })
            .count()
    }

    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn current(&self) -> Result<&Question, QuizSessionError> {
        self.ensure_in_progress()?;
        self.questions
            .get(self.current_index)
            .ok_or(QuizSessionError::NotStarted)
    }

    /// Record an answer for the current question and move on
    pub fn submit(&mut self, answer: &str) -> Result<Submission, QuizSessionError> {
        let question = self.current()?;
        if !question.options.iter().any(|o| o == answer) {
            return Err(QuizSessionError::InvalidAnswer(answer.to_string()));
        }

        let correct = question.is_correct(answer);
        let correct_answer = question.correct_answer.clone();
        let explanation = question.explanation.clone();

        self.answers.insert(self.current_index, answer.to_string());

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        } else {
            self.completed = true;
        }

        Ok(Submission {
            correct,
            correct_answer,
            explanation,
            completed: self.completed,
            current_index: self.current_index,
        })
    }

    /// Go back one question; returns whether the index moved
    pub fn previous(&mut self) -> Result<bool, QuizSessionError> {
        self.ensure_in_progress()?;
        if self.current_index == 0 {
            return Ok(false);
        }
        self.current_index -= 1;
        Ok(true)
    }

    pub fn results(&self) -> Result<QuizResults, QuizSessionError> {
        if !self.is_started() {
            return Err(QuizSessionError::NotStarted);
        }
        if !self.completed {
            return Err(QuizSessionError::NotCompleted);
        }

        let total = self.questions.len();
        let score = self.score();
        let percentage = score as f64 / total as f64 * 100.0;
        let grade = Grade::from_percentage(percentage);

        let review = self
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let your_answer = self.answers.get(&idx).cloned();
                QuestionReview {
                    question: q.text.clone(),
                    correct: your_answer.as_deref().is_some_and(|a| q.is_correct(a)),
                    your_answer,
                    correct_answer: q.correct_answer.clone(),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        Ok(QuizResults {
            score,
            total,
            percentage,
            grade,
            message: grade.message(),
            review,
        })
    }

    /// Drop the current quiz; the seen-question ledger is kept
    pub fn reset(&mut self) {
        self.start(Vec::new());
    }

    fn ensure_in_progress(&self) -> Result<(), QuizSessionError> {
        if !self.is_started() {
            return Err(QuizSessionError::NotStarted);
        }
        if self.completed {
            return Err(QuizSessionError::AlreadyCompleted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::sample_question;

    fn started(count: usize) -> QuizSession {
        let mut session = QuizSession::new();
        session.start(
            (0..count)
                .map(|i| sample_question(&format!("Question {}", i)))
                .collect(),
        );
        session
    }

    #[test]
    fn test_new_session_is_not_started() {
        let mut session = QuizSession::new();
        assert!(!session.is_started());
        assert_eq!(session.current().unwrap_err(), QuizSessionError::NotStarted);
        assert_eq!(session.submit("soy").unwrap_err(), QuizSessionError::NotStarted);
        assert_eq!(session.results().unwrap_err(), QuizSessionError::NotStarted);
    }

    #[test]
    fn test_submit_correct_answer_advances() {
        let mut session = started(3);

        let submission = session.submit("soy").unwrap();

        assert!(submission.correct);
        assert!(!submission.completed);
        assert_eq!(submission.current_index, 1);
        assert_eq!(session.score(), 1);
        assert_eq!(session.current().unwrap().text, "Question 1");
    }

    #[test]
    fn test_submit_wrong_answer() {
        let mut session = started(3);

        let submission = session.submit("eres").unwrap();

        assert!(!submission.correct);
        assert_eq!(submission.correct_answer, "soy");
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_submit_rejects_unknown_option() {
        let mut session = started(2);
        assert_eq!(
            session.submit("estoy").unwrap_err(),
            QuizSessionError::InvalidAnswer("estoy".to_string())
        );
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn test_last_answer_completes_quiz() {
        let mut session = started(2);
        session.submit("soy").unwrap();
        let submission = session.submit("es").unwrap();

        assert!(submission.completed);
        assert!(session.is_completed());
        assert_eq!(
            session.submit("soy").unwrap_err(),
            QuizSessionError::AlreadyCompleted
        );
    }

    #[test]
    fn test_previous_then_resubmit_does_not_double_count() {
        let mut session = started(3);
        session.submit("soy").unwrap();

        assert!(session.previous().unwrap());
        assert_eq!(session.current_index(), 0);
        session.submit("soy").unwrap();

        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_previous_at_first_question() {
        let mut session = started(3);
        assert!(!session.previous().unwrap());
    }

    #[test]
    fn test_results_before_completion() {
        let mut session = started(2);
        session.submit("soy").unwrap();
        assert_eq!(session.results().unwrap_err(), QuizSessionError::NotCompleted);
    }

    #[test]
    fn test_results_review_and_grade() {
        let mut session = started(4);
        session.submit("soy").unwrap();
        session.submit("soy").unwrap();
        session.submit("soy").unwrap();
        session.submit("eres").unwrap();

        let results = session.results().unwrap();

        assert_eq!(results.score, 3);
        assert_eq!(results.total, 4);
        assert!((results.percentage - 75.0).abs() < f64::EPSILON);
        assert_eq!(results.grade, Grade::Great);
        assert_eq!(results.review.len(), 4);
        assert!(!results.review[3].correct);
        assert_eq!(results.review[3].your_answer.as_deref(), Some("eres"));
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_percentage(100.0), Grade::Outstanding);
        assert_eq!(Grade::from_percentage(90.0), Grade::Outstanding);
        assert_eq!(Grade::from_percentage(89.9), Grade::Great);
        assert_eq!(Grade::from_percentage(70.0), Grade::Great);
        assert_eq!(Grade::from_percentage(50.0), Grade::Good);
        assert_eq!(Grade::from_percentage(49.0), Grade::KeepStudying);
    }

    #[test]
    fn test_reset_keeps_ledger() {
        let mut session = started(1);
        session.ledger_mut().is_new("abc");
        session.submit("soy").unwrap();

        session.reset();

        assert!(!session.is_started());
        assert!(!session.is_completed());
        assert_eq!(session.score(), 0);
        assert!(session.ledger().contains("abc"));
    }
}
