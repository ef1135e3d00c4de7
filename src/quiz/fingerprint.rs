use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::Question;

/// Hex SHA-256 digest of a question's normalized content
pub type Fingerprint = String;

/// Hash the lower-cased question text, sorted options, answer and topic.
///
/// Options are sorted before hashing, so the same question with its options
/// shuffled produces the same fingerprint.
pub fn fingerprint(question: &Question) -> Fingerprint {
    let mut options: Vec<String> = question.options.iter().map(|o| o.to_lowercase()).collect();
    options.sort();

    let content = format!(
        "{}{}{}{}",
        question.text.to_lowercase(),
        options.join(","),
        question.correct_answer.to_lowercase(),
        question.topic.to_lowercase(),
    );

    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Fingerprints of every question accepted in a session.
///
/// Grows until the session is dropped or [`QuestionLedger::clear`] is called.
#[derive(Debug, Clone, Default)]
pub struct QuestionLedger {
    seen: HashSet<Fingerprint>,
}

impl QuestionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records the hash the first time it is seen
    pub fn is_new(&mut self, hash: &str) -> bool {
        if self.seen.contains(hash) {
            return false;
        }
        self.seen.insert(hash.to_string())
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.seen.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::sample_question;
    use proptest::prelude::*;

    #[test]
    fn test_fingerprint_is_fixed_length_hex() {
        let hash = fingerprint(&sample_question("Yo ___ estudiante"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reordered_options_collide() {
        let q1 = sample_question("Yo ___ estudiante");
        let mut q2 = q1.clone();
        q2.options.reverse();

        assert_eq!(fingerprint(&q1), fingerprint(&q2));
    }

    #[test]
    fn test_case_is_ignored() {
        let q1 = sample_question("Yo ___ estudiante");
        let mut q2 = q1.clone();
        q2.text = q2.text.to_uppercase();
        q2.topic = "SER Conjugation".to_string();

        assert_eq!(fingerprint(&q1), fingerprint(&q2));
    }

    #[test]
    fn test_changed_option_differs() {
        let q1 = sample_question("Yo ___ estudiante");
        let mut q2 = q1.clone();
        q2.options[3] = "son".to_string();

        assert_ne!(fingerprint(&q1), fingerprint(&q2));
    }

    #[test]
    fn test_explanation_and_difficulty_are_not_hashed() {
        let q1 = sample_question("Yo ___ estudiante");
        let mut q2 = q1.clone();
        q2.explanation = "Different wording".to_string();
        q2.difficulty = crate::quiz::Difficulty::Advanced;

        assert_eq!(fingerprint(&q1), fingerprint(&q2));
    }

    #[test]
    fn test_ledger_registers_on_first_sight() {
        let mut ledger = QuestionLedger::new();
        let hash = fingerprint(&sample_question("Q"));

        assert!(ledger.is_new(&hash));
        assert!(ledger.contains(&hash));
        assert!(!ledger.is_new(&hash));
        assert_eq!(ledger.len(), 1);

        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.is_new(&hash));
    }

    proptest! {
        #[test]
        fn prop_option_order_does_not_matter(perm in Just(vec![0usize, 1, 2, 3]).prop_shuffle()) {
            let q1 = sample_question("Ella ___ médica");
            let mut q2 = q1.clone();
            q2.options = perm.iter().map(|&i| q1.options[i].clone()).collect();

            prop_assert_eq!(fingerprint(&q1), fingerprint(&q2));
        }

        #[test]
        fn prop_option_content_matters(replacement in "[a-z]{1,12}") {
            let q1 = sample_question("Ella ___ médica");
            prop_assume!(!q1.options.iter().any(|o| o.eq_ignore_ascii_case(&replacement)));

            let mut q2 = q1.clone();
            q2.options[1] = replacement;

            prop_assert_ne!(fingerprint(&q1), fingerprint(&q2));
        }
    }
}
