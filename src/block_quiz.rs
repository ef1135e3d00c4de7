//! Word-order ("block") quiz: listen to a sentence, then rebuild it from
//! scrambled word blocks that include a couple of distractors.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

const TEMPLATES: [&str; 5] = [
    "The {adjective} {noun} {verb} {adverb}.",
    "{subject} {verb} {object} {adverb}.",
    "In the {place}, {subject} {verb} {object}.",
    "{timeframe}, {subject} will {verb} {object}.",
    "{subject} {verb} {object} because {reason}.",
];

const WORD_POOLS: [(&str, &[&str]); 9] = [
    ("adjective", &["happy", "sad", "excited", "curious", "friendly", "brave"]),
    ("noun", &["cat", "dog", "bird", "child", "teacher", "student"]),
    ("verb", &["runs", "jumps", "sings", "reads", "writes", "plays"]),
    ("adverb", &["quickly", "slowly", "loudly", "quietly", "carefully", "happily"]),
    ("subject", &["The boy", "The girl", "The teacher", "The dog", "My friend", "The student"]),
    ("object", &["the ball", "a book", "the guitar", "homework", "a game", "the puzzle"]),
    ("place", &["park", "school", "library", "garden", "playground", "museum"]),
    ("timeframe", &["Tomorrow", "Next week", "In the future", "Soon", "Later today"]),
    ("reason", &["it's fun", "it's important", "they enjoy it", "it's a hobby", "it's challenging"]),
];

/// Words mixed into the blocks that never belong to the sentence
pub const DISTRACTORS: [&str; 5] = ["however", "although", "nevertheless", "suddenly", "meanwhile"];

/// Language the round's sentence is spoken in
pub const SPEECH_LANGUAGE: &str = "en";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockQuizError {
    #[error("'{0}' is not one of the offered blocks")]
    UnknownWord(String),

    #[error("'{0}' has already been used")]
    AlreadySelected(String),

    #[error("The sentence is already complete")]
    Complete,
}

/// Result of checking a finished arrangement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockQuizVerdict {
    pub correct: bool,
    pub expected: String,
}

/// Fill a random template with random words from each pool
pub fn generate_sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let template = TEMPLATES[rng.gen_range(0..TEMPLATES.len())];

    WORD_POOLS
        .iter()
        .fold(template.to_string(), |sentence, (slot, words)| {
            let placeholder = format!("{{{}}}", slot);
            if sentence.contains(&placeholder) {
                let word = words[rng.gen_range(0..words.len())];
                sentence.replace(&placeholder, word)
            } else {
                sentence
            }
        })
}

/// Split a sentence into its lower-cased words and a shuffled block set
/// containing those words plus two distinct distractors
pub fn scramble<R: Rng + ?Sized>(sentence: &str, rng: &mut R) -> (Vec<String>, Vec<String>) {
    let words: Vec<String> = sentence
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut blocks = words.clone();
    blocks.shuffle(rng);
    blocks.extend(
        DISTRACTORS
            .choose_multiple(rng, 2)
            .map(|w| w.to_string()),
    );
    blocks.shuffle(rng);

    (words, blocks)
}

/// One round of the block quiz
#[derive(Debug, Clone)]
pub struct BlockQuizRound {
    sentence: String,
    correct_words: Vec<String>,
    blocks: Vec<String>,
    selected: Vec<String>,
}

impl BlockQuizRound {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_sentence(generate_sentence(rng), rng)
    }

    pub fn from_sentence<R: Rng + ?Sized>(sentence: String, rng: &mut R) -> Self {
        let (correct_words, blocks) = scramble(&sentence, rng);
        Self {
            sentence,
            correct_words,
            blocks,
            selected: Vec::new(),
        }
    }

    /// The sentence to be spoken to the learner
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Blocks that are still available to pick
    pub fn remaining(&self) -> Vec<&str> {
        let mut used = self.selected.clone();
        self.blocks
            .iter()
            .filter(|block| match used.iter().position(|u| u == *block) {
                Some(pos) => {
                    used.swap_remove(pos);
                    false
                }
                None => true,
            })
            .map(String::as_str)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() == self.correct_words.len()
    }

    /// Append a block to the arrangement.
    ///
    /// Returns the verdict once the arrangement is as long as the sentence.
    pub fn select(&mut self, word: &str) -> Result<Option<BlockQuizVerdict>, BlockQuizError> {
        if self.is_complete() {
            return Err(BlockQuizError::Complete);
        }

        let offered = self.blocks.iter().filter(|b| *b == word).count();
        if offered == 0 {
            return Err(BlockQuizError::UnknownWord(word.to_string()));
        }
        let used = self.selected.iter().filter(|s| *s == word).count();
        if used >= offered {
            return Err(BlockQuizError::AlreadySelected(word.to_string()));
        }

        self.selected.push(word.to_string());
        Ok(self.verdict())
    }

    /// Verdict for a complete arrangement, `None` while words are missing
    pub fn verdict(&self) -> Option<BlockQuizVerdict> {
        if !self.is_complete() {
            return None;
        }
        Some(BlockQuizVerdict {
            correct: self.selected == self.correct_words,
            expected: self.correct_words.join(" "),
        })
    }
}
