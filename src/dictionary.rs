//! Word context explorer: asks the generative service for a structured
//! analysis of one word and optionally voices every part of the answer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::gemini::TextGenerator;
use crate::languages::LanguageRegistry;
use crate::speech::{data_uri, SpeechSynthesizer};

/// Structured analysis of a word. Fields the reply leaves out stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordContext {
    pub definition: String,
    pub parts_of_speech: String,
    pub etymology: String,
    pub examples: Vec<String>,
    pub synonyms: Vec<String>,
    pub related_words: Vec<String>,
}

impl WordContext {
    /// Context used when the reply has no decodable JSON object
    pub fn fallback(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            parts_of_speech: "Unknown".to_string(),
            etymology: "Not available".to_string(),
            examples: vec!["No examples could be generated.".to_string()],
            synonyms: Vec::new(),
            related_words: Vec::new(),
        }
    }

    /// Every voiceable piece of the context, keyed by field (`examples.0`, ...)
    fn spoken_items<'a>(&'a self, word: &'a str) -> Vec<(String, &'a str)> {
        let mut items = vec![
            ("word".to_string(), word),
            ("definition".to_string(), self.definition.as_str()),
            ("parts_of_speech".to_string(), self.parts_of_speech.as_str()),
            ("etymology".to_string(), self.etymology.as_str()),
        ];
        for (field, values) in [
            ("examples", &self.examples),
            ("synonyms", &self.synonyms),
            ("related_words", &self.related_words),
        ] {
            items.extend(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, value)| (format!("{}.{}", field, i), value.as_str())),
            );
        }
        items.retain(|(_, text)| !text.trim().is_empty());
        items
    }
}

pub fn build_word_prompt(word: &str, input_language: &str, output_language: &str) -> String {
    format!(
        r#"Provide a comprehensive linguistic analysis of the word "{word}" in {input_language}, and return the explanation in {output_language}. Include:
1. Definition
2. Parts of Speech
3. Etymology
4. 3-4 Example Sentences
5. Synonyms
6. Related Words or Nuanced Meanings

Return the response as a valid JSON string with these keys:
{{
    "definition": "",
    "parts_of_speech": "",
    "etymology": "",
    "examples": [],
    "synonyms": [],
    "related_words": []
}}"#
    )
}

fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON block pattern"))
}

/// Outermost `{...}` span of a reply, if any
pub fn extract_json(reply: &str) -> Option<&str> {
    json_block().find(reply).map(|m| m.as_str())
}

/// Turn a raw reply into a context, falling back instead of failing
pub fn parse_word_context(reply: &str) -> WordContext {
    let Some(block) = extract_json(reply) else {
        debug!("Dictionary reply contained no JSON object");
        return WordContext::fallback("Unable to extract structured context.");
    };

    match serde_json::from_str(block) {
        Ok(context) => context,
        Err(e) => {
            debug!("Dictionary JSON did not decode: {}", e);
            WordContext::fallback(block)
        }
    }
}

pub struct Dictionary {
    client: Arc<dyn TextGenerator>,
    speech: SpeechSynthesizer,
}

impl Dictionary {
    pub fn new(client: Arc<dyn TextGenerator>, speech: SpeechSynthesizer) -> Self {
        Self { client, speech }
    }

    /// Analyse `word` (written in `input_language`) with the explanation in `output_language`
    pub async fn lookup(
        &self,
        word: &str,
        input_language: &str,
        output_language: &str,
    ) -> Result<WordContext, ServiceError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Word must not be empty".to_string(),
            ));
        }

        let reply = self
            .client
            .generate(&build_word_prompt(word, input_language, output_language))
            .await?;

        Ok(parse_word_context(&reply))
    }

    /// Voice the word and each field of its context in `output_language`.
    ///
    /// Items that fail to synthesize are left out of the map.
    pub async fn audio_for(
        &self,
        word: &str,
        context: &WordContext,
        output_language: &str,
    ) -> BTreeMap<String, String> {
        let lang_code = LanguageRegistry::get().speech_code_for(output_language);
        let mut audio = BTreeMap::new();

        for (key, text) in context.spoken_items(word.trim()) {
            match self.speech.synthesize(text, lang_code).await {
                Ok(bytes) => {
                    audio.insert(key, data_uri(&bytes));
                }
                Err(e) => warn!("Skipping audio for {}: {}", key, e),
            }
        }

        audio
    }
}
