use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use crate::config::Config;
use crate::error::ServiceError;
use crate::languages::LanguageRegistry;

const SERVICE: &str = "Speech";

/// Longest text the speech endpoint accepts in one request
pub const MAX_CHUNK_CHARS: usize = 100;

/// Longest text [`SpeechSynthesizer::synthesize`] will read aloud
pub const MAX_SPEECH_CHARS: usize = 500;

/// Split text into chunks of at most `max_chars` characters, breaking between
/// words. A single word longer than the limit is cut into pieces.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect()));
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Embed MP3 bytes in a `data:` URI for an audio element
pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:audio/mp3;base64,{}", STANDARD.encode(bytes))
}

/// Client for the Google Translate text-to-speech endpoint
#[derive(Debug, Clone)]
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    api_url: String,
}

impl SpeechSynthesizer {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.tts_api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Synthesize `text` spoken in `lang_code` and return the MP3 bytes
    pub async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Vec<u8>, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Text to speak must not be empty".to_string(),
            ));
        }
        let length = text.chars().count();
        if length > MAX_SPEECH_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "Text to speak is {} characters, the limit is {}",
                length, MAX_SPEECH_CHARS
            )));
        }
        if !LanguageRegistry::get().is_speech_code(lang_code) {
            return Err(ServiceError::InvalidInput(format!(
                "Unsupported speech language '{}'",
                lang_code
            )));
        }

        let chunks = split_into_chunks(text, MAX_CHUNK_CHARS);
        debug!("Synthesizing {} chunks in {}", chunks.len(), lang_code);

        // One request at a time so the audio stays in reading order
        let parts: Vec<Vec<u8>> = stream::iter(chunks)
            .then(|chunk| self.fetch_chunk(chunk, lang_code))
            .try_collect()
            .await?;

        Ok(parts.concat())
    }

    async fn fetch_chunk(&self, chunk: String, lang_code: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(format!("{}/translate_tts", self.api_url))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang_code),
                ("q", chunk.as_str()),
            ])
            .send()
            .await
            .map_err(ServiceError::transport(SERVICE))?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(ServiceError::transport(SERVICE))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use proptest::prelude::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn synthesizer_for(server: &MockServer) -> SpeechSynthesizer {
        let mut config = test_config();
        config.tts_api_url = server.uri();
        SpeechSynthesizer::new(reqwest::Client::new(), &config)
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("Hola, ¿qué tal?", 100), vec!["Hola, ¿qué tal?"]);
        assert!(split_into_chunks("   ", 100).is_empty());
    }

    #[test]
    fn test_split_on_word_boundaries() {
        let chunks = split_into_chunks("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_overlong_word_is_cut() {
        let chunks = split_into_chunks("hi abcdefghij", 4);
        assert_eq!(chunks, vec!["hi", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri(b"ID3"), "data:audio/mp3;base64,SUQz");
    }

    proptest! {
        #[test]
        fn prop_chunks_respect_limit_and_keep_words(words in prop::collection::vec("[a-zé]{1,30}", 0..60)) {
            let text = words.join(" ");
            let chunks = split_into_chunks(&text, MAX_CHUNK_CHARS);

            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
            }
            prop_assert_eq!(chunks.join(" "), text);
        }
    }

    #[tokio::test]
    async fn test_synthesize_fetches_chunks_in_order() {
        let server = MockServer::start().await;
        let first = "a".repeat(60);
        let second = "b".repeat(60);

        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("tl", "es"))
            .and(query_param("client", "tw-ob"))
            .and(query_param("q", first.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"AAA".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .and(query_param("q", second.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BBB".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let audio = synthesizer_for(&server)
            .synthesize(&format!("{} {}", first, second), "es")
            .await
            .unwrap();

        assert_eq!(audio, b"AAABBB");
    }

    #[tokio::test]
    async fn test_synthesize_rejects_unknown_language_and_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let synthesizer = synthesizer_for(&server);

        let err = synthesizer.synthesize("hello", "xx").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = synthesizer.synthesize(" ", "en").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_synthesize_rejects_long_text_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3".to_vec()))
            .expect(0)
            .mount(&server)
            .await;
        let synthesizer = synthesizer_for(&server);

        let err = synthesizer
            .synthesize(&"palabra ".repeat(2500), "es")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = synthesizer
            .synthesize(&"é".repeat(MAX_SPEECH_CHARS + 1), "fr")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_synthesize_accepts_text_at_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_tts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"A".to_vec()))
            .expect(5)
            .mount(&server)
            .await;

        // 100 four-letter words: 499 characters, five chunks
        let text = vec!["hola"; 100].join(" ");
        let audio = synthesizer_for(&server).synthesize(&text, "es").await.unwrap();

        assert_eq!(audio, b"AAAAA");
    }

    #[tokio::test]
    async fn test_synthesize_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = synthesizer_for(&server)
            .synthesize("hello", "en")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Status { .. }));
    }
}
