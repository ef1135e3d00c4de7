//! Language registry: single source of truth for the languages every activity offers.
//!
//! The registry is a lazily initialized singleton (`OnceLock`). Activities look
//! languages up by display name (quiz, dictionary) or by ISO code (translator,
//! speech) and read the activity-specific flags from the entry.

use serde::Serialize;
use std::sync::OnceLock;

/// Metadata for a supported language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageConfig {
    /// ISO 639 code used by the translation models (e.g. "en", "zh")
    pub code: &'static str,

    /// English display name (e.g. "Spanish")
    pub name: &'static str,

    /// Flag shown next to the name in language pickers
    pub flag: &'static str,

    /// Language code understood by the speech service (e.g. "zh-CN")
    pub speech_code: &'static str,

    /// Offered as a user or target language in the quiz
    pub quiz: bool,

    /// Has opus-mt translation models
    pub translatable: bool,
}

pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Case-insensitive lookup by display name
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        let name = name.trim();
        self.languages
            .iter()
            .find(|lang| lang.name.eq_ignore_ascii_case(name))
    }

    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Speech code for a display name, falling back to English when unknown
    pub fn speech_code_for(&self, name: &str) -> &'static str {
        self.get_by_name(name)
            .map(|lang| lang.speech_code)
            .unwrap_or("en")
    }

    /// Whether `code` is a code the speech service accepts
    pub fn is_speech_code(&self, code: &str) -> bool {
        self.languages.iter().any(|lang| lang.speech_code == code)
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    // (code, name, flag, speech code, quiz, translatable)
    let table: [(&'static str, &'static str, &'static str, &'static str, bool, bool); 17] = [
        ("en", "English", "🇬🇧", "en", true, true),
        ("es", "Spanish", "🇪🇸", "es", true, true),
        ("fr", "French", "🇫🇷", "fr", true, true),
        ("de", "German", "🇩🇪", "de", true, true),
        ("it", "Italian", "🇮🇹", "it", true, true),
        ("pt", "Portuguese", "🇵🇹", "pt", true, true),
        ("zh", "Chinese", "🇨🇳", "zh-CN", true, true),
        ("ja", "Japanese", "🇯🇵", "ja", true, true),
        ("ko", "Korean", "🇰🇷", "ko", true, true),
        ("ru", "Russian", "🇷🇺", "ru", false, true),
        ("ar", "Arabic", "🇸🇦", "ar", false, true),
        ("hi", "Hindi", "🇮🇳", "hi", false, true),
        ("nl", "Dutch", "🇳🇱", "nl", false, true),
        ("tr", "Turkish", "🇹🇷", "tr", false, true),
        ("pl", "Polish", "🇵🇱", "pl", false, true),
        ("sv", "Swedish", "🇸🇪", "sv", false, true),
        // No opus-mt model; speech falls back to Arabic
        ("ary", "Darija (Moroccan)", "🇲🇦", "ar", false, false),
    ];

    table
        .into_iter()
        .map(
            |(code, name, flag, speech_code, quiz, translatable)| LanguageConfig {
                code,
                name,
                flag,
                speech_code,
                quiz,
                translatable,
            },
        )
        .collect()
}
