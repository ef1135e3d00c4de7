use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AppError, AppState};
use crate::dictionary::WordContext;
use crate::languages::{LanguageConfig, LanguageRegistry};
use crate::translation::TextStats;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Language code, e.g. `en`
    pub source: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translation: String,
    pub source_stats: TextStats,
    pub translation_stats: TextStats,
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    /// Speech code (`zh-CN`) or display name (`Chinese`)
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct DictionaryRequest {
    pub word: String,
    pub input_language: String,
    pub output_language: String,
    #[serde(default)]
    pub audio: bool,
}

#[derive(Debug, Serialize)]
pub struct DictionaryResponse {
    pub word: String,
    pub context: WordContext,
    /// Field → `data:` URI, only when audio was requested
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub audio: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<&'static LanguageConfig>,
}

fn translatable(code: &str) -> Result<(), AppError> {
    match LanguageRegistry::get().get_by_code(code) {
        Some(lang) if lang.translatable => Ok(()),
        _ => Err(AppError::BadRequest(format!(
            "'{}' is not a supported translation language",
            code
        ))),
    }
}

fn speech_code(language: &str) -> Result<&'static str, AppError> {
    let registry = LanguageRegistry::get();
    let language = language.trim();

    if let Some(lang) = registry.list_all().into_iter().find(|l| l.speech_code == language) {
        return Ok(lang.speech_code);
    }
    registry
        .get_by_name(language)
        .map(|lang| lang.speech_code)
        .ok_or_else(|| AppError::BadRequest(format!("'{}' is not a speech language", language)))
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, AppError> {
    translatable(&body.source)?;
    translatable(&body.target)?;

    let translation = state
        .translator
        .translate(&body.text, &body.source, &body.target)
        .await?;

    Ok(Json(TranslateResponse {
        source_stats: TextStats::of(&body.text),
        translation_stats: TextStats::of(&translation),
        translation,
    }))
}

pub async fn speech(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeechRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = speech_code(&body.language)?;
    let audio = state.speech.synthesize(&body.text, code).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

pub async fn dictionary(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DictionaryRequest>,
) -> Result<Json<DictionaryResponse>, AppError> {
    let context = state
        .dictionary
        .lookup(&body.word, &body.input_language, &body.output_language)
        .await?;

    let audio = if body.audio {
        state
            .dictionary
            .audio_for(&body.word, &context, &body.output_language)
            .await
    } else {
        BTreeMap::new()
    };

    Ok(Json(DictionaryResponse {
        word: body.word.trim().to_string(),
        context,
        audio,
    }))
}

pub async fn languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: LanguageRegistry::get().list_all(),
    })
}
