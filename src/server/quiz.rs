//! Quiz and block-quiz handlers. Both act on the caller's [`Session`](super::Session).

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{AppError, AppState};
use crate::block_quiz::{BlockQuizRound, BlockQuizVerdict, SPEECH_LANGUAGE};
use crate::languages::LanguageRegistry;
use crate::quiz::{Category, Difficulty, QuizRequest, QuizResults, QuizSession, Submission};

#[derive(Debug, Deserialize)]
pub struct StartQuizRequest {
    pub user_language: String,
    pub target_language: String,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub word: String,
}

/// The current question without its answer
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub topic: String,
    /// Answer given earlier, when the learner came back with `previous`
    pub selected: Option<String>,
}

impl QuestionView {
    fn of(quiz: &QuizSession) -> Result<Self, AppError> {
        let question = quiz.current()?;
        Ok(Self {
            index: quiz.current_index(),
            total: quiz.questions().len(),
            question: question.text.clone(),
            options: question.options.clone(),
            difficulty: question.difficulty,
            topic: question.topic.clone(),
            selected: quiz.answer_for(quiz.current_index()).map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BlockRoundView {
    pub blocks: Vec<String>,
    pub selected: Vec<String>,
    pub remaining: Vec<String>,
    pub complete: bool,
    pub verdict: Option<BlockQuizVerdict>,
}

impl From<&BlockQuizRound> for BlockRoundView {
    fn from(round: &BlockQuizRound) -> Self {
        Self {
            blocks: round.blocks().to_vec(),
            selected: round.selected().to_vec(),
            remaining: round.remaining().into_iter().map(str::to_string).collect(),
            complete: round.is_complete(),
            verdict: round.verdict(),
        }
    }
}

fn quiz_language(name: &str) -> Result<String, AppError> {
    LanguageRegistry::get()
        .get_by_name(name)
        .filter(|lang| lang.quiz)
        .map(|lang| lang.name.to_string())
        .ok_or_else(|| AppError::BadRequest(format!("'{}' is not a quiz language", name)))
}

pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StartQuizRequest>,
) -> Result<Json<QuestionView>, AppError> {
    let request = QuizRequest {
        user_language: quiz_language(&body.user_language)?,
        target_language: quiz_language(&body.target_language)?,
        category: body.category,
    };
    if request.user_language == request.target_language {
        return Err(AppError::BadRequest(format!(
            "Pick a target language other than {}",
            request.user_language
        )));
    }

    let session = state.session(&id).await?;
    let mut session = session.lock().await;

    let questions = state
        .generator
        .generate_quiz(&mut session.quiz, &request, state.config.quiz_questions)
        .await?;
    if questions.is_empty() {
        return Err(AppError::BadGateway(
            "Could not generate any quiz questions. Please try again.".to_string(),
        ));
    }

    info!(
        "Session started a {} question {} quiz",
        questions.len(),
        request.category
    );
    session.quiz.start(questions);
    QuestionView::of(&session.quiz).map(Json)
}

pub async fn current_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuestionView>, AppError> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    QuestionView::of(&session.quiz).map(Json)
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<Submission>, AppError> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    Ok(Json(session.quiz.submit(&body.answer)?))
}

pub async fn previous_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuestionView>, AppError> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    session.quiz.previous()?;
    QuestionView::of(&session.quiz).map(Json)
}

pub async fn results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuizResults>, AppError> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    Ok(Json(session.quiz.results()?))
}

pub async fn reset_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session = state.session(&id).await?;
    session.lock().await.quiz.reset();
    Ok(StatusCode::NO_CONTENT)
}

pub async fn block_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BlockRoundView>, AppError> {
    let session = state.session(&id).await?;
    let session = session.lock().await;
    Ok(Json(BlockRoundView::from(&session.block_quiz)))
}

pub async fn block_select(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SelectRequest>,
) -> Result<Json<BlockRoundView>, AppError> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    session.block_quiz.select(body.word.trim())?;
    Ok(Json(BlockRoundView::from(&session.block_quiz)))
}

/// Start a new block-quiz round with a fresh sentence
pub async fn block_reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BlockRoundView>, AppError> {
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    session.block_quiz = {
        let mut rng = rand::thread_rng();
        BlockQuizRound::new(&mut rng)
    };
    Ok(Json(BlockRoundView::from(&session.block_quiz)))
}

/// The round's sentence as MP3 audio
pub async fn block_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let sentence = {
        let session = state.session(&id).await?;
        let session = session.lock().await;
        session.block_quiz.sentence().to_string()
    };

    let audio = state.speech.synthesize(&sentence, SPEECH_LANGUAGE).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}
