//! Quiz preview binary - generates a quiz and prints it with the answers
//!
//! Usage:
//!   cargo run --bin quiz-preview                                   # English → Spanish, Grammar
//!   cargo run --bin quiz-preview -- French German Vocabulary
//!   cargo run --bin quiz-preview -- English Italian "Common Phrases" --count 3
//!
//! Required environment variables:
//! - GOOGLE_API_KEY
//!
//! Optional:
//! - GEMINI_MODEL (defaults to gemini-pro)
//! - QUIZ_QUESTIONS (defaults to 10, overridden by --count)
//! - QUIZ_MAX_ATTEMPTS (defaults to 5)

use anyhow::{bail, Context, Result};
use chrono::Utc;
use languito::config::Config;
use languito::gemini::GeminiClient;
use languito::languages::LanguageRegistry;
use languito::quiz::{Category, Question, QuestionGenerator, QuizRequest, QuizSession};
use languito::retry::RetryPolicy;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

struct PreviewArgs {
    user_language: String,
    target_language: String,
    category: Category,
    count: Option<usize>,
}

impl PreviewArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut positional = Vec::new();
        let mut count = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--count" {
                let value = iter.next().context("--count needs a number")?;
                count = Some(value.parse().context("--count must be a number")?);
            } else {
                positional.push(arg.as_str());
            }
        }

        Ok(Self {
            user_language: quiz_language(positional.first().copied().unwrap_or("English"))?,
            target_language: quiz_language(positional.get(1).copied().unwrap_or("Spanish"))?,
            category: positional
                .get(2)
                .map(|c| c.parse::<Category>())
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or(Category::Grammar),
            count,
        })
    }
}

fn quiz_language(name: &str) -> Result<String> {
    match LanguageRegistry::get().get_by_name(name) {
        Some(lang) if lang.quiz => Ok(lang.name.to_string()),
        _ => bail!("'{}' is not a quiz language", name),
    }
}

fn render_markdown(request: &QuizRequest, questions: &[Question]) -> String {
    let mut out = format!(
        "# {} quiz: {} → {}\n\n",
        request.category, request.user_language, request.target_language
    );

    for (i, q) in questions.iter().enumerate() {
        out.push_str(&format!(
            "## {}. {} _({}, {})_\n\n",
            i + 1,
            q.text,
            q.difficulty,
            if q.topic.is_empty() { "no topic" } else { q.topic.as_str() }
        ));
        for option in &q.options {
            let mark = if q.is_correct(option) { "x" } else { " " };
            out.push_str(&format!("- [{}] {}\n", mark, option));
        }
        out.push_str(&format!("\n> {}\n\n", q.explanation));
    }

    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("languito=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = PreviewArgs::parse(&args)?;

    info!("Loading configuration...");
    let config = Config::from_env()?;
    config.require_google_api_key()?;

    let client = config.http_client()?;
    let generator = QuestionGenerator::new(
        Arc::new(GeminiClient::new(client, &config)),
        RetryPolicy::immediate(config.quiz_max_attempts),
    );

    let request = QuizRequest {
        user_language: args.user_language,
        target_language: args.target_language,
        category: args.category,
    };
    let count = args.count.unwrap_or(config.quiz_questions);

    info!(
        "Generating {} {} questions ({} → {})...",
        count, request.category, request.user_language, request.target_language
    );
    let mut session = QuizSession::new();
    let questions = generator
        .generate_quiz(&mut session, &request, count)
        .await?;

    if questions.is_empty() {
        println!("\n========== NO QUESTIONS GENERATED ==========");
        println!("Every question exhausted its {} attempts.", config.quiz_max_attempts);
        println!("============================================\n");
        return Ok(());
    }

    let markdown = render_markdown(&request, &questions);

    let history_dir = Path::new("run-history");
    fs::create_dir_all(history_dir).context("Failed to create run-history directory")?;
    let filepath = history_dir.join(format!("quiz_{}.md", Utc::now().format("%Y-%m-%d_%H-%M-%S")));
    fs::write(&filepath, &markdown).context("Failed to write quiz preview")?;

    println!("\n{}", markdown);
    println!(
        "Generated {}/{} questions. Saved to {}",
        questions.len(),
        count,
        filepath.display()
    );

    Ok(())
}
