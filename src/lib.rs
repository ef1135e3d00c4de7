pub mod block_quiz;
pub mod chat;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod gemini;
pub mod languages;
pub mod quiz;
pub mod retry;
pub mod server;
pub mod speech;
pub mod translation;
