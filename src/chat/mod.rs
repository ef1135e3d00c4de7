//! Languito tutor chat: prompt building, multi-chat book and its persistence.

mod book;
mod store;
mod tutor;

pub use book::{ChatBook, ChatError};
pub use store::{ChatDocument, ChatSession, DocumentStore, JsonFileStore, Role, StoreError, Turn};
pub use tutor::{build_tutor_prompt, ChatTutor};
