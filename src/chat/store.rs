use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Who wrote a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "You")]
    User,
    #[serde(rename = "Bot")]
    Tutor,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Tutor => "Bot",
        }
    }
}

/// One `(role, text)` turn, stored as a two-element JSON array
pub type Turn = (Role, String);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Turn>,
}

/// The whole chat-history document: `{chats: {id: {name, messages}}, current_chat_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDocument {
    #[serde(default)]
    pub chats: BTreeMap<String, ChatSession>,
    #[serde(default)]
    pub current_chat_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access chat history at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Chat history at {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Whole-document persistence for the chat history.
///
/// `load` and `save` always move the complete document. A reader sees either
/// the previous document or the new one, never a mix. Two processes saving
/// the same store still race: the last writer wins.
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<ChatDocument>, StoreError>;

    fn save(&self, document: &ChatDocument) -> Result<(), StoreError>;
}

/// [`DocumentStore`] backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "chat_history.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> Result<Option<ChatDocument>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let document = serde_json::from_str(&contents).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        debug!("Loaded chat history from {}", self.path.display());
        Ok(Some(document))
    }

    fn save(&self, document: &ChatDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec(document).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        // Write beside the target, then swap it in with a rename
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            "Saved {} chats to {}",
            document.chats.len(),
            self.path.display()
        );
        Ok(())
    }
}
