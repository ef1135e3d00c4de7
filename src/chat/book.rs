use chrono::{DateTime, Local};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::store::{ChatDocument, ChatSession, DocumentStore, Role, StoreError, Turn};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Chat '{0}' not found")]
    NotFound(String),

    #[error("The current chat is empty. Use it before creating a new one.")]
    CurrentChatEmpty,
}

/// All of a user's tutor chats, saved to the store after every change
pub struct ChatBook {
    document: ChatDocument,
    store: Arc<dyn DocumentStore>,
}

impl ChatBook {
    /// Load the saved chats, starting a first chat when there are none
    pub fn open(store: Arc<dyn DocumentStore>) -> Result<Self, ChatError> {
        let document = store.load()?.unwrap_or_default();
        let mut book = Self { document, store };

        // Drop a dangling pointer left by an edited file
        if let Some(id) = book.document.current_chat_id.clone() {
            if !book.document.chats.contains_key(&id) {
                book.document.current_chat_id = None;
            }
        }

        if book.document.chats.is_empty() {
            book.create_chat()?;
        }

        info!("Opened chat book with {} chats", book.document.chats.len());
        Ok(book)
    }

    pub fn document(&self) -> &ChatDocument {
        &self.document
    }

    pub fn chats(&self) -> impl Iterator<Item = (&str, &ChatSession)> {
        self.document
            .chats
            .iter()
            .map(|(id, chat)| (id.as_str(), chat))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.document.current_chat_id.as_deref()
    }

    /// Turns of the current chat, empty when no chat is selected
    pub fn current_messages(&self) -> &[Turn] {
        self.current_id()
            .and_then(|id| self.document.chats.get(id))
            .map(|chat| chat.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Start a new chat and make it current
    pub fn create_chat(&mut self) -> Result<String, ChatError> {
        self.create_chat_at(Local::now())
    }

    fn create_chat_at(&mut self, now: DateTime<Local>) -> Result<String, ChatError> {
        let mut next = self.document.clone();
        let id = stage_new_chat(&mut next, now)?;
        self.commit(next)?;

        info!("Created chat {}", id);
        Ok(id)
    }

    pub fn switch_chat(&mut self, id: &str) -> Result<(), ChatError> {
        if !self.document.chats.contains_key(id) {
            return Err(ChatError::NotFound(id.to_string()));
        }
        let mut next = self.document.clone();
        next.current_chat_id = Some(id.to_string());
        self.commit(next)
    }

    pub fn delete_chat(&mut self, id: &str) -> Result<(), ChatError> {
        let mut next = self.document.clone();
        if next.chats.remove(id).is_none() {
            return Err(ChatError::NotFound(id.to_string()));
        }
        if next.current_chat_id.as_deref() == Some(id) {
            next.current_chat_id = None;
        }
        self.commit(next)?;
        info!("Deleted chat {}", id);
        Ok(())
    }

    /// Append a user turn and the tutor's reply to the current chat.
    ///
    /// Starts a chat first when none is selected, so the exchange is never lost.
    pub fn record_exchange(&mut self, question: &str, reply: &str) -> Result<(), ChatError> {
        let mut next = self.document.clone();
        let id = match next.current_chat_id.clone() {
            Some(id) => id,
            None => stage_new_chat(&mut next, Local::now())?,
        };

        let chat = next
            .chats
            .get_mut(&id)
            .ok_or_else(|| ChatError::NotFound(id.clone()))?;
        chat.messages.push((Role::User, question.to_string()));
        chat.messages.push((Role::Tutor, reply.to_string()));

        self.commit(next)
    }

    /// Save `next` and adopt it; on failure the book keeps its last saved state
    fn commit(&mut self, next: ChatDocument) -> Result<(), ChatError> {
        self.store.save(&next)?;
        self.document = next;
        Ok(())
    }
}

/// Add an empty chat to `document` and make it current
fn stage_new_chat(document: &mut ChatDocument, now: DateTime<Local>) -> Result<String, ChatError> {
    if let Some(current) = document.current_chat_id.as_deref() {
        let is_empty = document
            .chats
            .get(current)
            .is_some_and(|chat| chat.messages.is_empty());
        if is_empty {
            return Err(ChatError::CurrentChatEmpty);
        }
    }

    let id = unique_id(document, now.format("%Y%m%d_%H%M%S").to_string());
    let name = format!("Chat {}", document.chats.len() + 1);

    document.chats.insert(
        id.clone(),
        ChatSession {
            name,
            messages: Vec::new(),
        },
    );
    document.current_chat_id = Some(id.clone());
    Ok(id)
}

/// Timestamp ids collide when two chats start within the same second
fn unique_id(document: &ChatDocument, base: String) -> String {
    if !document.chats.contains_key(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !document.chats.contains_key(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::JsonFileStore;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Wraps a file store; saves fail while `broken` is set
    struct FlakyStore {
        inner: JsonFileStore,
        broken: AtomicBool,
    }

    impl DocumentStore for FlakyStore {
        fn load(&self) -> Result<Option<ChatDocument>, StoreError> {
            self.inner.load()
        }

        fn save(&self, document: &ChatDocument) -> Result<(), StoreError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    path: self.inner.path().to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.save(document)
        }
    }

    fn open_in(dir: &TempDir) -> ChatBook {
        let store = Arc::new(JsonFileStore::new(dir.path().join("chat_history.json")));
        ChatBook::open(store).unwrap()
    }

    #[test]
    fn test_open_empty_store_creates_first_chat() {
        let dir = TempDir::new().unwrap();
        let book = open_in(&dir);

        assert_eq!(book.document().chats.len(), 1);
        let (id, chat) = book.chats().next().unwrap();
        assert_eq!(chat.name, "Chat 1");
        assert_eq!(book.current_id(), Some(id));
        assert!(book.current_messages().is_empty());
    }

    #[test]
    fn test_create_refused_while_current_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut book = open_in(&dir);

        assert!(matches!(book.create_chat(), Err(ChatError::CurrentChatEmpty)));
    }

    #[test]
    fn test_record_exchange_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut book = open_in(&dir);
        let id = book.current_id().unwrap().to_string();

        book.record_exchange("What is 'gracias'?", "It means 'thank you'.")
            .unwrap();
        book.record_exchange("And 'de nada'?", "You're welcome.").unwrap();
        let expected = book.current_messages().to_vec();

        let reopened = open_in(&dir);

        assert_eq!(reopened.current_id(), Some(id.as_str()));
        assert_eq!(reopened.current_messages(), expected.as_slice());
        assert_eq!(
            reopened.current_messages()[0],
            (Role::User, "What is 'gracias'?".to_string())
        );
        assert_eq!(reopened.current_messages()[3].0, Role::Tutor);
    }

    #[test]
    fn test_same_second_ids_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let mut book = open_in(&dir);
        let now = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();

        book.record_exchange("hi", "hello").unwrap();
        let first = book.create_chat_at(now).unwrap();
        book.record_exchange("hi", "hello").unwrap();
        let second = book.create_chat_at(now).unwrap();

        assert_eq!(first, "20240115_103000");
        assert_eq!(second, "20240115_103000_2");
        assert_eq!(book.document().chats[&second].name, "Chat 3");
    }

    #[test]
    fn test_switch_and_delete() {
        let dir = TempDir::new().unwrap();
        let mut book = open_in(&dir);
        let first = book.current_id().unwrap().to_string();
        book.record_exchange("hi", "hello").unwrap();
        let second = book
            .create_chat_at(Local.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
            .unwrap();

        book.switch_chat(&first).unwrap();
        assert_eq!(book.current_messages().len(), 2);

        book.delete_chat(&first).unwrap();
        assert_eq!(book.current_id(), None);
        assert!(book.current_messages().is_empty());
        assert_eq!(book.document().chats.len(), 1);
        assert!(book.document().chats.contains_key(&second));

        assert!(matches!(
            book.switch_chat(&first),
            Err(ChatError::NotFound(_))
        ));
        assert!(matches!(
            book.delete_chat("missing"),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn test_record_without_current_chat_starts_one() {
        let dir = TempDir::new().unwrap();
        let mut book = open_in(&dir);
        let first = book.current_id().unwrap().to_string();
        book.delete_chat(&first).unwrap();

        book.record_exchange("Bonjour?", "Bonjour !").unwrap();

        assert!(book.current_id().is_some());
        assert_eq!(book.current_messages().len(), 2);
    }

    #[test]
    fn test_open_clears_dangling_current_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat_history.json");
        std::fs::write(
            &path,
            r#"{"chats": {"a": {"name": "Chat 1", "messages": [["You", "hi"]]}}, "current_chat_id": "gone"}"#,
        )
        .unwrap();

        let book = ChatBook::open(Arc::new(JsonFileStore::new(&path))).unwrap();

        assert_eq!(book.current_id(), None);
        assert_eq!(book.document().chats.len(), 1);
    }

    #[test]
    fn test_failed_save_leaves_book_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore {
            inner: JsonFileStore::new(dir.path().join("chat_history.json")),
            broken: AtomicBool::new(false),
        });
        let mut book = ChatBook::open(store.clone()).unwrap();
        let first = book.current_id().unwrap().to_string();
        book.record_exchange("hi", "hello").unwrap();
        let second = book
            .create_chat_at(Local.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
            .unwrap();
        book.record_exchange("ciao", "ciao!").unwrap();
        let saved = book.document().clone();

        store.broken.store(true, Ordering::SeqCst);

        assert!(matches!(book.delete_chat(&first), Err(ChatError::Store(_))));
        assert!(matches!(book.switch_chat(&first), Err(ChatError::Store(_))));
        assert!(matches!(
            book.record_exchange("more?", "sure"),
            Err(ChatError::Store(_))
        ));
        assert!(matches!(book.create_chat(), Err(ChatError::Store(_))));
        assert_eq!(book.document(), &saved);
        assert_eq!(book.current_id(), Some(second.as_str()));

        // Nothing rejected earlier sneaks into the next successful save
        store.broken.store(false, Ordering::SeqCst);
        book.switch_chat(&first).unwrap();
        let reopened = open_in(&dir);
        assert_eq!(reopened.document().chats.len(), 2);
        assert_eq!(reopened.document().chats[&second].messages.len(), 2);
    }

    #[test]
    fn test_failed_save_without_current_chat_adds_no_chat() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore {
            inner: JsonFileStore::new(dir.path().join("chat_history.json")),
            broken: AtomicBool::new(false),
        });
        let mut book = ChatBook::open(store.clone()).unwrap();
        let first = book.current_id().unwrap().to_string();
        book.delete_chat(&first).unwrap();

        store.broken.store(true, Ordering::SeqCst);

        assert!(book.record_exchange("Bonjour?", "Bonjour !").is_err());
        assert_eq!(book.current_id(), None);
        assert!(book.document().chats.is_empty());
    }
}
