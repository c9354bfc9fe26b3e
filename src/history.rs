use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ChatMessage, Role};

pub const MAX_CHATS: usize = 20;
const TITLE_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    pub history: Vec<ChatMessage>,
    /// Unix milliseconds of the last save.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub timestamp: i64,
}

/// Saved conversations, newest first, mirrored to a single JSON file.
pub struct ChatStore {
    path: PathBuf,
    chats: Mutex<Vec<ChatRecord>>,
}

impl ChatStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let chats = if path.exists() {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("reading chat store {}", path.display()))?;
            match serde_json::from_str::<Vec<ChatRecord>>(&data) {
                Ok(chats) => chats,
                Err(e) => {
                    warn!("Chat store {} is unreadable, starting empty: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        info!("Loaded {} saved chat(s) from {}", chats.len(), path.display());
        Ok(Self {
            path,
            chats: Mutex::new(chats),
        })
    }

    pub fn list(&self) -> Result<Vec<ChatSummary>> {
        Ok(self
            .lock()?
            .iter()
            .map(|chat| ChatSummary {
                id: chat.id.clone(),
                title: chat.title.clone(),
                timestamp: chat.timestamp,
            })
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<ChatRecord>> {
        Ok(self.lock()?.iter().find(|chat| chat.id == id).cloned())
    }

    /// Inserts or replaces a chat and moves it to the front. Only the
    /// `MAX_CHATS` most recent survive.
    pub fn save(&self, id: Option<&str>, history: Vec<ChatMessage>) -> Result<ChatRecord> {
        let record = ChatRecord {
            id: id.map(str::to_string).unwrap_or_else(new_chat_id),
            title: derive_title(&history),
            history,
            timestamp: Utc::now().timestamp_millis(),
        };

        let mut chats = self.lock()?;
        let mut next: Vec<ChatRecord> = chats
            .iter()
            .filter(|chat| chat.id != record.id)
            .cloned()
            .collect();
        next.insert(0, record.clone());
        next.truncate(MAX_CHATS);
        persist(&self.path, &next)?;
        *chats = next;
        Ok(record)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut chats = self.lock()?;
        if !chats.iter().any(|chat| chat.id == id) {
            return Ok(false);
        }
        let next: Vec<ChatRecord> = chats.iter().filter(|chat| chat.id != id).cloned().collect();
        persist(&self.path, &next)?;
        *chats = next;
        Ok(true)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChatRecord>>> {
        self.chats
            .lock()
            .map_err(|e| anyhow!("chat store lock poisoned: {}", e))
    }
}

/// Writes beside the target and renames over it, so a reader never sees a
/// half-written store.
fn persist(path: &Path, chats: &[ChatRecord]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(chats)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replacing chat store {}", path.display()))?;
    Ok(())
}

fn new_chat_id() -> String {
    format!("chat_{}", Uuid::new_v4().simple())
}

/// The first user message, cut to 40 characters.
pub fn derive_title(history: &[ChatMessage]) -> String {
    match history.iter().find(|m| m.role == Role::User) {
        Some(message) => {
            let text = message.content.text();
            if text.chars().count() > TITLE_CHARS {
                format!("{}...", text.chars().take(TITLE_CHARS).collect::<String>())
            } else {
                text
            }
        }
        None => "New Chat".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ChatStore {
        ChatStore::open(dir.path().join("data").join("rico-chats.json")).expect("store opens")
    }

    #[test]
    fn title_comes_from_first_user_message() {
        let history = vec![
            ChatMessage::system("be nice"),
            ChatMessage::user("What's the weather?"),
            ChatMessage::user("ignored"),
        ];
        assert_eq!(derive_title(&history), "What's the weather?");
    }

    #[test]
    fn long_titles_are_truncated() {
        let long = "x".repeat(41);
        assert_eq!(derive_title(&[ChatMessage::user(long)]), format!("{}...", "x".repeat(40)));

        let exact = "é".repeat(40);
        assert_eq!(derive_title(&[ChatMessage::user(exact.clone())]), exact);
    }

    #[test]
    fn title_defaults_without_user_message() {
        assert_eq!(derive_title(&[ChatMessage::assistant("hi")]), "New Chat");
    }

    #[test]
    fn save_assigns_id_and_round_trips_through_disk() {
        let dir = TempDir::new().expect("tempdir");
        let saved = store(&dir)
            .save(None, vec![ChatMessage::user("hello"), ChatMessage::assistant("hi!")])
            .expect("saved");

        assert!(saved.id.starts_with("chat_"));
        assert_eq!(saved.title, "hello");

        let reopened = store(&dir);
        assert_eq!(reopened.get(&saved.id).expect("readable"), Some(saved));
    }

    #[test]
    fn resaving_moves_chat_to_front_without_duplicating() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        let first = store.save(None, vec![ChatMessage::user("first")]).expect("saved");
        store.save(None, vec![ChatMessage::user("second")]).expect("saved");

        let history = vec![ChatMessage::user("first"), ChatMessage::assistant("more")];
        store.save(Some(first.id.as_str()), history).expect("saved");

        let titles: Vec<String> = store
            .list()
            .expect("listed")
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, ["first", "second"]);
        assert_eq!(store.get(&first.id).expect("readable").expect("present").history.len(), 2);
    }

    #[test]
    fn keeps_only_the_most_recent_chats() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        for i in 0..(MAX_CHATS + 5) {
            let id = format!("chat_{}", i);
            let history = vec![ChatMessage::user(format!("message {}", i))];
            store.save(Some(id.as_str()), history).expect("saved");
        }

        let chats = store.list().expect("listed");
        assert_eq!(chats.len(), MAX_CHATS);
        assert_eq!(chats[0].id, format!("chat_{}", MAX_CHATS + 4));
        assert!(store.get("chat_0").expect("readable").is_none());
    }

    #[test]
    fn delete_reports_whether_chat_existed() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        let saved = store.save(None, vec![ChatMessage::user("bye")]).expect("saved");

        assert!(store.delete(&saved.id).expect("deleted"));
        assert!(!store.delete(&saved.id).expect("no-op"));
        assert!(store.list().expect("listed").is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rico-chats.json");
        fs::write(&path, "{not json").expect("written");

        let store = ChatStore::open(&path).expect("store opens");

        assert!(store.list().expect("listed").is_empty());
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("rico-chats.json");
        let store = ChatStore::open(&path).expect("store opens");
        let kept = store.save(None, vec![ChatMessage::user("kept")]).expect("saved");

        // A directory where the temp file should go makes every write fail.
        fs::create_dir(path.with_extension("json.tmp")).expect("blocker created");

        assert!(store.save(None, vec![ChatMessage::user("lost?")]).is_err());
        assert!(store.delete(&kept.id).is_err());

        let titles: Vec<String> = store
            .list()
            .expect("listed")
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, ["kept"]);
        assert_eq!(ChatStore::open(&path).expect("reopens").list().expect("listed").len(), 1);
    }

    #[test]
    fn unwritable_parent_rejects_save_without_keeping_it() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").expect("blocker created");
        let store = ChatStore::open(blocker.join("rico-chats.json")).expect("store opens");

        assert!(store.save(None, vec![ChatMessage::user("lost?")]).is_err());
        assert!(store.list().expect("listed").is_empty());
    }
}
