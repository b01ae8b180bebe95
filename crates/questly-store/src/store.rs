//! File-backed document store.

use questly_progression::{ChatMessage, TaskBoard, UserProfile, WeeklyHistory};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::document::QuestlyDocument;

/// Storage key of the current document format.
pub const STORAGE_KEY: &str = "questly_data_v8";

/// Errors that can occur while reading or writing the document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Invalid storage key.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Atomic write failed.
    #[error("Atomic write failed: {0}")]
    AtomicWriteFailed(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Whole-document store: one JSON file per storage key.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
    key: String,
}

impl DocumentStore {
    /// Store for `key` inside `dir`. Nothing is touched until the first read
    /// or write.
    pub fn open(dir: impl AsRef<Path>, key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();
        Self::validate_key(&key)?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            key,
        })
    }

    fn validate_key(key: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("Empty storage key".to_string()));
        }
        if let Some(c) = key
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(StoreError::InvalidKey(format!(
                "Invalid character '{c}' in key '{key}'"
            )));
        }
        Ok(())
    }

    /// Location of the document file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.tmp", self.key))
    }

    /// Whether a document has been written.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Read the document, writing an empty one first if none exists.
    pub fn load(&self) -> StoreResult<QuestlyDocument> {
        let path = self.path();
        if !path.exists() {
            info!("No saved data at {:?}, starting fresh", path);
            let doc = QuestlyDocument::default();
            self.save(&doc)?;
            return Ok(doc);
        }

        let reader = BufReader::new(File::open(&path)?);
        let doc: QuestlyDocument = serde_json::from_reader(reader)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        debug!("Loaded document from {:?}", path);
        Ok(doc.normalized())
    }

    /// Replace the document (temp file + rename).
    pub fn save(&self, doc: &QuestlyDocument) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let temp_path = self.temp_path();
        let final_path = self.path();

        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, doc)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::AtomicWriteFailed(e.to_string())
        })?;

        debug!("Saved document to {:?}", final_path);
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut QuestlyDocument)) -> StoreResult<()> {
        let mut doc = self.load()?;
        apply(&mut doc);
        self.save(&doc)
    }

    /// Replace the quest board.
    pub fn update_tasks(&self, tasks: TaskBoard) -> StoreResult<()> {
        self.update(|doc| doc.tasks = tasks)
    }

    /// Replace the profile.
    pub fn update_user(&self, user: UserProfile) -> StoreResult<()> {
        self.update(|doc| doc.user = user)
    }

    /// Replace the weekly history.
    pub fn update_history(&self, history: WeeklyHistory) -> StoreResult<()> {
        self.update(|doc| doc.history = history)
    }

    /// Replace the mentor conversation.
    pub fn update_chat_history(&self, chat_history: Vec<ChatMessage>) -> StoreResult<()> {
        self.update(|doc| doc.chat_history = chat_history)
    }

    /// Replace the timetable.
    pub fn update_timetable(&self, timetable: Vec<serde_json::Value>) -> StoreResult<()> {
        self.update(|doc| doc.timetable = timetable)
    }

    /// Forget everything. Succeeds when there is nothing to forget.
    pub fn logout(&self) -> StoreResult<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Removed saved data at {:?}", path);
        }
        Ok(())
    }
}
