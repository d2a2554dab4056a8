//! Per-conversation message history persistence.
//!
//! A [`ConversationStore`] owns one conversation's messages in memory and
//! mirrors them to a file, one JSON object per line (the preferred format),
//! falling back to reading a single legacy JSON array. Resolving the actual
//! path (user config directory, title sanitization) is an external
//! collaborator's job; this crate only knows the path it is given.
#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use gllm_types::{ContentBlock, Message, Role, StorageError};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Above this many bytes, a Gemini tool-result payload is stripped to `{}`
/// on save to keep transcripts small.
const GEMINI_LARGE_RESULT_THRESHOLD: usize = 4096;

/// Which provider family's on-disk quirks to apply when saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// No family-specific rewriting.
    Generic,
    /// Strip large function-response payloads and drop empty model messages.
    Gemini,
}

/// Owns one conversation's in-memory message list and its on-disk mirror.
pub struct ConversationStore {
    path: PathBuf,
    dialect: Dialect,
    messages: RwLock<Vec<Message>>,
}

impl ConversationStore {
    /// Create a store for the conversation file at `path`. Does not touch
    /// the filesystem; call [`load`](Self::load) to populate from disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self { path: path.into(), dialect, messages: RwLock::new(Vec::new()) }
    }

    /// Load messages from disk, replacing the in-memory list.
    ///
    /// Accepts either one JSON object per line or a single legacy JSON
    /// array. A message with no role-appropriate content is rejected with
    /// [`StorageError::MalformedMessage`].
    pub async fn load(&self) -> Result<(), StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *self.messages.write().await = Vec::new();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let messages = parse_conversation(&raw)?;
        *self.messages.write().await = messages;
        Ok(())
    }

    /// Append a message to the conversation and persist it.
    pub async fn append(&self, message: Message) -> Result<(), StorageError> {
        self.messages.write().await.push(message);
        self.save().await
    }

    /// Replace the entire message list and persist it.
    pub async fn set_messages(&self, messages: Vec<Message>) -> Result<(), StorageError> {
        *self.messages.write().await = messages;
        self.save().await
    }

    /// A clone of the current in-memory message list.
    pub async fn get_messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Write the current in-memory message list to disk, one compact JSON
    /// object per line, applying family-specific save rewriting.
    pub async fn save(&self) -> Result<(), StorageError> {
        let messages = self.messages.read().await;
        let rendered = render_for_save(&messages, self.dialect);
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut buffer = String::new();
        for message in &rendered {
            buffer.push_str(&serde_json::to_string(message)?);
            buffer.push('\n');
        }
        let mut file = tokio::fs::File::create(&self.path).await?;
        file.write_all(buffer.as_bytes()).await?;
        Ok(())
    }

    /// Clear the in-memory list and persist the (now empty) conversation.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.messages.write().await.clear();
        self.save().await
    }

    /// Path this store reads from and writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse either format: one JSON object per line, or a single JSON array.
fn parse_conversation(raw: &str) -> Result<Vec<Message>, StorageError> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        let messages: Vec<Message> = serde_json::from_str(trimmed)?;
        for (i, message) in messages.iter().enumerate() {
            validate_message(i, message)?;
        }
        return Ok(messages);
    }
    let mut messages = Vec::new();
    for (i, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(line)?;
        validate_message(i, &message)?;
        messages.push(message);
    }
    Ok(messages)
}

fn validate_message(line: usize, message: &Message) -> Result<(), StorageError> {
    if message.content.is_empty() {
        return Err(StorageError::MalformedMessage(line, "message has no content blocks".into()));
    }
    Ok(())
}

/// Build the on-disk representation of `messages`, applying the dialect's
/// rewriting rules. The in-memory list itself is never mutated by this.
fn render_for_save(messages: &[Message], dialect: Dialect) -> Vec<Message> {
    if dialect != Dialect::Gemini {
        return messages.to_vec();
    }
    messages
        .iter()
        .filter(|m| !(m.role == Role::Assistant && m.content.is_empty()))
        .cloned()
        .map(|mut message| {
            for block in &mut message.content {
                if let ContentBlock::ToolResult { content, is_error, .. } = block {
                    if !*is_error && content.len() > GEMINI_LARGE_RESULT_THRESHOLD {
                        *content = "{}".to_string();
                    }
                }
            }
            message
        })
        .collect()
}
