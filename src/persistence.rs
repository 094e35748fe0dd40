//! Durable slot for the active session id.
//!
//! The id is the only client state that survives a restart. Supports both
//! JSON (human-readable) and bincode (compact binary) files.

use crate::error::{RagEvalError, Result};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default filename for the session slot.
pub const DEFAULT_SESSION_FILENAME: &str = "session.json";

/// Save format for the session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
struct StoredSession {
    session_id: String,
}

/// File-backed key-value slot holding one session id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    format: SaveFormat,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SaveFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted id, `None` if nothing is stored.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read(&self.path).map_err(|e| RagEvalError::io(&self.path, e))?;

        let stored: StoredSession = match self.format {
            SaveFormat::Json => serde_json::from_slice(&data)
                .map_err(|e| RagEvalError::Serialization(e.to_string()))?,
            SaveFormat::Bincode => {
                let config = bincode::config::standard();
                let (stored, _): (StoredSession, usize) =
                    bincode::decode_from_slice(&data, config)
                        .map_err(|e| RagEvalError::Serialization(e.to_string()))?;
                stored
            }
        };

        Ok(Some(stored.session_id).filter(|id| !id.is_empty()))
    }

    /// Persist `session_id`, replacing whatever was stored.
    pub fn save(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| RagEvalError::io(parent, e))?;
            }
        }

        let stored = StoredSession {
            session_id: session_id.to_string(),
        };

        let data = match self.format {
            SaveFormat::Json => serde_json::to_string_pretty(&stored)
                .map_err(|e| RagEvalError::Serialization(e.to_string()))?
                .into_bytes(),
            SaveFormat::Bincode => {
                let config = bincode::config::standard();
                bincode::encode_to_vec(&stored, config)
                    .map_err(|e| RagEvalError::Serialization(e.to_string()))?
            }
        };

        fs::write(&self.path, &data).map_err(|e| RagEvalError::io(&self.path, e))?;
        debug!(path = %self.path.display(), session_id, "persisted session id");

        Ok(())
    }

    /// Forget the persisted id. Clearing an empty slot is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared persisted session id");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RagEvalError::io(&self.path, e)),
        }
    }

    /// Save `Some(id)` or clear on `None`, off the async runtime threads.
    pub async fn write_slot(&self, session_id: Option<String>) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || match session_id {
            Some(id) => store.save(&id),
            None => store.clear(),
        })
        .await
        .map_err(|e| RagEvalError::InvalidState(format!("session store task failed: {}", e)))?
    }
}
