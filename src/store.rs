// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Persistence for the submission timestamp log.
//!
//! The log is an ordered sequence of Unix millisecond timestamps kept under a
//! single key. [`JsonFileStore`] lays the data out the way browser local
//! storage does: one document mapping keys to values, so other keys written by
//! a front end sharing the file survive a rewrite.
//!
//! Neither store guards against two processes racing on the same key. Within
//! one process callers are expected to serialize submissions.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a [`TimestampStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value under {key:?} is not a timestamp list: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Read/write access to one ordered timestamp log.
pub trait TimestampStore: Send + Sync {
    /// Read the stored log. A key that was never written yields an empty log.
    fn read(&self) -> Result<Vec<i64>, StoreError>;

    /// Replace the stored log.
    fn write(&self, log: &[i64]) -> Result<(), StoreError>;
}

impl<S: TimestampStore + ?Sized> TimestampStore for std::sync::Arc<S> {
    fn read(&self) -> Result<Vec<i64>, StoreError> {
        (**self).read()
    }

    fn write(&self, log: &[i64]) -> Result<(), StoreError> {
        (**self).write(log)
    }
}

/// Process-local store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    log: Mutex<Vec<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `log`.
    pub fn with_log(log: Vec<i64>) -> Self {
        Self {
            log: Mutex::new(log),
        }
    }
}

impl TimestampStore for MemoryStore {
    fn read(&self) -> Result<Vec<i64>, StoreError> {
        let log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        Ok(log.clone())
    }

    fn write(&self, log: &[i64]) -> Result<(), StoreError> {
        let mut stored = self.log.lock().unwrap_or_else(|e| e.into_inner());
        *stored = log.to_vec();
        Ok(())
    }
}

/// Store backed by a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    key: String,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            key: self.key.clone(),
            reason: reason.into(),
        }
    }

    /// Load the whole document. A missing file is an empty document.
    fn load_document(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(self.corrupt("document is not a JSON object")),
            Err(e) => Err(self.corrupt(e.to_string())),
        }
    }
}

impl TimestampStore for JsonFileStore {
    fn read(&self) -> Result<Vec<i64>, StoreError> {
        let document = self.load_document()?;
        let Some(value) = document.get(&self.key) else {
            return Ok(Vec::new());
        };

        // Values are written as JSON-encoded strings, as local storage holds
        // them; bare arrays are accepted too.
        let decoded = match value {
            Value::String(encoded) => serde_json::from_str::<Vec<i64>>(encoded),
            other => serde_json::from_value::<Vec<i64>>(other.clone()),
        };
        decoded.map_err(|e| self.corrupt(e.to_string()))
    }

    fn write(&self, log: &[i64]) -> Result<(), StoreError> {
        // A corrupt document is replaced rather than blocking every submission.
        let mut document = match self.load_document() {
            Ok(document) => document,
            Err(StoreError::Corrupt { .. }) => Map::new(),
            Err(e) => return Err(e),
        };
        let encoded_log = serde_json::to_string(log).map_err(|e| self.corrupt(e.to_string()))?;
        document.insert(self.key.clone(), Value::String(encoded_log));

        let encoded = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| self.corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, encoded).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), key = %self.key, entries = log.len(), "Timestamp log persisted");
        Ok(())
    }
}
