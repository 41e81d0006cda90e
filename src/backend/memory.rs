//! In-memory document backend
//!
//! This is primarily for development and testing.
//! For production, plug in a backend over a real document database.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

use super::traits::{BackendError, DeleteFilter, Document, DocumentBackend};

struct Inner {
    docs: Vec<Document>,
    last_error: Option<String>,
    // fault injection, consumed by the next operation
    fail_next: Option<String>,
    hide_next_find: bool,
}

/// In-memory document collection
///
/// Emulates the parts of a document database the session store relies on:
/// a unique index on the configured id field (a second insert with the same
/// id fails like a duplicate-key violation) and a last-error side channel
/// for rejected writes.
///
/// Warning: not suitable for production use. Documents are lost on restart
/// and are not shared across processes.
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
    unique_field: String,
}

impl MemoryBackend {
    /// Create a backend with a unique index on `sess_id`
    pub fn new() -> Self {
        Self::with_unique_field("sess_id")
    }

    /// Create a backend with a unique index on the given field
    pub fn with_unique_field<S: Into<String>>(field: S) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                docs: Vec::new(),
                last_error: None,
                fail_next: None,
                hide_next_find: false,
            })),
            unique_field: field.into(),
        }
    }

    /// Snapshot of every stored document, for inspection in tests
    pub fn documents(&self) -> Vec<Document> {
        self.inner.read().docs.clone()
    }

    /// Make the next write operation fail with the given backend message
    pub fn fail_next_write<S: Into<String>>(&self, message: S) {
        self.inner.write().fail_next = Some(message.into());
    }

    /// Make the next `find_one` report a miss even when the document exists.
    ///
    /// Simulates the window where another process inserts between a lookup
    /// and the follow-up insert, which is how the read-miss race manifests.
    pub fn hide_next_find(&self) {
        self.inner.write().hide_next_find = true;
    }

    fn matches(doc: &Document, field: &str, value: &str) -> bool {
        doc.get(field).and_then(Value::as_str) == Some(value)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryBackend {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            unique_field: self.unique_field.clone(),
        }
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn select_collection(
        &self,
        _database: &str,
        _collection: &str,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.write();
        if let Some(msg) = inner.fail_next.take() {
            return Err(BackendError(msg));
        }
        Ok(())
    }

    async fn find_one(&self, field: &str, value: &str) -> Result<Option<Document>, BackendError> {
        let mut inner = self.inner.write();
        if let Some(msg) = inner.fail_next.take() {
            return Err(BackendError(msg));
        }
        if inner.hide_next_find {
            inner.hide_next_find = false;
            return Ok(None);
        }
        Ok(inner
            .docs
            .iter()
            .find(|doc| Self::matches(doc, field, value))
            .cloned())
    }

    async fn insert_one(&self, doc: Document) -> bool {
        let mut inner = self.inner.write();
        if let Some(msg) = inner.fail_next.take() {
            inner.last_error = Some(msg);
            return false;
        }
        // unique index on the id field
        if let Some(key) = doc.get(&self.unique_field).and_then(Value::as_str) {
            if inner
                .docs
                .iter()
                .any(|existing| Self::matches(existing, &self.unique_field, key))
            {
                inner.last_error = Some(format!(
                    "duplicate key for {} '{}'",
                    self.unique_field, key
                ));
                return false;
            }
        }
        inner.docs.push(doc);
        inner.last_error = None;
        true
    }

    async fn replace_one(&self, field: &str, value: &str, doc: Document) -> bool {
        let mut inner = self.inner.write();
        if let Some(msg) = inner.fail_next.take() {
            inner.last_error = Some(msg);
            return false;
        }
        match inner
            .docs
            .iter_mut()
            .find(|existing| Self::matches(existing, field, value))
        {
            Some(existing) => *existing = doc,
            None => inner.docs.push(doc),
        }
        inner.last_error = None;
        true
    }

    async fn delete_many(&self, filter: DeleteFilter<'_>) -> bool {
        let mut inner = self.inner.write();
        if let Some(msg) = inner.fail_next.take() {
            inner.last_error = Some(msg);
            return false;
        }
        match filter {
            DeleteFilter::Eq { field, value } => {
                inner.docs.retain(|doc| !Self::matches(doc, field, value));
            }
            DeleteFilter::Below { field, cutoff } => {
                inner.docs.retain(|doc| {
                    doc.get(field)
                        .and_then(Value::as_i64)
                        .map(|ts| ts >= cutoff)
                        .unwrap_or(true)
                });
            }
        }
        inner.last_error = None;
        true
    }

    async fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }
}
