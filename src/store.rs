//! Session record store
//!
//! Translates the session lifecycle verbs (open, close, read, write,
//! destroy, gc) into document-collection operations. Payloads are opaque:
//! whatever the framework serialized is stored and returned verbatim.

use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::{DeleteFilter, Document, DocumentBackend};
use crate::config::StoreConfig;
use crate::error::SessionError;

/// Document-backed session record store
///
/// One record per session id, shaped
/// `{ <id_field>: String, <data_field>: String, <time_field>: i64 }`,
/// with the time field set to the write time in epoch seconds on every
/// mutation. `open()` must succeed before any other operation.
///
/// # Example
///
/// ```rust,ignore
/// use mongo_session_store::{MemoryBackend, SessionRecordStore, StoreConfig};
///
/// let config = StoreConfig::new("app", "sessions");
/// let store = SessionRecordStore::new(MemoryBackend::new(), config)?;
/// store.open().await?;
/// store.write("sid", "payload").await?;
/// ```
pub struct SessionRecordStore<B: DocumentBackend> {
    backend: B,
    config: StoreConfig,
    opened: AtomicBool,
}

impl<B: DocumentBackend> SessionRecordStore<B> {
    /// Create a store over an already-connected backend handle.
    ///
    /// Validates the configuration once; missing database or collection
    /// names fail here, before the backend is touched.
    pub fn new(backend: B, config: StoreConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            opened: AtomicBool::new(false),
        })
    }

    /// The resolved configuration this store was built with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Acquire the target collection. Idempotent once open.
    pub async fn open(&self) -> Result<(), SessionError> {
        if self.opened.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.backend
            .select_collection(&self.config.database, &self.config.collection)
            .await
            .map_err(|e| {
                tracing::error!("failed to select session collection: {}", e);
                SessionError::Connectivity(e.to_string())
            })?;
        self.opened.store(true, Ordering::SeqCst);
        tracing::debug!(
            database = %self.config.database,
            collection = %self.config.collection,
            "session store opened"
        );
        Ok(())
    }

    /// Release the store. The backend connection's lifetime is managed
    /// externally, so this only drops the opened flag; it cannot fail.
    pub async fn close(&self) {
        self.opened.store(false, Ordering::SeqCst);
    }

    /// Fetch the payload stored under `id`.
    ///
    /// A miss creates an empty record (so a later `write` always targets a
    /// known key) and returns `""`. The lookup-then-insert pair is not
    /// atomic: if another process creates the record in between, the insert
    /// fails with a duplicate key and that failure is surfaced rather than
    /// swallowed.
    pub async fn read(&self, id: &str) -> Result<String, SessionError> {
        self.ensure_open()?;
        let found = self
            .backend
            .find_one(&self.config.id_field, id)
            .await
            .map_err(|e| SessionError::persistence(e.to_string(), id))?;

        match found {
            Some(doc) => Ok(doc
                .get(&self.config.data_field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()),
            None => {
                tracing::debug!(sid = %id, "session miss, creating empty record");
                if self.backend.insert_one(self.record(id, "")).await {
                    Ok(String::new())
                } else {
                    let detail = self.write_failure_detail("insert rejected").await;
                    tracing::error!(sid = %id, "failed to create session record: {}", detail);
                    Err(SessionError::persistence(detail, id))
                }
            }
        }
    }

    /// Upsert `{id, payload, now}` keyed by the session id field
    pub async fn write(&self, id: &str, payload: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let doc = self.record(id, payload);
        if self
            .backend
            .replace_one(&self.config.id_field, id, doc)
            .await
        {
            Ok(())
        } else {
            let detail = self.write_failure_detail("upsert rejected").await;
            tracing::error!(sid = %id, "failed to write session record: {}", detail);
            Err(SessionError::persistence(detail, id))
        }
    }

    /// Delete the record under `id`. Deleting a nonexistent record succeeds.
    pub async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let filter = DeleteFilter::Eq {
            field: &self.config.id_field,
            value: id,
        };
        if self.backend.delete_many(filter).await {
            tracing::debug!(sid = %id, "session record destroyed");
            Ok(())
        } else {
            let detail = self.write_failure_detail("delete rejected").await;
            tracing::error!(sid = %id, "failed to destroy session record: {}", detail);
            Err(SessionError::persistence(detail, id))
        }
    }

    /// Bulk-delete every record older than `lifetime_secs`
    /// (`timestamp + lifetime < now`). One backend round trip; on fault a
    /// partial deletion may have happened and the error is surfaced as-is.
    pub async fn gc(&self, lifetime_secs: i64) -> Result<(), SessionError> {
        self.ensure_open()?;
        let cutoff = Utc::now().timestamp() - lifetime_secs;
        let filter = DeleteFilter::Below {
            field: &self.config.time_field,
            cutoff,
        };
        if self.backend.delete_many(filter).await {
            tracing::debug!(cutoff, "expired session records collected");
            Ok(())
        } else {
            let detail = self.write_failure_detail("bulk delete rejected").await;
            tracing::error!("session gc failed: {}", detail);
            Err(SessionError::persistence_bulk(detail))
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.opened.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SessionError::Connectivity(
                "store has not been opened".to_string(),
            ))
        }
    }

    /// Build a session record document with the write time set to now
    fn record(&self, id: &str, payload: &str) -> Document {
        let mut doc = Document::new();
        doc.insert(self.config.id_field.clone(), Value::from(id));
        doc.insert(self.config.data_field.clone(), Value::from(payload));
        doc.insert(
            self.config.time_field.clone(),
            Value::from(Utc::now().timestamp()),
        );
        doc
    }

    /// A rejected write must never be reported without the backend's detail
    async fn write_failure_detail(&self, fallback: &str) -> String {
        self.backend
            .last_error()
            .await
            .unwrap_or_else(|| fallback.to_string())
    }
}
