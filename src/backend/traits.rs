//! Document backend trait

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// A schemaless document as stored in the backend collection.
///
/// Field names are configuration, not schema, so records travel as plain
/// JSON maps rather than a typed struct.
pub type Document = Map<String, Value>;

/// Error reported by a backend query (connection lost, collection
/// unselectable, malformed cursor). Write rejections are reported through
/// acknowledgement + [`DocumentBackend::last_error`] instead.
#[derive(Debug, Clone)]
pub struct BackendError(pub String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BackendError {}

/// Delete predicates the session store needs
#[derive(Debug, Clone)]
pub enum DeleteFilter<'a> {
    /// Every document whose `field` equals `value`
    Eq { field: &'a str, value: &'a str },
    /// Every document whose integer `field` is strictly below `cutoff`
    Below { field: &'a str, cutoff: i64 },
}

/// Trait for document collection backends
///
/// This is the already-connected, already-authenticated handle the store
/// operates on. Only four primitives are required: find-one-by-field,
/// insert-one, replace-one (upsert), and delete-many-by-predicate.
///
/// Write operations return an acknowledgement `bool` rather than an error:
/// when a write comes back `false`, the cause must be retrievable from
/// [`last_error`](DocumentBackend::last_error) until the next write. A
/// backend must never acknowledge a write it rejected.
#[async_trait]
pub trait DocumentBackend: Send + Sync + 'static {
    /// Select the target collection, verifying the backend is reachable
    async fn select_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<(), BackendError>;

    /// Find at most one document whose `field` equals `value`
    async fn find_one(&self, field: &str, value: &str) -> Result<Option<Document>, BackendError>;

    /// Insert a new document. Fails (returns `false`) on a unique-key
    /// conflict or any write rejection.
    async fn insert_one(&self, doc: Document) -> bool;

    /// Replace the document whose `field` equals `value` with `doc`,
    /// inserting `doc` if no such document exists
    async fn replace_one(&self, field: &str, value: &str, doc: Document) -> bool;

    /// Delete every document matching `filter`. Deleting nothing is still
    /// a successful delete.
    async fn delete_many(&self, filter: DeleteFilter<'_>) -> bool;

    /// Detail for the most recent rejected write, if any
    async fn last_error(&self) -> Option<String>;
}
