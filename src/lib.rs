//! # mongo-session-store
//!
//! Document-database session persistence for web frameworks that would
//! otherwise keep sessions in files.
//!
//! Each session is one record in a document collection: an opaque payload
//! plus a last-write timestamp, keyed by the session identifier. The store
//! exposes the conventional handler verbs (open, close, read, write,
//! destroy, gc), and a coordinator on top implements session id
//! regeneration with payload migration.
//!
//! ## Features
//!
//! - **Create-on-miss reads**: reading an unseen id creates an empty record
//! - **Idempotent upserts**: writes fully replace data and timestamp, one record per id
//! - **Age-based garbage collection**: one bulk delete against the timestamp field
//! - **Id regeneration**: payload migrated to a freshly issued id, at most once per session
//! - **Pluggable backends**: any collection handle implementing [`DocumentBackend`]
//! - **Configurable document shape**: the three field names are settings, not schema
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mongo_session_store::{MemoryBackend, SessionRecordStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::new("app", "sessions");
//!     let store = SessionRecordStore::new(MemoryBackend::new(), config)?;
//!
//!     store.open().await?;
//!     let payload = store.read("session-id").await?; // "" on first sight
//!     store.write("session-id", "serialized state").await?;
//!     store.gc(86400).await?; // drop records older than a day
//!     Ok(())
//! }
//! ```
//!
//! Errors never degrade silently: a rejected backend write always surfaces
//! as [`SessionError::Persistence`] carrying the backend's own detail
//! message, so the host can fail the in-flight request instead of limping
//! on without a session.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod store;

pub use backend::{BackendError, DeleteFilter, Document, DocumentBackend, MemoryBackend};
pub use config::StoreConfig;
pub use coordinator::{IdIssuer, SessionLifecycleCoordinator, UuidIssuer};
pub use error::SessionError;
pub use store::SessionRecordStore;
