//! Session identifier regeneration
//!
//! Regeneration mitigates session fixation: the host issues a fresh
//! identifier and the payload living under the old identifier is migrated
//! to a record under the new one. At most one regeneration is allowed per
//! session.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::DocumentBackend;
use crate::error::SessionError;
use crate::store::SessionRecordStore;

/// Host-side collaborator that issues session identifiers
///
/// The issuer owns the host's notion of the current identifier. When
/// `destroy_old` is true it may additionally drop whatever association it
/// keeps under the old id; the coordinator itself never deletes the old
/// record either way.
#[async_trait]
pub trait IdIssuer: Send + Sync + 'static {
    async fn issue(&self, current_id: &str, destroy_old: bool) -> Result<String, SessionError>;
}

/// Default issuer generating UUID v4 identifiers
///
/// Stateless, so `destroy_old` has nothing to act on and is ignored.
pub struct UuidIssuer;

#[async_trait]
impl IdIssuer for UuidIssuer {
    async fn issue(&self, _current_id: &str, _destroy_old: bool) -> Result<String, SessionError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Orchestrates identifier regeneration above the record store
///
/// One coordinator is created per loaded session, so the one-shot
/// regeneration guard is per-session state rather than anything
/// process-wide.
pub struct SessionLifecycleCoordinator<B: DocumentBackend, I: IdIssuer> {
    store: Arc<SessionRecordStore<B>>,
    issuer: I,
    current_id: RwLock<String>,
    regenerated: AtomicBool,
}

impl<B: DocumentBackend, I: IdIssuer> SessionLifecycleCoordinator<B, I> {
    /// Create a coordinator for the session currently known as `current_id`
    pub fn new<S: Into<String>>(
        store: Arc<SessionRecordStore<B>>,
        issuer: I,
        current_id: S,
    ) -> Self {
        Self {
            store,
            issuer,
            current_id: RwLock::new(current_id.into()),
            regenerated: AtomicBool::new(false),
        }
    }

    /// The identifier the session is currently stored under
    pub fn current_id(&self) -> String {
        self.current_id.read().clone()
    }

    /// Whether this session has already been regenerated
    pub fn has_regenerated(&self) -> bool {
        self.regenerated.load(Ordering::SeqCst)
    }

    /// Move this session's payload under a freshly issued identifier.
    ///
    /// Returns the new identifier, or `None` when the session was already
    /// regenerated once and the call is a no-op. `destroy_old` is passed
    /// through to the issuer, which owns any cleanup of the old identifier;
    /// the record under the old id is left in place here.
    pub async fn regenerate(&self, destroy_old: bool) -> Result<Option<String>, SessionError> {
        if self.regenerated.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let current_id = self.current_id();
        let new_id = self.issuer.issue(&current_id, destroy_old).await?;
        tracing::debug!(old = %current_id, new = %new_id, "regenerating session id");

        // force-create the record under the new id, then migrate the payload
        self.store.read(&new_id).await?;
        let payload = self.store.read(&current_id).await?;
        self.store.write(&new_id, &payload).await?;

        self.regenerated.store(true, Ordering::SeqCst);
        *self.current_id.write() = new_id.clone();
        Ok(Some(new_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::StoreConfig;
    use parking_lot::Mutex;

    /// Issuer handing out predetermined ids and recording each call
    struct ScriptedIssuer {
        ids: Mutex<Vec<String>>,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedIssuer {
        fn new(ids: &[&str]) -> Self {
            Self {
                ids: Mutex::new(ids.iter().rev().map(|s| s.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IdIssuer for ScriptedIssuer {
        async fn issue(&self, current_id: &str, destroy_old: bool) -> Result<String, SessionError> {
            self.calls
                .lock()
                .push((current_id.to_string(), destroy_old));
            Ok(self.ids.lock().pop().expect("issuer exhausted"))
        }
    }

    async fn open_store() -> (MemoryBackend, Arc<SessionRecordStore<MemoryBackend>>) {
        let backend = MemoryBackend::new();
        let store =
            SessionRecordStore::new(backend.clone(), StoreConfig::new("app", "sessions")).unwrap();
        store.open().await.unwrap();
        (backend, Arc::new(store))
    }

    #[tokio::test]
    async fn test_regenerate_migrates_payload() {
        let (backend, store) = open_store().await;
        store.write("old-id", "X").await.unwrap();

        let coordinator =
            SessionLifecycleCoordinator::new(store.clone(), ScriptedIssuer::new(&["new-id"]), "old-id");
        let new_id = coordinator.regenerate(false).await.unwrap().unwrap();

        assert_eq!(new_id, "new-id");
        assert_eq!(coordinator.current_id(), "new-id");
        assert_eq!(store.read("new-id").await.unwrap(), "X");
        // the old record is left for the issuer/host to clean up
        assert_eq!(store.read("old-id").await.unwrap(), "X");
        assert_eq!(backend.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_regenerate_is_one_shot() {
        let (_, store) = open_store().await;
        store.write("old-id", "X").await.unwrap();

        let issuer = ScriptedIssuer::new(&["second-id", "third-id"]);
        let coordinator = SessionLifecycleCoordinator::new(store.clone(), issuer, "old-id");

        assert!(coordinator.regenerate(false).await.unwrap().is_some());
        assert!(coordinator.has_regenerated());
        assert_eq!(coordinator.regenerate(true).await.unwrap(), None);
        // only the first call reached the issuer
        assert_eq!(coordinator.issuer.calls.lock().len(), 1);
        assert_eq!(coordinator.current_id(), "second-id");
        assert_eq!(store.read("second-id").await.unwrap(), "X");
    }

    #[tokio::test]
    async fn test_destroy_old_is_delegated_to_issuer() {
        let (_, store) = open_store().await;
        store.write("old-id", "X").await.unwrap();

        let issuer = ScriptedIssuer::new(&["new-id"]);
        let coordinator = SessionLifecycleCoordinator::new(store.clone(), issuer, "old-id");
        coordinator.regenerate(true).await.unwrap();

        assert_eq!(
            coordinator.issuer.calls.lock().as_slice(),
            &[("old-id".to_string(), true)]
        );
        // this component never deletes the old record itself
        assert_eq!(store.read("old-id").await.unwrap(), "X");
    }

    #[tokio::test]
    async fn test_regenerate_of_unseen_session_migrates_empty_payload() {
        let (_, store) = open_store().await;

        let coordinator = SessionLifecycleCoordinator::new(
            store.clone(),
            ScriptedIssuer::new(&["new-id"]),
            "never-written",
        );
        coordinator.regenerate(false).await.unwrap();
        assert_eq!(store.read("new-id").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_write_failure_propagates_and_leaves_flag_unset() {
        let (backend, store) = open_store().await;
        store.write("old-id", "X").await.unwrap();

        let issuer = ScriptedIssuer::new(&["new-id", "retry-id"]);
        let coordinator = SessionLifecycleCoordinator::new(store.clone(), issuer, "old-id");

        // the injected fault fires on the first write of the protocol,
        // the creating insert inside read(new-id)
        backend.fail_next_write("not master");
        let err = coordinator.regenerate(false).await.err().unwrap();
        assert!(matches!(err, SessionError::Persistence { .. }));
        assert!(!coordinator.has_regenerated());
        assert_eq!(coordinator.current_id(), "old-id");

        // a later attempt may run again since the flag was never set
        assert!(coordinator.regenerate(false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_uuid_issuer_generates_distinct_ids() {
        let issuer = UuidIssuer;
        let a = issuer.issue("current", false).await.unwrap();
        let b = issuer.issue("current", true).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
