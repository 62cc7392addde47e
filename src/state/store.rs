//! Exception-state storage
//!
//! Provides the store trait the controller consumes plus an in-memory
//! implementation. Entries are single-use: a load removes the entry, so a
//! second load of the same reference yields `None`.

use super::types::{StateEntry, StateStoreError, StoredFailure};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Store for failure state captured across the identity-provider round trip.
///
/// References are minted by the store (`Uuid::new_v4`, unguessable) and
/// lookups are exact-key only.
#[async_trait]
pub trait ExceptionStateStore: Send + Sync {
    /// Persist a captured failure, returning the reference for it.
    async fn store(&self, failure: StoredFailure) -> Result<Uuid, StateStoreError>;

    /// Load and consume the failure stored under `reference`.
    ///
    /// `None` means the reference never existed, was already consumed, or
    /// expired; the caller decides whether that is fatal.
    async fn load(&self, reference: Uuid) -> Result<Option<StoredFailure>, StateStoreError>;

    /// Reclaim entries past their TTL. A successful login never consumes
    /// its placeholder, so completed flows leave entries behind until this
    /// runs.
    ///
    /// Returns the number of entries deleted.
    async fn cleanup_expired(&self) -> Result<u64, StateStoreError>;
}

/// In-memory exception-state store
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<HashMap<Uuid, StateEntry>>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExceptionStateStore for InMemoryStateStore {
    async fn store(&self, failure: StoredFailure) -> Result<Uuid, StateStoreError> {
        let entry = StateEntry::new(failure);
        let reference = entry.reference;
        let mut entries = self.entries.write().await;
        entries.insert(reference, entry);

        tracing::debug!(state_ref = %reference, "Stored exception state");

        Ok(reference)
    }

    async fn load(&self, reference: Uuid) -> Result<Option<StoredFailure>, StateStoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries.remove(&reference);

        match entry {
            Some(entry) if entry.is_expired() => {
                tracing::debug!(state_ref = %reference, "Exception state expired before load");
                Ok(None)
            }
            Some(entry) => {
                tracing::info!(state_ref = %reference, "Exception state consumed");
                Ok(Some(entry.failure))
            }
            None => Ok(None),
        }
    }

    async fn cleanup_expired(&self) -> Result<u64, StateStoreError> {
        let mut entries = self.entries.write().await;
        let before_count = entries.len();

        entries.retain(|_, entry| !entry.is_expired());

        let deleted = (before_count - entries.len()) as u64;

        if deleted > 0 {
            tracing::debug!(deleted = deleted, "Cleaned up expired exception state");
        }

        Ok(deleted)
    }
}
