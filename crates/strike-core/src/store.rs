//! In-memory [`AccountStore`] implementation.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::StoreError;
use crate::traits::AccountStore;
use crate::types::{AccountIdentity, AccountSnapshot};

/// In-memory account store for tests and single-process deployments.
///
/// Keeps snapshots in a `HashMap` with no durability. Not suitable for
/// production use (no crash recovery).
#[derive(Default)]
pub struct MemoryAccountStore {
    snapshots: RwLock<HashMap<AccountIdentity, AccountSnapshot>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Whether no snapshots are stored.
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

impl AccountStore for MemoryAccountStore {
    fn load(&self, identity: &AccountIdentity) -> Result<Option<AccountSnapshot>, StoreError> {
        Ok(self.snapshots.read().get(identity).cloned())
    }

    fn save(&self, snapshot: &AccountSnapshot) -> Result<(), StoreError> {
        trace!(account = %snapshot.identity, "memory_store: snapshot saved");
        self.snapshots
            .write()
            .insert(snapshot.identity.clone(), snapshot.clone());
        Ok(())
    }

    fn contains(&self, identity: &AccountIdentity) -> Result<bool, StoreError> {
        Ok(self.snapshots.read().contains_key(identity))
    }
}
