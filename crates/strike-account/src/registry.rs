//! Concurrent registry of live accounts.
//!
//! Maps identities to [`SharedAccount`] handles, loading through an
//! [`AccountStore`] on first use. When to commit is up to the caller:
//! [`AccountRegistry::persist`] after each mutation, or
//! [`AccountRegistry::persist_all`] on a schedule.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use strike_core::error::{ConfigError, RegistryError, StoreError};
use strike_core::traits::AccountStore;
use strike_core::types::{AccountIdentity, StoredCredential, Timestamp};
use tracing::{debug, info};

use crate::account::AccountState;
use crate::config::AccountConfig;
use crate::shared::SharedAccount;

/// Live accounts keyed by identity, backed by a persistence collaborator.
pub struct AccountRegistry {
    config: AccountConfig,
    store: Arc<dyn AccountStore>,
    accounts: DashMap<AccountIdentity, Arc<SharedAccount>>,
}

impl AccountRegistry {
    /// Create an empty registry. New accounts use `config`.
    pub fn new(config: AccountConfig, store: Arc<dyn AccountStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            accounts: DashMap::new(),
        })
    }

    /// Configuration applied to accounts created through this registry.
    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Number of accounts currently held in memory.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether `identity` is held in memory (without consulting the store).
    pub fn is_loaded(&self, identity: &AccountIdentity) -> bool {
        self.accounts.contains_key(identity)
    }

    /// Create a new account at `now`, cache it and save its initial snapshot.
    ///
    /// The handle is published before the save so concurrent creators see
    /// [`RegistryError::AlreadyExists`]; the save runs under the account lock
    /// and outside any map shard lock.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyExists`] if the account is cached or stored
    /// - [`RegistryError::Config`] for an empty identity
    /// - [`RegistryError::Store`] if the store fails; the account is not cached
    pub fn create(
        &self,
        identity: impl Into<String>,
        credential: StoredCredential,
        now: Timestamp,
    ) -> Result<Arc<SharedAccount>, RegistryError> {
        let state = AccountState::initialize(identity, credential, &self.config, now)?;
        let identity = state.identity().clone();

        if self.accounts.contains_key(&identity) || self.store.contains(&identity)? {
            return Err(RegistryError::AlreadyExists(identity.to_string()));
        }

        let handle = Arc::new(SharedAccount::new(state));
        match self.accounts.entry(identity.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyExists(identity.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&handle));
            }
        }

        if let Err(e) = handle.with(|state| self.store.save(&state.snapshot())) {
            self.accounts.remove_if(&identity, |_, cached| Arc::ptr_eq(cached, &handle));
            return Err(e.into());
        }
        info!(account = %identity, "registry: account created");
        Ok(handle)
    }

    /// Handle for `identity`, loading it from the store if not cached.
    ///
    /// Returns `None` for accounts the store has never seen.
    pub fn get(&self, identity: &AccountIdentity) -> Result<Option<Arc<SharedAccount>>, RegistryError> {
        if let Some(handle) = self.accounts.get(identity) {
            return Ok(Some(Arc::clone(handle.value())));
        }

        let Some(snapshot) = self.store.load(identity)? else {
            return Ok(None);
        };
        let state = AccountState::restore(snapshot)?;

        // Another worker may have loaded the same account meanwhile; the
        // first handle inserted wins so both share one lock.
        let handle = Arc::clone(
            self.accounts
                .entry(identity.clone())
                .or_insert_with(|| Arc::new(SharedAccount::new(state)))
                .value(),
        );
        info!(account = %identity, "registry: account loaded");
        Ok(Some(handle))
    }

    /// Handle for `identity`, creating the account if it does not exist.
    pub fn get_or_create(
        &self,
        identity: impl Into<String>,
        credential: StoredCredential,
        now: Timestamp,
    ) -> Result<Arc<SharedAccount>, RegistryError> {
        let identity = AccountIdentity::new(identity)?;
        if let Some(handle) = self.get(&identity)? {
            return Ok(handle);
        }
        match self.create(identity.as_str(), credential, now) {
            Err(RegistryError::AlreadyExists(_)) => self
                .get(&identity)?
                .ok_or_else(|| RegistryError::AlreadyExists(identity.to_string())),
            other => other,
        }
    }

    /// Save the current snapshot of a cached account.
    ///
    /// Returns `false` if the account is not held in memory.
    pub fn persist(&self, identity: &AccountIdentity) -> Result<bool, RegistryError> {
        let Some(handle) = self.accounts.get(identity).map(|h| Arc::clone(h.value())) else {
            return Ok(false);
        };
        self.store.save(&handle.snapshot())?;
        debug!(account = %identity, "registry: account persisted");
        Ok(true)
    }

    /// Save every cached account. Returns how many were written.
    ///
    /// Stops at the first store error.
    pub fn persist_all(&self) -> Result<usize, RegistryError> {
        let handles: Vec<Arc<SharedAccount>> =
            self.accounts.iter().map(|h| Arc::clone(h.value())).collect();

        for handle in &handles {
            self.store.save(&handle.snapshot())?;
        }
        debug!(count = handles.len(), "registry: all accounts persisted");
        Ok(handles.len())
    }

    /// Persist an account and drop it from memory. The stored copy remains.
    ///
    /// The save runs under the account lock while the handle is still
    /// cached, so concurrent `get` calls share it until the saved state is
    /// in the store. If the save fails the account stays live.
    ///
    /// Handles obtained earlier stay usable, but changes made through them
    /// after this call are not persisted.
    pub fn unload(&self, identity: &AccountIdentity) -> Result<bool, RegistryError> {
        let Some(handle) = self.accounts.get(identity).map(|h| Arc::clone(h.value())) else {
            return Ok(false);
        };
        let removed = handle.with(|state| {
            self.store.save(&state.snapshot())?;
            Ok::<_, StoreError>(
                self.accounts
                    .remove_if(identity, |_, cached| Arc::ptr_eq(cached, &handle))
                    .is_some(),
            )
        })?;
        debug!(account = %identity, removed, "registry: account unloaded");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use strike_core::store::MemoryAccountStore;
    use strike_core::types::{AccountSnapshot, DeviceHash};

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn t(secs: u64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn id(s: &str) -> AccountIdentity {
        AccountIdentity::new(s).unwrap()
    }

    fn cred() -> StoredCredential {
        StoredCredential::new("opaque")
    }

    fn registry() -> (AccountRegistry, Arc<MemoryAccountStore>) {
        let store = Arc::new(MemoryAccountStore::new());
        let reg = AccountRegistry::new(AccountConfig::default(), store.clone()).unwrap();
        (reg, store)
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryAccountStore,
        failing: AtomicBool,
    }

    impl AccountStore for FlakyStore {
        fn load(&self, identity: &AccountIdentity) -> Result<Option<AccountSnapshot>, StoreError> {
            self.inner.load(identity)
        }

        fn save(&self, snapshot: &AccountSnapshot) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("unavailable".into()));
            }
            self.inner.save(snapshot)
        }
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = AccountConfig { device_capacity: 0, ..AccountConfig::default() };
        assert!(AccountRegistry::new(cfg, Arc::new(MemoryAccountStore::new())).is_err());
    }

    #[test]
    fn create_saves_and_caches() {
        let (reg, store) = registry();
        let handle = reg.create("alice", cred(), t(0)).unwrap();
        assert_eq!(handle.identity(), &id("alice"));
        assert!(reg.is_loaded(&id("alice")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_twice_fails() {
        let (reg, _) = registry();
        reg.create("alice", cred(), t(0)).unwrap();
        let err = reg.create("alice", cred(), t(1)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyExists("alice".into()));
    }

    #[test]
    fn create_fails_when_only_stored() {
        let (reg, _) = registry();
        reg.create("alice", cred(), t(0)).unwrap();
        reg.unload(&id("alice")).unwrap();
        assert!(matches!(
            reg.create("alice", cred(), t(1)),
            Err(RegistryError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_rejects_empty_identity() {
        let (reg, _) = registry();
        assert_eq!(
            reg.create("", cred(), t(0)).unwrap_err(),
            RegistryError::Config(ConfigError::EmptyIdentity)
        );
    }

    #[test]
    fn get_unknown_is_none() {
        let (reg, _) = registry();
        assert!(reg.get(&id("ghost")).unwrap().is_none());
    }

    #[test]
    fn get_returns_same_handle() {
        let (reg, _) = registry();
        let a = reg.create("alice", cred(), t(0)).unwrap();
        let b = reg.get(&id("alice")).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unload_then_get_restores_state() {
        let (reg, _) = registry();
        let handle = reg.create("alice", cred(), t(0)).unwrap();
        handle.record_successful_login(DeviceHash::from("d1"), t(5));
        handle.consume_credit(7.0, t(5)).unwrap();

        assert!(reg.unload(&id("alice")).unwrap());
        assert!(!reg.is_loaded(&id("alice")));

        let reloaded = reg.get(&id("alice")).unwrap().unwrap();
        assert!(reloaded.has_device_succeeded_before(&DeviceHash::from("d1")));
        assert_eq!(reloaded.credits_consumed(t(5)), 7.0);
    }

    #[test]
    fn persist_writes_latest_state() {
        let (reg, store) = registry();
        let handle = reg.create("alice", cred(), t(0)).unwrap();
        handle.consume_credit(3.0, t(1)).unwrap();

        assert!(reg.persist(&id("alice")).unwrap());
        let stored = store.load(&id("alice")).unwrap().unwrap();
        assert_eq!(stored.consumed_credit.last_value(), 3.0);

        assert!(!reg.persist(&id("nobody")).unwrap());
    }

    #[test]
    fn persist_all_counts_accounts() {
        let (reg, store) = registry();
        for name in ["a", "b", "c"] {
            reg.create(name, cred(), t(0)).unwrap();
        }
        assert_eq!(reg.persist_all().unwrap(), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let (reg, _) = registry();
        let a = reg.get_or_create("alice", cred(), t(0)).unwrap();
        let b = reg.get_or_create("alice", cred(), t(9)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn failed_unload_keeps_account_live() {
        let store = Arc::new(FlakyStore::default());
        let reg = AccountRegistry::new(AccountConfig::default(), store.clone()).unwrap();
        reg.create("alice", cred(), t(0)).unwrap();

        store.failing.store(true, Ordering::SeqCst);
        assert!(matches!(reg.unload(&id("alice")), Err(RegistryError::Store(_))));
        assert!(reg.is_loaded(&id("alice")));
    }

    #[test]
    fn failed_create_is_not_cached() {
        let store = Arc::new(FlakyStore::default());
        let reg = AccountRegistry::new(AccountConfig::default(), store.clone()).unwrap();
        store.failing.store(true, Ordering::SeqCst);

        assert!(matches!(reg.create("alice", cred(), t(0)), Err(RegistryError::Store(_))));
        assert!(!reg.is_loaded(&id("alice")));

        store.failing.store(false, Ordering::SeqCst);
        assert!(reg.create("alice", cred(), t(1)).is_ok());
    }

    #[test]
    fn unload_unknown_is_false() {
        let (reg, _) = registry();
        assert!(!reg.unload(&id("ghost")).unwrap());
    }
}
