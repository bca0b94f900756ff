use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use keyring::Entry;
use thiserror::Error;

/// Keychain service name under which all entries are filed
const SERVICE_NAME: &str = "smartportal";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Keys the session core persists. Each is an independent entry so a purge
/// of one never disturbs the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    InstallMarker,
    Email,
    Password,
    BiometricEnabled,
}

impl StoreKey {
    pub fn name(self) -> &'static str {
        match self {
            StoreKey::InstallMarker => "install_marker",
            StoreKey::Email => "email",
            StoreKey::Password => "password",
            StoreKey::BiometricEnabled => "biometric_enabled",
        }
    }
}

/// Durable key-value storage for identity data.
///
/// Reads and writes are atomic per key; absence is `Ok(None)`, never an
/// error. Removing a key that is not present succeeds.
pub trait SecureStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
    fn put(&self, key: StoreKey, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: StoreKey) -> Result<(), StoreError>;
}

/// OS keychain backend.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name (e.g. per-flavor builds).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: StoreKey) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key.name())?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureStore for KeyringStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend for tests and headless hosts.
///
/// Clones share the same underlying map, so a test can hand one clone to
/// the controller and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<&'static str, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        // A poisoned lock only means a panic elsewhere; the map itself is intact.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key.name()).cloned())
    }

    fn put(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.name(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<(), StoreError> {
        self.lock().remove(key.name());
        Ok(())
    }
}
