use tracing::warn;

use super::backend::{SecureStore, StoreError, StoreKey};

/// Wire value persisted for an enabled biometric flag
const FLAG_TRUE: &str = "true";

/// A stored email/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Typed identity operations over a [`SecureStore`] backend.
pub struct CredentialStore<S> {
    backend: S,
}

impl<S: SecureStore> CredentialStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Load the stored credential pair. Returns `None` unless both halves
    /// are present.
    pub fn credentials(&self) -> Result<Option<Credentials>, StoreError> {
        let email = self.backend.get(StoreKey::Email)?;
        let password = self.backend.get(StoreKey::Password)?;
        match (email, password) {
            (Some(email), Some(password)) => Ok(Some(Credentials { email, password })),
            _ => Ok(None),
        }
    }

    /// Store the credential pair, keeping it all-or-nothing: if the second
    /// write fails the first is rolled back.
    pub fn store_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.backend.put(StoreKey::Email, &credentials.email)?;
        if let Err(e) = self.backend.put(StoreKey::Password, &credentials.password) {
            if let Err(rollback) = self.backend.remove(StoreKey::Email) {
                warn!(error = %rollback, "failed to roll back partial credential write");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove both halves of the credential pair.
    pub fn purge_credentials(&self) -> Result<(), StoreError> {
        self.backend.remove(StoreKey::Email)?;
        self.backend.remove(StoreKey::Password)?;
        Ok(())
    }

    pub fn install_marker(&self) -> Result<Option<String>, StoreError> {
        self.backend.get(StoreKey::InstallMarker)
    }

    pub fn set_install_marker(&self, marker: &str) -> Result<(), StoreError> {
        self.backend.put(StoreKey::InstallMarker, marker)
    }

    pub fn biometric_enabled(&self) -> Result<bool, StoreError> {
        Ok(self
            .backend
            .get(StoreKey::BiometricEnabled)?
            .as_deref()
            == Some(FLAG_TRUE))
    }

    pub fn set_biometric_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        if enabled {
            self.backend.put(StoreKey::BiometricEnabled, FLAG_TRUE)
        } else {
            self.backend.remove(StoreKey::BiometricEnabled)
        }
    }
}
