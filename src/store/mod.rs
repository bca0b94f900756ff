//! Secure persistence for identity data.
//!
//! This module provides:
//! - `SecureStore`: the key-value contract for durable identity storage
//! - `KeyringStore`: OS keychain backend via the `keyring` crate
//! - `MemoryStore`: in-memory backend for tests and headless hosts
//! - `CredentialStore`: typed operations (credentials, install marker,
//!   biometric flag) over any backend
//!
//! Every value is independently settable and removable; the session
//! controller relies on that to purge credentials without touching the
//! biometric preference and vice versa.

pub mod backend;
pub mod credentials;

pub use backend::{KeyringStore, MemoryStore, SecureStore, StoreError, StoreKey};
pub use credentials::{CredentialStore, Credentials};
