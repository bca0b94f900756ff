//! Core session and navigation engine for the Smart Imobiliário mobile client.
//!
//! This crate owns everything between "the user opened the app" and "the
//! embedded browser surface is showing the portal": reinstall detection,
//! credential restore from the OS keychain, biometric gating, login
//! submission, logout detection, connectivity handling, and the navigation
//! policy applied to every request the surface reports.
//!
//! The host shell (the mobile UI layer) renders whatever
//! [`SessionState`](session::SessionState) says, forwards surface and
//! connectivity events into [`SessionController`](session::SessionController)
//! one at a time, and drains the surface command channel. Platform
//! facilities the core cannot own are behind small seams: secure storage
//! ([`store::SecureStore`]), the biometric challenge
//! ([`biometrics::BiometricAuthenticator`]), and reachability
//! ([`connectivity::ConnectivityMonitor`], fed by the host).
//!
//! The device back button is the host's job, but the contract is fixed:
//! offer the press to the surface's own history first, and only handle it
//! in the shell when the surface reports it could not go back.

pub mod api;
pub mod biometrics;
pub mod config;
pub mod connectivity;
pub mod policy;
pub mod session;
pub mod store;

pub use api::{AuthError, PortalClient, RecoveryError};
pub use biometrics::{BiometricAuthenticator, BiometricCapability, BiometricGate, GateError};
pub use config::{Config, DeviceKind, Endpoints, InstallIdentity};
pub use connectivity::ConnectivityMonitor;
pub use policy::{NavigationDecision, NavigationPolicy};
pub use session::{
    LoginOptions, NavigationDirective, SessionController, SessionState, StartupOutcome,
    SurfaceCommand,
};
pub use store::{
    CredentialStore, Credentials, KeyringStore, MemoryStore, SecureStore, StoreError,
};
