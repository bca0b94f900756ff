//! Session state machine and orchestration.
//!
//! `SessionController` owns the single `SessionState` value the host shell
//! renders from, and every transition into it: install-reset detection,
//! credential restore, biometric gating, login submission, logout detection,
//! and connectivity handling. Events from the embedded surface and the
//! connectivity monitor are fed in one at a time; each is handled to
//! completion before the next, so no transition ever races another.
//!
//! Instructions for the embedded surface (load, reload, open externally)
//! leave through an mpsc channel the host drains.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{AuthError, PortalClient, RecoveryError};
use crate::biometrics::{BiometricAuthenticator, BiometricGate, GateError};
use crate::config::Config;
use crate::policy::{NavigationDecision, NavigationPolicy};
use crate::store::{CredentialStore, Credentials, SecureStore, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the surface command channel.
/// The controller emits at most one command per handled event; 16 leaves
/// headroom for a slow host.
const SURFACE_CHANNEL_SIZE: usize = 16;

/// Window inside which repeated logout navigation events for the same URL
/// are treated as one. Embedded surfaces commonly report the same
/// navigation two or three times within a few hundred milliseconds.
const LOGOUT_DEDUPE_WINDOW: Duration = Duration::from_secs(2);

// ============================================================================
// State Types
// ============================================================================

/// The single source of truth for what the host renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SessionState {
    /// No network; overrides everything else
    Disconnected,
    /// Login form (or recovery entry point)
    Unauthenticated,
    /// A login attempt is in flight
    Authenticating,
    /// Embedded surface is live on `active_url`
    Authenticated { active_url: String },
    /// Password-recovery form
    RecoveryFlow,
}

/// Instruction for the embedded browser surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum SurfaceCommand {
    /// Load the given URL in the surface
    Load(String),
    /// Reload the surface's current URL
    Reload,
    /// Open the URL through the platform's generic URL facility
    OpenExternal(String),
}

/// Caller choices for a login attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginOptions {
    /// Persist credentials for silent future logins ("stay logged in")
    pub persist: bool,
    /// Require the biometric gate before future credential restores
    pub enable_biometric: bool,
}

/// What the startup sequence concluded.
#[derive(Debug)]
pub enum StartupOutcome {
    /// No connectivity; nothing was attempted beyond local housekeeping
    Offline,
    /// Nothing persisted; the user sees the login form
    NoStoredCredentials,
    /// Credentials exist but the biometric gate did not pass; credentials
    /// are left untouched and auto-login is blocked
    BiometricBlocked(GateError),
    /// Restored credentials were accepted
    SignedIn { active_url: String },
    /// Restored credentials were submitted and rejected, or the portal was
    /// unreachable
    LoginFailed(AuthError),
}

/// Answer to the surface's navigation veto callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirective {
    /// Let the surface navigate
    Proceed,
    /// Veto the navigation; any side effect (external open, logout) has
    /// already been handled
    Block,
}

impl NavigationDirective {
    /// Value for the surface's `proceed` flag.
    pub fn proceed(self) -> bool {
        matches!(self, NavigationDirective::Proceed)
    }
}

/// Swallows repeated logout events for the same URL inside a sliding
/// time window, so one portal logout becomes exactly one transition.
struct LogoutDebounce {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl LogoutDebounce {
    fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    fn should_fire(&mut self, url: &str) -> bool {
        let now = Instant::now();
        let duplicate = matches!(
            &self.last,
            Some((last_url, at)) if last_url == url && now.duration_since(*at) <= self.window
        );
        self.last = Some((url.to_string(), now));
        !duplicate
    }
}

// ============================================================================
// Session Controller
// ============================================================================

/// Root orchestrator of the session lifecycle.
///
/// All methods take `&mut self`: state transitions are serialized by
/// construction, matching the one-event-at-a-time delivery contract.
pub struct SessionController<S, B> {
    store: CredentialStore<S>,
    gate: BiometricGate<B>,
    client: PortalClient,
    policy: NavigationPolicy,
    config: Config,

    state: SessionState,
    /// State stashed while `Disconnected`, restored when connectivity returns
    resume_state: Option<SessionState>,
    /// Guard for the at-most-one-login-in-flight rule. Survives a dropped
    /// login future, which is exactly when the state alone is not enough.
    login_in_flight: bool,
    logout_debounce: LogoutDebounce,

    surface_tx: mpsc::Sender<SurfaceCommand>,
    surface_rx: Option<mpsc::Receiver<SurfaceCommand>>,
}

impl<S, B> SessionController<S, B>
where
    S: SecureStore,
    B: BiometricAuthenticator,
{
    pub fn new(
        backend: S,
        authenticator: B,
        client: PortalClient,
        config: Config,
        initially_online: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel(SURFACE_CHANNEL_SIZE);
        let policy = NavigationPolicy::for_logout_url(&config.endpoints.logout_url);

        Self {
            store: CredentialStore::new(backend),
            gate: BiometricGate::new(authenticator),
            client,
            policy,
            config,
            state: if initially_online {
                SessionState::Unauthenticated
            } else {
                SessionState::Disconnected
            },
            resume_state: None,
            login_in_flight: false,
            logout_debounce: LogoutDebounce::new(LOGOUT_DEDUPE_WINDOW),
            surface_tx: tx,
            surface_rx: Some(rx),
        }
    }

    /// Replace the default navigation policy.
    pub fn with_policy(mut self, policy: NavigationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Take the receiving end of the surface command channel. The host
    /// drains it on its UI loop.
    pub fn take_surface_events(&mut self) -> Option<mpsc::Receiver<SurfaceCommand>> {
        self.surface_rx.take()
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Run the once-per-launch startup sequence: reinstall detection,
    /// credential restore, optional biometric gating, auto-login.
    ///
    /// `current_install_id` identifies this installation (see
    /// [`crate::config::InstallIdentity`]). Store failures abort the
    /// sequence; a purge that did not happen must not be followed by an
    /// auto-login.
    pub async fn startup(&mut self, current_install_id: &str) -> Result<StartupOutcome, StoreError> {
        let stored_marker = self.store.install_marker()?;
        if let Some(stored) = stored_marker {
            if stored != current_install_id {
                info!("install marker changed, purging persisted identity");
                self.store.purge_credentials()?;
                self.store.set_biometric_enabled(false)?;
            }
        }
        self.store.set_install_marker(current_install_id)?;

        if self.state == SessionState::Disconnected {
            debug!("startup while offline, skipping credential restore");
            return Ok(StartupOutcome::Offline);
        }

        let Some(credentials) = self.store.credentials()? else {
            debug!("no persisted credentials");
            return Ok(StartupOutcome::NoStoredCredentials);
        };

        if self.store.biometric_enabled()? {
            if let Err(e) = self.gate.challenge().await {
                // The user asked for biometric protection; a failed gate
                // blocks auto-login but leaves the credentials alone.
                warn!(error = %e, "biometric gate blocked credential restore");
                return Ok(StartupOutcome::BiometricBlocked(e));
            }
        }

        let options = LoginOptions {
            persist: true,
            enable_biometric: false,
        };
        match self
            .login(&credentials.email, &credentials.password, options)
            .await
        {
            Ok(active_url) => Ok(StartupOutcome::SignedIn { active_url }),
            Err(e) => Ok(StartupOutcome::LoginFailed(e)),
        }
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Submit one login attempt. At most one may be in flight; a second
    /// call is rejected without disturbing the first.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        options: LoginOptions,
    ) -> Result<String, AuthError> {
        if self.login_in_flight || self.state == SessionState::Authenticating {
            return Err(AuthError::AlreadyInProgress);
        }

        self.login_in_flight = true;
        self.state = SessionState::Authenticating;

        let result = self.client.login(email, password).await;
        self.login_in_flight = false;

        match result {
            Ok(()) => {
                self.persist_after_login(email, password, options);
                self.config.last_email = Some(email.to_string());

                let active_url = self.client.endpoints().dashboard_url.clone();
                self.state = SessionState::Authenticated {
                    active_url: active_url.clone(),
                };
                self.send_surface(SurfaceCommand::Load(active_url.clone()));
                info!("login succeeded");
                Ok(active_url)
            }
            Err(e) => {
                info!(error = %e, "login failed");
                self.state = SessionState::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Apply the stay-logged-in invariant after a successful login:
    /// credentials are persisted iff `persist` was requested, and the
    /// biometric flag is only ever raised here, never dropped.
    fn persist_after_login(&mut self, email: &str, password: &str, options: LoginOptions) {
        if options.persist {
            let credentials = Credentials::new(email, password);
            if let Err(e) = self.store.store_credentials(&credentials) {
                warn!(error = %e, "failed to persist credentials");
            } else if options.enable_biometric {
                if let Err(e) = self.store.set_biometric_enabled(true) {
                    warn!(error = %e, "failed to persist biometric flag");
                }
            }
        } else if let Err(e) = self.store.purge_credentials() {
            warn!(error = %e, "failed to drop previously persisted credentials");
        }
    }

    /// End the session: purge persisted credentials, forget the active URL,
    /// return to the login form. Idempotent.
    pub fn logout(&mut self) {
        info!("logging out");
        if let Err(e) = self.store.purge_credentials() {
            warn!(error = %e, "failed to purge credentials on logout");
        }
        if self.config.clear_biometric_on_logout {
            if let Err(e) = self.store.set_biometric_enabled(false) {
                warn!(error = %e, "failed to clear biometric flag on logout");
            }
        }
        self.resume_state = None;
        self.state = SessionState::Unauthenticated;
    }

    // =========================================================================
    // Recovery Flow
    // =========================================================================

    /// Show the password-recovery form. Only reachable from the login form.
    pub fn enter_recovery(&mut self) {
        if self.state == SessionState::Unauthenticated {
            self.state = SessionState::RecoveryFlow;
        } else {
            debug!(state = ?self.state, "ignoring recovery entry");
        }
    }

    /// Return from the recovery form to the login form.
    pub fn exit_recovery(&mut self) {
        if self.state == SessionState::RecoveryFlow {
            self.state = SessionState::Unauthenticated;
        }
    }

    /// Submit a recovery request. Success returns the user to the login
    /// form; failure is retryable and changes nothing.
    pub async fn request_recovery(&mut self, email: &str) -> Result<(), RecoveryError> {
        self.client.request_recovery(email).await?;
        if self.state == SessionState::RecoveryFlow {
            self.state = SessionState::Unauthenticated;
        }
        Ok(())
    }

    // =========================================================================
    // Surface Events
    // =========================================================================

    /// Classify one outgoing navigation request from the embedded surface
    /// and perform whatever it implies. The returned directive maps onto
    /// the surface's `proceed` veto.
    pub fn handle_navigation(&mut self, url: &str) -> NavigationDirective {
        match self.policy.decide(url) {
            NavigationDecision::LoadInline => NavigationDirective::Proceed,
            NavigationDecision::DispatchExternally(external) => {
                debug!(url = %external, "dispatching navigation to the OS");
                self.send_surface(SurfaceCommand::OpenExternal(external));
                NavigationDirective::Block
            }
            NavigationDecision::TriggerLogout => {
                if self.logout_debounce.should_fire(url) {
                    info!("portal navigated to its logout endpoint");
                    self.logout();
                } else {
                    debug!("duplicate logout event suppressed");
                }
                NavigationDirective::Block
            }
        }
    }

    /// Feed one connectivity change. Offline overrides every state; coming
    /// back online restores the stashed state and, if the session was live,
    /// reloads the surface in place instead of restarting the session.
    pub fn handle_connectivity(&mut self, online: bool) {
        if !online {
            if self.state != SessionState::Disconnected {
                info!("connectivity lost");
                self.resume_state =
                    Some(std::mem::replace(&mut self.state, SessionState::Disconnected));
            }
        } else if self.state == SessionState::Disconnected {
            let restored = self
                .resume_state
                .take()
                .unwrap_or(SessionState::Unauthenticated);
            let was_authenticated = matches!(restored, SessionState::Authenticated { .. });
            info!(resuming_session = was_authenticated, "connectivity restored");
            self.state = restored;
            if was_authenticated {
                self.send_surface(SurfaceCommand::Reload);
            }
        }
    }

    /// Device back-button contract: the host asks the surface's own history
    /// first and reports whether it went back. Only when the surface could
    /// not go back does the host's own back-navigation apply.
    pub fn handle_back(&self, surface_went_back: bool) -> bool {
        !surface_went_back
    }

    fn send_surface(&self, command: SurfaceCommand) {
        if let Err(e) = self.surface_tx.try_send(command) {
            warn!(error = %e, "dropping surface command, channel full or closed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
