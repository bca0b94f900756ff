//! Device biometric gating.
//!
//! The platform side (Face ID, fingerprint, device passcode) is behind the
//! [`BiometricAuthenticator`] trait, implemented by the host shell.
//! [`BiometricGate`] holds the policy: missing hardware is terminal, a
//! device without enrolled biometrics still gets the platform challenge with
//! passcode fallback, and a challenge runs exactly once per request.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Prompt shown by the platform challenge dialog
const CHALLENGE_PROMPT: &str = "Autentique-se para continuar";

#[derive(Error, Debug)]
pub enum GateError {
    #[error("device has no biometric hardware")]
    HardwareAbsent,

    #[error("no biometrics enrolled on this device")]
    NotEnrolled,

    #[error("biometric challenge failed")]
    ChallengeFailed,

    #[error("platform authentication error: {0}")]
    Platform(String),
}

/// What the device is capable of, before any challenge is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricCapability {
    /// Hardware present and biometrics enrolled
    Available,
    /// Hardware present but nothing enrolled
    NotEnrolled,
    /// No biometric hardware at all
    NoHardware,
}

/// Platform biometric facility, implemented by the host.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    fn capability(&self) -> BiometricCapability;

    /// Run one interactive challenge. `allow_device_fallback` lets the
    /// platform fall back to the device passcode. Returns whether the user
    /// passed.
    async fn authenticate(
        &self,
        prompt: &str,
        allow_device_fallback: bool,
    ) -> Result<bool, GateError>;
}

/// Single-challenge gate over a platform authenticator.
pub struct BiometricGate<A> {
    authenticator: A,
}

impl<A: BiometricAuthenticator> BiometricGate<A> {
    pub fn new(authenticator: A) -> Self {
        Self { authenticator }
    }

    pub fn capability(&self) -> BiometricCapability {
        self.authenticator.capability()
    }

    /// Run one interactive challenge. Never retries; the caller decides what
    /// a failure means.
    pub async fn challenge(&self) -> Result<(), GateError> {
        match self.authenticator.capability() {
            BiometricCapability::NoHardware => Err(GateError::HardwareAbsent),
            capability => {
                if capability == BiometricCapability::NotEnrolled {
                    // Not enrolled degrades to the device passcode, it is not
                    // a hard failure.
                    debug!("no biometrics enrolled, challenging with passcode fallback");
                }
                if self
                    .authenticator
                    .authenticate(CHALLENGE_PROMPT, true)
                    .await?
                {
                    Ok(())
                } else {
                    Err(GateError::ChallengeFailed)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubAuthenticator {
        capability: BiometricCapability,
        grant: bool,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl StubAuthenticator {
        fn new(capability: BiometricCapability, grant: bool) -> Self {
            Self {
                capability,
                grant,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BiometricAuthenticator for StubAuthenticator {
        fn capability(&self) -> BiometricCapability {
            self.capability
        }

        async fn authenticate(
            &self,
            prompt: &str,
            allow_device_fallback: bool,
        ) -> Result<bool, GateError> {
            self.calls
                .lock()
                .expect("lock")
                .push((prompt.to_string(), allow_device_fallback));
            Ok(self.grant)
        }
    }

    #[tokio::test]
    async fn test_challenge_passes_when_granted() {
        let gate = BiometricGate::new(StubAuthenticator::new(BiometricCapability::Available, true));
        gate.challenge().await.expect("challenge");
    }

    #[tokio::test]
    async fn test_challenge_failure_is_reported() {
        let gate = BiometricGate::new(StubAuthenticator::new(
            BiometricCapability::Available,
            false,
        ));
        let err = gate.challenge().await.expect_err("should fail");
        assert!(matches!(err, GateError::ChallengeFailed));
    }

    #[tokio::test]
    async fn test_missing_hardware_is_terminal() {
        let stub = StubAuthenticator::new(BiometricCapability::NoHardware, true);
        let gate = BiometricGate::new(stub);
        let err = gate.challenge().await.expect_err("should fail");
        assert!(matches!(err, GateError::HardwareAbsent));
        // No interactive challenge was attempted
        assert!(gate.authenticator.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_not_enrolled_still_challenges_with_fallback() {
        let stub = StubAuthenticator::new(BiometricCapability::NotEnrolled, true);
        let gate = BiometricGate::new(stub);
        gate.challenge().await.expect("challenge");

        let calls = gate.authenticator.calls.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1, "device fallback must stay enabled");
    }
}
