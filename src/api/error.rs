use thiserror::Error;

/// Login failure taxonomy. Credential errors are user-fixable and never
/// retried automatically; network errors may be retried by the user.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("a login attempt is already in progress")]
    AlreadyInProgress,
}

/// Password-recovery failure taxonomy, mirroring login: the server either
/// rejected the request or was unreachable.
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("recovery request rejected")]
    Rejected,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
