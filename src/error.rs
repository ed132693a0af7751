use thiserror::Error;

/// Failures while authenticating against the panel.
///
/// Cloneable so one login outcome can be handed to every caller that was
/// waiting on the same in-flight attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(String),

    #[error("upstream rejected credentials: {0}")]
    Rejected(String),

    #[error("login attempts exhausted after {0} consecutive failures")]
    AttemptsExhausted(u32),
}

/// Failures while talking to the panel after (or while) authenticating.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("session recovery failed after {0} reauthentication attempt(s)")]
    SessionRecoveryFailed(u32),

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream returned a malformed payload: {0}")]
    Malformed(String),

    #[error("user not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
