use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("A sign-in is already in progress")]
    SignInInProgress,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why token acquisition came back empty.
///
/// This is a plain outcome, not a fault: acquisition never panics and
/// never propagates provider internals. Callers decide whether to proceed
/// unauthenticated or surface a sign-in prompt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionFailure {
    /// No account is signed in; the caller proceeds unauthenticated.
    #[error("No signed-in account")]
    NoAccount,

    /// Silent and interactive acquisition both failed.
    #[error("Token unavailable after silent and interactive attempts")]
    Unavailable,
}
