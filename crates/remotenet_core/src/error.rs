//! crates/remotenet_core/src/error.rs
//!
//! Error types for session operations. Every variant is recoverable and its
//! `Display` text is the message shown to the user.

/// Raised when issued credentials don't meet the minimum requirements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("User ID and Password must be at least {min} characters long.")]
    TooShort { min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Data Cap and Duration must be greater than 0.")]
    InvalidLimits,
}

/// Why a receiver was not admitted. The two causes need different guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Provider has not started the sharing session yet. Please wait.")]
    ProviderNotReady,
    #[error("Invalid credentials. Please check and try again.")]
    InvalidCredentials,
}

/// The primary error type for operations on a sharing session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CredentialError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Sharing is already in progress.")]
    AlreadySharing,

    #[error("The session is not connected.")]
    NotConnected,

    #[error("Usage limits cannot be changed while sharing is active.")]
    PolicyLocked,

    #[error("A role has already been selected for this session.")]
    RoleAlreadySelected,

    #[error("This action is not available to the {0} role.")]
    WrongRole(String),

    #[error("Only the provider or the connected receiver can stop sharing.")]
    NotPermitted,

    #[error("A speed test is already running.")]
    SpeedTestInFlight,
}

/// A convenience type alias for `Result<T, SessionError>`.
pub type SessionResult<T> = Result<T, SessionError>;
