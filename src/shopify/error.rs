use thiserror::Error;

/// Error taxonomy for the remote catalog platform.
///
/// Raw transport failures and user-error messages are classified here, at the
/// adapter boundary, so the import core can branch on variants instead of
/// matching message text.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("rate limited by remote platform")]
    RateLimited,
    #[error("remote asset not ready: {0}")]
    NotReady(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// Transient conditions worth another attempt after a pause.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NotReady(_))
    }

    /// Idempotent conflicts, treated as success by callers.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Classify a user-error message returned by the platform.
///
/// "still processing" / "non-ready files" mean the uploaded asset has not
/// finished ingesting yet. "already" covers the already-attached /
/// already-exists family. Everything else is a terminal validation error.
pub fn classify_user_error(message: &str) -> ClientError {
    let lowered = message.to_lowercase();
    if lowered.contains("processing") || lowered.contains("non-ready files") {
        ClientError::NotReady(message.to_string())
    } else if lowered.contains("already") {
        ClientError::AlreadyExists(message.to_string())
    } else {
        ClientError::Validation(message.to_string())
    }
}
