use thiserror::Error;

/// Failure of an asynchronous directory or channel action.
///
/// Actions resolve to `ActionResult<T>` instead of panicking; callers decide
/// whether a failure is worth surfacing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The request never produced a response (DNS, TLS, timeout...).
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    /// The response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The request was rejected before being sent.
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ActionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ActionError::Server { status, .. } => Some(*status),
            ActionError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;
