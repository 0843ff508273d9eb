// Client session error types

use thiserror::Error;

/// Failures while persisting or clearing a client session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
