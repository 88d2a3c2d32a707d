use thiserror::Error;

/// Failures that abort an invocation before any push is attempted.
///
/// Per-push delivery failures are deliberately absent: the dispatcher logs
/// and swallows them so one bad token cannot fail the batch.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("server not configured: missing {0}")]
    Config(&'static str),

    #[error("failed to sign provider token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("http client error: {0}")]
    Transport(String),
}

impl From<diesel::result::Error> for PushError {
    fn from(e: diesel::result::Error) -> Self {
        PushError::Database(e.to_string())
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for PushError {
    fn from(e: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        PushError::Database(e.to_string())
    }
}
