use std::error::Error;
use thiserror::Error;

/// Result alias for spreadsheet bridge operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by spreadsheet bridges regardless of the remote service behind them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote service could not be reached or answered with a transport error.
    #[error("spreadsheet unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Underlying transport or decoding failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The remote service answered but reported a failure of its own.
    #[error("spreadsheet rejected the request: {message}")]
    Rejected {
        /// Message reported by the remote service.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a rejection carrying the remote service's own message.
    pub fn rejected(message: impl Into<String>) -> Self {
        StorageError::Rejected {
            message: message.into(),
        }
    }
}
