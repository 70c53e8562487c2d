//! Error types shared by the Apps Script bridge implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`GasBridgeError`] failures.
pub type GasResult<T> = Result<T, GasBridgeError>;

/// Failures that can occur while talking to the Apps Script web app.
#[derive(Debug, Error)]
pub enum GasBridgeError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Apps Script client")]
    ClientBuilder {
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send `{action}` request to Apps Script")]
    RequestSend {
        /// Bridge action being performed.
        action: &'static str,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The web app answered with a non-success HTTP status.
    #[error("unexpected Apps Script response status {status} for `{action}`")]
    RequestStatus {
        /// Bridge action being performed.
        action: &'static str,
        /// Status returned by the web app.
        status: StatusCode,
    },
    /// Response payload could not be decoded.
    #[error("failed to decode Apps Script response for `{action}`")]
    DecodeResponse {
        /// Bridge action being performed.
        action: &'static str,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The script reported `success: false`.
    #[error("Apps Script `{action}` failed: {message}")]
    Rejected {
        /// Bridge action being performed.
        action: &'static str,
        /// Message reported by the script.
        message: String,
    },
    /// The script answered successfully but without the expected data.
    #[error("Apps Script `{action}` returned no usable data")]
    MissingData {
        /// Bridge action being performed.
        action: &'static str,
    },
}

impl From<GasBridgeError> for StorageError {
    fn from(err: GasBridgeError) -> Self {
        match err {
            GasBridgeError::Rejected { message, .. } => StorageError::rejected(message),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
