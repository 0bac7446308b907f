//! Course-server client error types.

use thiserror::Error;

/// Errors that can occur when talking to the course server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the stored username and password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No credentials have been saved yet.
    #[error("please login using `pipal login` before running this command")]
    NotLoggedIn,

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}
