//! Issuance client error types.

use thiserror::Error;

/// Result type for issuance operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Issuance error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// The service URL does not use HTTPS.
    #[error("service URL is not secure (scheme is '{0}' rather than 'https')")]
    InsecureTransport(String),

    /// The service URL could not be parsed.
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),

    /// `issue` was called before `open`, or after `close`.
    #[error("client is not connected")]
    NotConnected,

    /// The server rejected the authentication token (HTTP 401).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server rejected the request as malformed (HTTP 400).
    #[error("request malformed: {0}")]
    MalformedRequest(String),

    /// The server reported an internal error (HTTP 5xx).
    #[error("server error: {0}")]
    ServerError(String),

    /// The server returned a status outside the mapped set.
    #[error("server returned unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The server reported success but returned no certificate.
    #[error("server returned success with an empty body")]
    EmptyResponse,

    /// Building the TLS client or performing the exchange failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not a parseable certificate.
    #[error(transparent)]
    Certificate(#[from] gridcred_pki::Error),
}
