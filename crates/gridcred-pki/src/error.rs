//! PKI error types.

use thiserror::Error;

/// Result type for PKI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// PKI error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// PEM or DER decoding failed.
    #[error("format error: {0}")]
    Format(String),

    /// The requested key algorithm or size is not available.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key or request generation failed.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Certificate parsing failed.
    #[error("certificate parsing failed: {0}")]
    Parse(String),

    /// Encrypted export was required but no passphrase was supplied.
    #[error("credential lifetime exceeds the cleartext limit, a passphrase is required")]
    PassphraseRequired,

    /// The supplied passphrase is shorter than the configured minimum.
    #[error("passphrase is too short: {got} bytes, minimum {min}")]
    PassphraseTooShort {
        /// Length of the supplied passphrase in bytes.
        got: usize,
        /// Configured minimum length in bytes.
        min: usize,
    },

    /// Building or encoding the PKCS#12 container failed.
    #[error("PKCS#12 export failed: {0}")]
    Pkcs12(String),

    /// Creating, restricting, or writing an output file failed.
    #[error("filesystem error: {0}")]
    Io(String),
}
