//! Key, request, and credential handling for gridcred.
#![forbid(unsafe_code)]
//!
//! This crate covers the local half of credential acquisition: generating a
//! key pair, building the PKCS#10 certification request sent to the issuing
//! service, parsing the certificate that comes back, and writing the
//! resulting credential to disk with owner-only permissions (or as a
//! password-protected PKCS#12 container when it lives long enough to need
//! one).
//!
//! # Example
//!
//! ```
//! use gridcred_pki::{CsrBuilder, KeyAlgorithm, SigningKey};
//!
//! // Generate a key pair and a signed certification request for it.
//! let key = SigningKey::generate(KeyAlgorithm::EcdsaP256).unwrap();
//! let csr = CsrBuilder::new().build(&key).unwrap();
//!
//! assert!(csr.to_pem().starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
//! ```
//!
//! # Modules
//!
//! - [`pem`] - PEM encoding and decoding
//! - [`keys`] - key pair generation
//! - [`csr`] - PKCS#10 request construction
//! - [`types`] - `IssuedCertificate` and `PrivateKey`
//! - [`credential`] - the credential aggregate and write policy
//! - [`store`] - owner-only file writing
//! - [`error`] - error types

pub mod credential;
pub mod csr;
pub mod error;
pub mod keys;
pub mod pem;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use credential::{Credential, WriteOutcome, WritePolicy};
pub use csr::{Csr, CsrBuilder, PLACEHOLDER_SUBJECT};
pub use error::{Error, Result};
pub use keys::{KeyAlgorithm, SigningKey};
pub use types::{IssuedCertificate, PrivateKey};
