//! HTTPS credential-issuance client for gridcred.
#![forbid(unsafe_code)]
//!
//! This crate owns the wire half of credential acquisition: building the
//! TLS trust context and exchanging a PEM certification request for an
//! issued certificate over a single authenticated POST.
//!
//! The trust context must be constructed before the first connection is
//! opened and is immutable afterwards; see [`TrustContext::configure`].
//!
//! # Modules
//!
//! - [`trust`] - TLS trust context
//! - [`issuer`] - the issuance protocol client
//! - [`error`] - error types

pub mod error;
pub mod issuer;
pub mod trust;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use issuer::{AuthToken, ClientState, CredentialIssuanceClient, IssuerConfig};
pub use trust::TrustContext;
