//! PKCS#10 certification request construction.
//!
//! The request subject is a placeholder. The issuing service replaces it
//! with the authenticated identity, so nothing downstream may rely on the
//! requested subject surviving issuance.

use rcgen::{CertificateParams, DistinguishedName, DnType};
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::SigningKey;
use crate::pem;

/// Subject placed in outgoing requests; the server overwrites it.
pub const PLACEHOLDER_SUBJECT: &str = "CN=Credential Retriever, O=GridCred, C=US";

/// Builder for PKCS#10 certification requests.
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    /// Request subject, most-specific RDN first.
    subject: String,
}

impl CsrBuilder {
    /// Creates a builder with the placeholder subject.
    #[must_use]
    pub fn new() -> Self {
        Self::with_subject(PLACEHOLDER_SUBJECT)
    }

    /// Creates a builder with an explicit subject of the form
    /// `CN=..., O=..., C=..`.
    #[must_use]
    pub fn with_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Builds and signs a certification request with the given key pair.
    ///
    /// The signature algorithm follows the key type (SHA-256 family for both
    /// RSA and EC keys).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the subject string cannot be parsed and
    /// [`Error::Generation`] if signing fails.
    pub fn build(&self, key: &SigningKey) -> Result<Csr> {
        debug!(
            "Building certification request (subject: {}, signature: {})",
            self.subject,
            key.algorithm().signature_algorithm()
        );

        let mut params = CertificateParams::default();
        params.distinguished_name = parse_dn(&self.subject)?;

        let request = params
            .serialize_request(key.rcgen_key_pair())
            .map_err(|e| Error::Generation(format!("failed to sign request: {e}")))?;

        Ok(Csr {
            der: request.der().to_vec(),
        })
    }
}

impl Default for CsrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A signed PKCS#10 certification request.
#[derive(Debug, Clone)]
pub struct Csr {
    /// DER-encoded request bytes.
    der: Vec<u8>,
}

impl Csr {
    /// Returns the DER-encoded request bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the PEM-encoded request.
    #[must_use]
    pub fn to_pem(&self) -> String {
        pem::encode(&self.der, pem::CERTIFICATE_REQUEST)
    }
}

/// Parses a `CN=..., O=..., C=..` subject string into DN components.
fn parse_dn(subject: &str) -> Result<DistinguishedName> {
    let mut dn = DistinguishedName::new();
    for part in subject.split(',') {
        let part = part.trim();
        let (ty, value) = part
            .split_once('=')
            .ok_or_else(|| Error::Format(format!("malformed DN component '{part}'")))?;
        let dn_type = match ty.trim() {
            "CN" => DnType::CommonName,
            "O" => DnType::OrganizationName,
            "OU" => DnType::OrganizationalUnitName,
            "C" => DnType::CountryName,
            "ST" => DnType::StateOrProvinceName,
            "L" => DnType::LocalityName,
            other => {
                return Err(Error::Format(format!(
                    "unsupported DN attribute type '{other}'"
                )));
            }
        };
        dn.push(dn_type, value.trim());
    }
    Ok(dn)
}
