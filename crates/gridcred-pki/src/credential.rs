//! The credential aggregate: a key pair bound to its issued certificate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::keys::SigningKey;
use crate::store;
use crate::types::IssuedCertificate;

/// Policy governing how credentials are materialized on disk.
///
/// Credentials whose remaining validity exceeds the cleartext limit must be
/// written as a password-protected PKCS#12 container instead of plaintext
/// PEM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WritePolicy {
    /// Longest remaining validity a credential may have and still be
    /// written as cleartext PEM.
    max_cleartext_lifetime: Duration,
    /// Minimum passphrase length in bytes for encrypted export.
    min_passphrase_len: usize,
}

impl WritePolicy {
    /// Creates a new write policy.
    #[must_use]
    pub const fn new(max_cleartext_lifetime: Duration, min_passphrase_len: usize) -> Self {
        Self {
            max_cleartext_lifetime,
            min_passphrase_len,
        }
    }

    /// Returns the longest remaining validity writable as cleartext.
    #[must_use]
    pub const fn max_cleartext_lifetime(&self) -> Duration {
        self.max_cleartext_lifetime
    }

    /// Returns the minimum passphrase length in bytes.
    #[must_use]
    pub const fn min_passphrase_len(&self) -> usize {
        self.min_passphrase_len
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            max_cleartext_lifetime: Duration::from_secs(12 * 60 * 60),
            min_passphrase_len: 12,
        }
    }
}

/// What a policy-driven write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cleartext PEM written at the given path.
    Pem(PathBuf),
    /// Password-protected PKCS#12 container written at the given path.
    Pkcs12(PathBuf),
}

impl WriteOutcome {
    /// Returns the path that was written.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Pem(path) | Self::Pkcs12(path) => path,
        }
    }
}

/// A complete credential: private key plus the certificate issued for it.
///
/// Exists in memory for the duration of one issuance run; writing it out is
/// the end of its lifecycle.
pub struct Credential {
    /// Key pair the certificate was issued for.
    key: SigningKey,
    /// Certificate returned by the issuing service.
    certificate: IssuedCertificate,
}

impl Credential {
    /// Binds a key pair to the certificate issued for it.
    #[must_use]
    pub const fn new(key: SigningKey, certificate: IssuedCertificate) -> Self {
        Self { key, certificate }
    }

    /// Returns the issued certificate.
    #[must_use]
    pub const fn certificate(&self) -> &IssuedCertificate {
        &self.certificate
    }

    /// Returns the subject DN, most-specific RDN first (RFC 2253 ordering).
    #[must_use]
    pub fn subject_name(&self) -> &str {
        self.certificate.subject()
    }

    /// Returns the subject in the legacy slash-delimited one-line format,
    /// e.g. `/C=US/O=Example/CN=Jane Doe`.
    #[must_use]
    pub fn subject_name_legacy(&self) -> String {
        self.certificate
            .subject()
            .rsplit(", ")
            .map(|component| format!("/{component}"))
            .collect()
    }

    /// Returns the certificate validity start time.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.certificate.not_before()
    }

    /// Returns the certificate validity end time.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.certificate.not_after()
    }

    /// Returns the validity remaining from now until `not_after`.
    #[must_use]
    pub fn remaining_lifetime(&self) -> chrono::Duration {
        self.certificate.not_after() - Utc::now()
    }

    /// Writes the credential to `path` under the given policy.
    ///
    /// Within the cleartext limit this produces a PEM file holding the
    /// certificate block followed by the private-key block. Beyond the limit
    /// a passphrase is mandatory and a PKCS#12 container is written at the
    /// sibling `.p12` path instead; no cleartext file is produced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PassphraseRequired`] or [`Error::PassphraseTooShort`]
    /// when the encrypted path is taken without an acceptable passphrase,
    /// and [`Error::Io`] on filesystem failures.
    pub fn write_to_file(
        &self,
        path: &Path,
        passphrase: Option<&str>,
        policy: &WritePolicy,
    ) -> Result<WriteOutcome> {
        let remaining = self.remaining_lifetime().num_seconds();
        let limit = policy.max_cleartext_lifetime().as_secs() as i64;

        if remaining > limit {
            debug!(
                "Remaining lifetime {remaining}s exceeds cleartext limit {limit}s, \
                 requiring encrypted export"
            );
            let passphrase = passphrase.ok_or(Error::PassphraseRequired)?;
            if passphrase.len() < policy.min_passphrase_len() {
                return Err(Error::PassphraseTooShort {
                    got: passphrase.len(),
                    min: policy.min_passphrase_len(),
                });
            }
            let p12_path = path.with_extension("p12");
            self.write_to_pkcs12(&p12_path, passphrase)?;
            return Ok(WriteOutcome::Pkcs12(p12_path));
        }

        let blocks = [self.certificate.pem(), self.key.private_key().pem()];
        store::write_pem_blocks(path, &blocks)?;
        info!("Credential written to {}", path.display());

        Ok(WriteOutcome::Pem(path.to_path_buf()))
    }

    /// Writes the credential as a password-protected PKCS#12 container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PassphraseRequired`] for an empty password,
    /// [`Error::Pkcs12`] if the container cannot be assembled, and
    /// [`Error::Io`] on filesystem failures.
    pub fn write_to_pkcs12(&self, path: &Path, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::PassphraseRequired);
        }

        let key = self.key.private_key();
        let pfx = p12::PFX::new(self.certificate.der(), key.der(), None, password, "gridcred")
            .ok_or_else(|| Error::Pkcs12("failed to assemble container".into()))?;

        store::write_secret(path, &pfx.to_der())?;
        info!("Encrypted credential written to {}", path.display());

        Ok(())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("subject", &self.certificate.subject())
            .field("not_after", &self.certificate.not_after())
            .field("key", &"[REDACTED]")
            .finish()
    }
}
