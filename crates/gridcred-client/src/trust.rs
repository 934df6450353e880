//! TLS trust configuration.
//!
//! The trust context is built once per process, before the first connection
//! is opened, and handed to the issuance client by value. Many TLS stacks
//! cache the first-constructed connector for the process lifetime, so this
//! ordering is a hard precondition, not a style choice.

use reqwest::Certificate;
use tracing::{debug, warn};

use gridcred_pki::pem;

use crate::error::{Error, Result};

/// The set of CA certificates the HTTPS client will accept.
#[derive(Debug, Clone)]
pub enum TrustContext {
    /// The platform's default trust store, unmodified.
    SystemDefault,
    /// Only the given CA certificates are trusted.
    Bundled(Vec<Certificate>),
}

impl TrustContext {
    /// Parses a PEM bundle of CA certificates into a bundled trust context.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle is not UTF-8, contains malformed PEM,
    /// or holds no `CERTIFICATE` block.
    pub fn from_pem_bundle(bundle: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bundle)
            .map_err(|e| Error::Transport(format!("CA bundle is not UTF-8: {e}")))?;

        let mut certs = Vec::new();
        for block in pem::decode_all(text)? {
            if block.label != pem::CERTIFICATE {
                continue;
            }
            let cert = Certificate::from_der(&block.der)
                .map_err(|e| Error::Transport(format!("invalid CA certificate in bundle: {e}")))?;
            certs.push(cert);
        }

        if certs.is_empty() {
            return Err(Error::Transport(
                "CA bundle holds no CERTIFICATE block".into(),
            ));
        }

        Ok(Self::Bundled(certs))
    }

    /// Builds the process trust context.
    ///
    /// When `use_bundled` is set and the bundle loads, only its CAs are
    /// trusted. A missing or unloadable bundle degrades to the platform
    /// default with a warning; connections to a server whose CA exists only
    /// in the bundle will then fail later, at the TLS handshake.
    #[must_use]
    pub fn configure(use_bundled: bool, bundle: Option<&[u8]>) -> Self {
        if !use_bundled {
            debug!("Using default trust store");
            return Self::SystemDefault;
        }

        match bundle {
            None => {
                warn!("Bundled CAs requested but no bundle provided, falling back to default trust");
                Self::SystemDefault
            }
            Some(bytes) => match Self::from_pem_bundle(bytes) {
                Ok(ctx) => {
                    if let Self::Bundled(certs) = &ctx {
                        debug!("Trusting {} bundled CA certificate(s)", certs.len());
                    }
                    ctx
                }
                Err(e) => {
                    warn!("Could not load CA bundle ({e}), falling back to default trust");
                    Self::SystemDefault
                }
            },
        }
    }

    /// Applies this trust context to a client builder.
    pub(crate) fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        match self {
            Self::SystemDefault => builder,
            Self::Bundled(certs) => {
                let mut builder = builder.tls_built_in_root_certs(false);
                for cert in certs {
                    builder = builder.add_root_certificate(cert.clone());
                }
                builder
            }
        }
    }
}
