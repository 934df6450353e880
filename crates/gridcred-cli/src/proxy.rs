//! Default credential-file location discovery.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable overriding the credential path.
pub const PROXY_ENV: &str = "X509_USER_PROXY";

/// Returns the conventional per-user credential path.
///
/// `X509_USER_PROXY` wins when set and non-empty. Otherwise Unix hosts use
/// `/tmp/x509up_u{uid}` and other platforms `{tmpdir}/x509up_u_{username}`.
pub fn default_proxy_path() -> Result<PathBuf> {
    resolve_proxy_path(env::var(PROXY_ENV).ok())
}

/// Resolves the credential path given the value of [`PROXY_ENV`], if any.
fn resolve_proxy_path(override_path: Option<String>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    #[cfg(unix)]
    {
        Ok(PathBuf::from(format!("/tmp/x509up_u{}", current_uid()?)))
    }

    #[cfg(not(unix))]
    {
        let user = env::var("USERNAME").context("USERNAME is not set")?;
        Ok(env::temp_dir().join(format!("x509up_u_{user}")))
    }
}

/// Returns the current user's numeric uid, read from the ownership of the
/// home directory.
#[cfg(unix)]
fn current_uid() -> Result<u32> {
    use std::os::unix::fs::MetadataExt;

    let home = env::var("HOME").context("HOME is not set")?;
    let metadata =
        std::fs::metadata(&home).with_context(|| format!("cannot stat home directory {home}"))?;
    Ok(metadata.uid())
}
