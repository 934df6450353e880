//! Owner-only credential file writing.
//!
//! Output files are created with mode 0600 in the same `open(2)` call that
//! creates them, so there is no window in which another user can open the
//! file before permissions are tightened. On non-Unix platforms the file
//! inherits the user's default ACLs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Writes `contents` to `path`, readable and writable by the owner only.
///
/// Any pre-existing file at `path` is removed first. If the write fails
/// part-way, the partial file is removed before the error is returned.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be removed, created, or written.
pub fn write_secret(path: &Path, contents: &[u8]) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|e| {
            Error::Io(format!("cannot replace existing {}: {e}", path.display()))
        })?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| Error::Io(format!("cannot create {}: {e}", path.display())))?;

    if let Err(e) = file.write_all(contents).and_then(|()| file.sync_all()) {
        drop(file);
        if let Err(rm) = fs::remove_file(path) {
            warn!("Could not remove partial file {}: {rm}", path.display());
        }
        return Err(Error::Io(format!("write to {} failed: {e}", path.display())));
    }

    debug!(
        "Wrote {} bytes to {} (owner-only)",
        contents.len(),
        path.display()
    );

    Ok(())
}

/// Writes a sequence of PEM blocks to one owner-only file.
///
/// # Errors
///
/// Returns [`Error::Io`] as [`write_secret`] does.
pub fn write_pem_blocks(path: &Path, blocks: &[String]) -> Result<()> {
    write_secret(path, blocks.concat().as_bytes())
}
