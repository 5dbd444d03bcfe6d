//! Atomic, permission-restricted JSON file replacement.
//!
//! A document is written to `<dest>.tmp` in the destination's directory and
//! then renamed over `<dest>`. Readers see either the previous file or the new
//! one in full. The temp file is 0600 before the first byte lands in it.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::domain::model::ConfigDocument;
use crate::utils::error::{MigrateError, Result};

const TEMP_SUFFIX: &str = ".tmp";

/// `/etc/securedrop/config.json` -> `/etc/securedrop/config.json.tmp`
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(TEMP_SUFFIX);
    dest.with_file_name(name)
}

pub fn write_atomic(document: &ConfigDocument, dest: &Path) -> Result<()> {
    let bytes = serde_json::to_vec(document)?;
    let temp_path = temp_path_for(dest);

    let write_err = |path: &Path, source: io::Error| MigrateError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = write_restricted(&temp_path, &bytes) {
        remove_leftover(&temp_path);
        return Err(write_err(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, dest) {
        remove_leftover(&temp_path);
        return Err(write_err(dest, e));
    }

    remove_leftover(&temp_path);
    tracing::debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}

fn write_restricted(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = open_restricted(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(unix)]
fn open_restricted(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;

    // `mode` only applies on creation; a stale temp file keeps its old bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_restricted(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn remove_leftover(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed leftover {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}
