//! File operations used by the append-only ledger

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Result of an exclusive creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The file did not exist and is now an empty file owned by the caller
    Created,
    /// Another writer got there first
    AlreadyExists,
}

/// Create an empty file, failing softly if it already exists.
///
/// Parent directories are created as needed. Creation uses `O_EXCL`
/// semantics, so two racing callers can never both see `Created`.
pub fn create_exclusive(path: &NormalizedPath) -> Result<CreateOutcome> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&native_path)
    {
        Ok(_) => Ok(CreateOutcome::Created),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(CreateOutcome::AlreadyExists),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Open an existing file for appending.
pub fn open_append(path: &NormalizedPath) -> Result<File> {
    let native_path = path.to_native();
    OpenOptions::new()
        .append(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))
}

/// Append `content` to a file under an exclusive advisory lock.
///
/// The file is created if missing. The whole buffer is written with a
/// single `write_all` and synced before the lock is released.
pub fn append_locked(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))?;

    FileExt::lock_exclusive(&file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    file.write_all(content)
        .map_err(|e| Error::io(&native_path, e))?;
    file.sync_all()
        .map_err(|e| Error::io(&native_path, e))?;

    tracing::debug!(path = %path, bytes = content.len(), "Appended under lock");
    // Lock released when file is dropped
    Ok(())
}

/// Remove a file if it exists.
pub fn remove_if_exists(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
