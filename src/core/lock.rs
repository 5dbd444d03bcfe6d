//! Advisory lock that serializes migration runs.
//!
//! The lock is an exclusive `flock` on a well-known file. It is released when
//! the guard is dropped, and by the kernel if the process dies first.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::model::LockMode;
use crate::utils::error::LockError;

/// Held for the whole migration; dropping it releases the lock.
#[derive(Debug)]
pub struct MigrationLock {
    lock_path: PathBuf,
    lock_file: File,
}

impl MigrationLock {
    /// Open (creating if needed) `lock_path` and take an exclusive lock on it.
    ///
    /// With [`LockMode::NonBlocking`] a lock held elsewhere fails immediately
    /// with [`LockError::Unavailable`]. With [`LockMode::Blocking`] this waits
    /// for as long as it takes.
    pub fn acquire(lock_path: &Path, mode: LockMode) -> Result<Self, LockError> {
        let io_err = |source: io::Error| LockError::Io {
            path: lock_path.to_path_buf(),
            source,
        };

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(lock_path)
            .map_err(io_err)?;

        match flock_exclusive(&lock_file, mode) {
            Ok(()) => {
                tracing::debug!("Acquired {:?} lock on {}", mode, lock_path.display());
                Ok(Self {
                    lock_path: lock_path.to_path_buf(),
                    lock_file,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Err(LockError::Unavailable(lock_path.to_path_buf()))
            }
            Err(e) => Err(io_err(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File, mode: LockMode) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let operation = match mode {
        LockMode::Blocking => libc::LOCK_EX,
        LockMode::NonBlocking => libc::LOCK_EX | libc::LOCK_NB,
    };

    loop {
        let result = unsafe { libc::flock(file.as_raw_fd(), operation) };
        if result == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::EWOULDBLOCK) => {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "lock held"))
            }
            _ => return Err(err),
        }
    }
}

#[cfg(not(unix))]
fn flock_exclusive(_file: &File, _mode: LockMode) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "advisory locking requires a unix platform",
    ))
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            unsafe {
                libc::flock(self.lock_file.as_raw_fd(), libc::LOCK_UN);
            }
        }
        tracing::debug!("Released lock on {}", self.lock_path.display());
    }
}
