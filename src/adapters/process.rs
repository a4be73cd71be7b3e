//! Process plumbing for running under a service manager: file mode mask,
//! PID file, working directory and termination signals.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::ShutdownHandle;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Another instance holds PID file {0}")]
    AlreadyRunning(PathBuf),
    #[error("PID file {path}: {source}")]
    PidFile { path: PathBuf, source: io::Error },
    #[error("Cannot change directory to {path}: {source}")]
    WorkingDir { path: PathBuf, source: io::Error },
    #[error("Signal handler setup failed: {0}")]
    Signal(io::Error),
}

/// Exclusive PID file, removed on drop
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create the file and write our PID. Fails if it already exists.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, ProcessError> {
        let path = path.as_ref().to_path_buf();
        let mut file: File = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => ProcessError::AlreadyRunning(path.clone()),
                _ => ProcessError::PidFile {
                    path: path.clone(),
                    source,
                },
            })?;

        writeln!(file, "{}", std::process::id()).map_err(|source| ProcessError::PidFile {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Wrote PID file {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove PID file {}: {}", self.path.display(), e);
        }
    }
}

/// Group-writable files, nothing for others
pub const DAEMON_UMASK: u32 = 0o002;

/// Set the process file mode mask, returning the previous one
#[cfg(unix)]
pub fn set_umask(mask: u32) -> u32 {
    // SAFETY: umask only swaps a process attribute and cannot fail
    let previous = unsafe { libc::umask(mask as libc::mode_t) };
    tracing::debug!("umask {:03o} (was {:03o})", mask, previous);
    previous as u32
}

#[cfg(not(unix))]
pub fn set_umask(_mask: u32) -> u32 {
    0
}

pub fn enter_working_dir(path: &Path) -> Result<(), ProcessError> {
    std::env::set_current_dir(path).map_err(|source| ProcessError::WorkingDir {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Working directory: {}", path.display());
    Ok(())
}

/// Route SIGTERM and SIGINT into the shutdown handle.
///
/// Must be called from inside the runtime. The spawned task ends after the
/// first signal; the handle is sticky so later signals change nothing.
#[cfg(unix)]
pub fn forward_signals(shutdown: ShutdownHandle) -> Result<(), ProcessError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate()).map_err(ProcessError::Signal)?;
    let mut int = signal(SignalKind::interrupt()).map_err(ProcessError::Signal)?;

    tokio::spawn(async move {
        tokio::select! {
            _ = term.recv() => tracing::info!("Received SIGTERM"),
            _ = int.recv() => tracing::info!("Received SIGINT"),
        }
        shutdown.request();
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn forward_signals(shutdown: ShutdownHandle) -> Result<(), ProcessError> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C");
            shutdown.request();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pid_file_written_and_removed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trader.pid");

        {
            let pid = PidFile::acquire(&path).unwrap();
            let contents = std::fs::read_to_string(pid.path()).unwrap();
            assert_eq!(contents.trim(), std::process::id().to_string());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_pid_file_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trader.pid");

        let _held = PidFile::acquire(&path).unwrap();
        assert!(matches!(
            PidFile::acquire(&path),
            Err(ProcessError::AlreadyRunning(_))
        ));
        // the failed attempt must not delete the holder's file
        assert!(path.exists());
    }

    #[test]
    fn test_pid_file_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("trader.pid");
        assert!(matches!(
            PidFile::acquire(&path),
            Err(ProcessError::PidFile { .. })
        ));
    }

    #[test]
    fn test_enter_missing_working_dir() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            enter_working_dir(&dir.path().join("nope")),
            Err(ProcessError::WorkingDir { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_set_umask_swaps_mask() {
        let original = set_umask(DAEMON_UMASK);
        let seen = set_umask(original);
        assert_eq!(seen, 0o002);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_forward_signals_installs() {
        let handle = ShutdownHandle::new();
        forward_signals(handle.clone()).unwrap();
        assert!(!handle.is_requested());
    }
}
