//! Scoped removal of conflicting shell executables
//!
//! mingw32-make switches to POSIX shell semantics when an `sh.exe` is
//! reachable, which breaks the emscripten makefiles. The shell is renamed
//! to `<name>.bak` for the duration of the run and renamed back when the
//! guard is dropped, whether the run succeeds, fails, panics or is
//! interrupted.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::ToolchainError;

/// Restores a renamed file when dropped
#[derive(Debug)]
pub struct ShellRenameGuard {
    original: PathBuf,
    backup: PathBuf,
}

impl ShellRenameGuard {
    /// Rename `path` aside if it exists
    ///
    /// Returns `Ok(None)` when there is nothing to move.
    pub fn acquire(path: &Path) -> Result<Option<Self>, ToolchainError> {
        if !path.is_file() {
            return Ok(None);
        }

        let backup = backup_path(path);
        std::fs::rename(path, &backup).map_err(|e| ToolchainError::ShellRenameFailed {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::info!("Moved {} aside to {}", path.display(), backup.display());

        Ok(Some(Self {
            original: path.to_path_buf(),
            backup,
        }))
    }

    /// Location of the moved file
    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Original location
    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for ShellRenameGuard {
    fn drop(&mut self) {
        match std::fs::rename(&self.backup, &self.original) {
            Ok(()) => tracing::info!("Restored {}", self.original.display()),
            Err(e) => tracing::error!(
                "Failed to restore {} from {}: {e}",
                self.original.display(),
                self.backup.display()
            ),
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Conflicting shells: the known location plus every match on `search_path`
pub fn find_conflicting_shells(
    known: &Path,
    shell_name: &str,
    search_path: Option<&OsStr>,
    cwd: &Path,
) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if known.is_file() {
        found.push(known.to_path_buf());
    }
    if let Some(search_path) = search_path {
        if let Ok(matches) = which::which_in_all(shell_name, Some(search_path), cwd) {
            for candidate in matches {
                if !found.contains(&candidate) {
                    found.push(candidate);
                }
            }
        }
    }
    found
}

/// Move every conflicting shell aside, keeping the guards in `guards`
///
/// Guards acquired before a failure stay in `guards` and are restored by
/// their owner.
pub fn move_shells_aside(
    shells: &[PathBuf],
    guards: &mut Vec<ShellRenameGuard>,
) -> Result<(), ToolchainError> {
    for shell in shells {
        if guards.iter().any(|g| g.original() == shell) {
            continue;
        }
        if let Some(guard) = ShellRenameGuard::acquire(shell)? {
            guards.push(guard);
        }
    }
    Ok(())
}
