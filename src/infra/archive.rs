//! Release archive assembly
//!
//! Writes directory trees and single files into one deflate-compressed zip.
//! The archive is built next to its destination as `<name>.partial` and only
//! renamed into place once every source has been written, so a failed
//! packaging step never leaves an archive behind.
//!
//! An [`AssemblyCancel`] shared with another thread abandons the write: the
//! writer stops before its next entry and never renames the partial file.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::filter::{ArtifactFilter, InclusionPredicate};
use crate::error::ArchiveError;

/// One input of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// Every file under `root` passing `filter`, written under `prefix`
    Directory {
        /// Directory to walk
        root: PathBuf,
        /// Entry name prefix; empty writes at the archive root
        prefix: String,
        /// Inclusion predicate
        filter: ArtifactFilter,
    },
    /// A single file
    File {
        /// File to write
        path: PathBuf,
        /// Entry name; defaults to the file name
        entry_name: Option<String>,
    },
}

impl ArchiveSource {
    /// Directory source
    pub fn directory(root: impl Into<PathBuf>, prefix: &str, filter: ArtifactFilter) -> Self {
        Self::Directory {
            root: root.into(),
            prefix: prefix.to_string(),
            filter,
        }
    }

    /// Single-file source stored at its file name
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            entry_name: None,
        }
    }

    fn validate(&self) -> Result<(), ArchiveError> {
        match self {
            Self::Directory { root, .. } if !root.is_dir() => {
                Err(ArchiveError::SourceNotDirectory { path: root.clone() })
            }
            Self::File { path, .. } if !path.is_file() => {
                Err(ArchiveError::SourceNotFound { path: path.clone() })
            }
            _ => Ok(()),
        }
    }
}

/// Archive to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    /// Destination file
    pub output: PathBuf,
    /// Sources, written in order
    pub sources: Vec<ArchiveSource>,
}

/// Result of a successful assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Destination file
    pub path: PathBuf,
    /// Number of files written
    pub entries: usize,
    /// Archive size in bytes
    pub size_bytes: u64,
    /// Hex SHA-256 of the archive
    pub sha256: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum AssemblyState {
    #[default]
    Writing,
    Cancelled,
    Committed,
}

/// Cancellation handle for an assembly running on another thread
///
/// The rename into place and [`AssemblyCancel::cancel`] take the same lock,
/// so an assembly is either abandoned before its archive appears or the
/// canceller learns that the archive already landed.
#[derive(Debug, Default)]
pub struct AssemblyCancel {
    state: Mutex<AssemblyState>,
}

impl AssemblyCancel {
    /// Abandon the assembly
    ///
    /// Returns true when the archive had already been renamed into place.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        let committed = *state == AssemblyState::Committed;
        *state = AssemblyState::Cancelled;
        committed
    }

    /// Whether [`AssemblyCancel::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        *self.lock() == AssemblyState::Cancelled
    }

    fn ensure_writing(&self, output: &Path) -> Result<(), ArchiveError> {
        if self.is_cancelled() {
            return Err(ArchiveError::Cancelled {
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }

    fn commit(&self, partial: &Path, output: &Path) -> Result<(), ArchiveError> {
        let mut state = self.lock();
        if *state == AssemblyState::Cancelled {
            return Err(ArchiveError::Cancelled {
                path: output.to_path_buf(),
            });
        }
        fs::rename(partial, output).map_err(|e| write_failure(output, &e))?;
        *state = AssemblyState::Committed;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, AssemblyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write an archive
pub fn assemble(spec: &ArchiveSpec) -> Result<ArchiveSummary, ArchiveError> {
    assemble_cancellable(spec, &AssemblyCancel::default())
}

/// Write an archive unless `cancel` fires first
///
/// A cancelled assembly returns [`ArchiveError::Cancelled`] and leaves
/// neither the archive nor its partial file behind.
pub fn assemble_cancellable(
    spec: &ArchiveSpec,
    cancel: &AssemblyCancel,
) -> Result<ArchiveSummary, ArchiveError> {
    for source in &spec.sources {
        source.validate()?;
    }

    let partial = partial_path(&spec.output);
    let written = write_archive(spec, &partial, cancel).and_then(|entries| {
        cancel.commit(&partial, &spec.output)?;
        Ok(entries)
    });
    let entries = match written {
        Ok(entries) => entries,
        Err(e) => {
            remove_if_present(&partial);
            return Err(e);
        }
    };

    let size_bytes = fs::metadata(&spec.output)
        .map_err(|e| write_failure(&spec.output, &e))?
        .len();
    let sha256 = sha256_file(&spec.output).map_err(|e| write_failure(&spec.output, &e))?;

    tracing::info!(
        "Wrote {} ({entries} files, {size_bytes} bytes)",
        spec.output.display()
    );

    Ok(ArchiveSummary {
        path: spec.output.clone(),
        entries,
        size_bytes,
        sha256,
    })
}

/// Remove `path`, ignoring a file that is already gone
pub fn remove_if_present(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {e}", path.display());
        }
    }
}

/// Where the archive for `output` is written before it is renamed
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    output.with_file_name(name)
}

fn write_failure(path: &Path, error: &dyn std::fmt::Display) -> ArchiveError {
    ArchiveError::ArchiveWriteFailure {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

fn write_archive(
    spec: &ArchiveSpec,
    partial: &Path,
    cancel: &AssemblyCancel,
) -> Result<usize, ArchiveError> {
    cancel.ensure_writing(&spec.output)?;
    let file = File::create(partial).map_err(|e| write_failure(partial, &e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut written: HashSet<String> = HashSet::new();

    for source in &spec.sources {
        match source {
            ArchiveSource::Directory {
                root,
                prefix,
                filter,
            } => {
                for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
                    let entry = entry.map_err(|e| write_failure(root, &e))?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let relative = entry
                        .path()
                        .strip_prefix(root)
                        .map_err(|e| write_failure(entry.path(), &e))?;
                    let relative_dir = relative.parent().unwrap_or_else(|| Path::new(""));
                    let file_name = utf8_name(entry.file_name(), entry.path())?;
                    if !filter.includes(relative_dir, file_name) {
                        tracing::debug!("Skipping {}", entry.path().display());
                        continue;
                    }
                    let name = entry_name(prefix, relative)
                        .ok_or_else(|| ArchiveError::NonUtf8Path {
                            path: entry.path().to_path_buf(),
                        })?;
                    cancel.ensure_writing(&spec.output)?;
                    add_file(&mut zip, options, &mut written, entry.path(), name, partial)?;
                }
            }
            ArchiveSource::File { path, entry_name } => {
                let name = match entry_name {
                    Some(name) => name.clone(),
                    None => path
                        .file_name()
                        .map(|n| utf8_name(n, path).map(str::to_string))
                        .transpose()?
                        .unwrap_or_default(),
                };
                cancel.ensure_writing(&spec.output)?;
                add_file(&mut zip, options, &mut written, path, name, partial)?;
            }
        }
    }

    zip.finish().map_err(|e| write_failure(partial, &e))?;
    Ok(written.len())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    options: SimpleFileOptions,
    written: &mut HashSet<String>,
    path: &Path,
    name: String,
    partial: &Path,
) -> Result<(), ArchiveError> {
    if !written.insert(name.clone()) {
        return Err(ArchiveError::DuplicateEntry {
            entry: name,
            path: path.to_path_buf(),
        });
    }
    tracing::debug!("Adding {} as {name}", path.display());

    zip.start_file(name, options)
        .map_err(|e| write_failure(partial, &e))?;
    let mut input = BufReader::new(File::open(path).map_err(|e| write_failure(path, &e))?);
    io::copy(&mut input, zip).map_err(|e| write_failure(partial, &e))?;
    Ok(())
}

fn utf8_name<'a>(name: &'a OsStr, path: &Path) -> Result<&'a str, ArchiveError> {
    name.to_str().ok_or_else(|| ArchiveError::NonUtf8Path {
        path: path.to_path_buf(),
    })
}

/// Entry name for `relative` under `prefix`, always with forward slashes
///
/// `None` when a component of `relative` is not valid UTF-8.
pub fn entry_name(prefix: &str, relative: &Path) -> Option<String> {
    let mut parts: Vec<&str> = prefix.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut input = BufReader::new(File::open(path)?);
    io::copy(&mut input, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
