//! Error types for relpack
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Version metadata errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Metadata file could not be read
    #[error("Failed to read version file '{path}': {error}")]
    MissingVersionFile { path: PathBuf, error: String },

    /// A required tag is absent from the metadata contents
    #[error("Version field '{tag}' not found in '{path}'")]
    MalformedVersionField { path: PathBuf, tag: String },
}

/// External process errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Process exited with a non-zero status
    #[error("Command '{command}' failed with exit code {exit_code}")]
    ExternalProcessFailure { command: String, exit_code: i32 },

    /// Process could not be started
    #[error("Failed to start '{command}': {error}")]
    ProcessSpawnFailed { command: String, error: String },

    /// Waiting on the process failed
    #[error("Failed waiting for '{command}': {error}")]
    WaitFailed { command: String, error: String },
}

/// Toolchain provisioning errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolchainError {
    /// An install/activate sub-step failed
    #[error("Toolchain provisioning failed for '{install_id}' during {step}: {source}")]
    ToolchainProvisioningFailed {
        install_id: String,
        step: String,
        source: ProcessError,
    },

    /// Install marker could not be written
    #[error("Failed to record install marker at '{path}': {error}")]
    MarkerWriteFailed { path: PathBuf, error: String },

    /// Conflicting shell executable could not be moved aside
    #[error("Failed to move conflicting shell '{path}' aside: {error}")]
    ShellRenameFailed { path: PathBuf, error: String },
}

/// Archive assembly errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// Directory source is missing or not a directory
    #[error("Attempting to archive '{path}' failed because it was not a directory")]
    SourceNotDirectory { path: PathBuf },

    /// Single-file source is missing
    #[error("Attempting to archive '{path}' failed because the file does not exist")]
    SourceNotFound { path: PathBuf },

    /// Two sources map to the same entry name
    #[error("Archive entry '{entry}' would be written twice (second source: '{path}')")]
    DuplicateEntry { entry: String, path: PathBuf },

    /// A file name cannot be stored as a zip entry name
    #[error("Cannot archive '{path}': file name is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },

    /// Any I/O or zip failure while writing
    #[error("Failed to write archive '{path}': {error}")]
    ArchiveWriteFailure { path: PathBuf, error: String },

    /// Assembly was abandoned before the archive was renamed into place
    #[error("Writing archive '{path}' was cancelled")]
    Cancelled { path: PathBuf },
}

/// Platform name that matches no build platform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Config file is not valid TOML for the expected schema
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },
}

/// Errors that abort a single platform stage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Version resolution failed
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A configure/compile command failed
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Provisioning failed
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Packaging failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Stage exceeded its time budget
    #[error("Stage '{platform}' timed out after {seconds}s")]
    StageTimedOut { platform: String, seconds: u64 },
}

/// Errors preparing a run
#[derive(Error, Debug)]
pub enum RelpackError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
