//! Build version resolution
//!
//! Reads the build metadata file emitted by the project's configure step and
//! derives the version string used to name release archives.
//!
//! The metadata file is free-form text; each field is located by its tag:
//!
//! ```text
//! #define ZeroMajorVersion 1
//! #define ZeroMinorVersion 4
//! #define ZeroPatchVersion 0
//! #define ZeroRevisionId 847
//! #define ZeroShortChangeSet 5411767e62d3
//! ```

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use crate::core::platform::BuildPlatform;
use crate::error::VersionError;

/// Tag and value pattern for each field, in field order
const FIELD_PATTERNS: [(&str, &str); 5] = [
    ("ZeroMajorVersion", "[0-9]+"),
    ("ZeroMinorVersion", "[0-9]+"),
    ("ZeroPatchVersion", "[0-9]+"),
    ("ZeroRevisionId", "[0-9]+"),
    ("ZeroShortChangeSet", "[0-9a-fA-F]+"),
];

fn field_regexes() -> &'static [(&'static str, Regex); 5] {
    static REGEXES: OnceLock<[(&'static str, Regex); 5]> = OnceLock::new();
    REGEXES.get_or_init(|| {
        FIELD_PATTERNS.map(|(tag, value)| {
            let regex = Regex::new(&format!("{tag} ({value})")).expect("Invalid field pattern");
            (tag, regex)
        })
    })
}

/// Structured build version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionInfo {
    /// Major version
    pub major: String,
    /// Minor version
    pub minor: String,
    /// Patch version
    pub patch: String,
    /// Monotonic revision id
    pub revision: String,
    /// Abbreviated changeset hash
    pub short_change_set: String,
}

impl VersionInfo {
    /// Platform independent prefix, including the trailing dash
    /// (for example: "1.4.0.847.5411767e62d3-")
    pub fn platform_independent(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}-",
            self.major, self.minor, self.patch, self.revision, self.short_change_set
        )
    }

    /// Full version string for a platform (for example: "1.4.0.847.5411767e62d3-Win32")
    pub fn version_string(&self, platform: BuildPlatform) -> String {
        format!("{}{platform}", self.platform_independent())
    }

    /// Archive file name: `<prefix>.<version string>.<extension>`
    pub fn archive_file_name(&self, platform: BuildPlatform, prefix: &str, extension: &str) -> String {
        format!("{prefix}.{}.{extension}", self.version_string(platform))
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{} ({})",
            self.major, self.minor, self.patch, self.revision, self.short_change_set
        )
    }
}

/// Extract the version fields from metadata contents
///
/// `path` is only used for error messages.
pub fn parse_version_info(contents: &str, path: &Path) -> Result<VersionInfo, VersionError> {
    let mut values = Vec::with_capacity(FIELD_PATTERNS.len());
    for (tag, regex) in field_regexes() {
        let value = regex
            .captures(contents)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| VersionError::MalformedVersionField {
                path: path.to_path_buf(),
                tag: (*tag).to_string(),
            })?;
        values.push(value);
    }

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    Ok(VersionInfo {
        major: next(),
        minor: next(),
        patch: next(),
        revision: next(),
        short_change_set: next(),
    })
}

/// Read and parse the build metadata file
pub fn read_version_info(path: &Path) -> Result<VersionInfo, VersionError> {
    tracing::info!("Reading {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| VersionError::MissingVersionFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    parse_version_info(&contents, path)
}
