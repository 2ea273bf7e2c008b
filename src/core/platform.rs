//! Build platforms and host detection

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownPlatform;

/// A platform the pipeline can produce a release archive for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildPlatform {
    /// Native desktop build (msbuild)
    Win32,
    /// Web build (emscripten)
    Emscripten32,
}

impl BuildPlatform {
    /// All platforms, in the order a full run builds them
    pub const ALL: [BuildPlatform; 2] = [BuildPlatform::Win32, BuildPlatform::Emscripten32];

    /// Identifier used for selection and archive naming
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPlatform::Win32 => "Win32",
            BuildPlatform::Emscripten32 => "Emscripten32",
        }
    }
}

impl fmt::Display for BuildPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildPlatform {
    type Err = UnknownPlatform;

    // Exact, case-sensitive match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildPlatform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Host operating system, named the way build servers report it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum HostOs {
    /// Microsoft Windows
    Windows,
    /// Linux
    Linux,
    /// macOS
    Darwin,
    /// Anything else
    Other(String),
}

impl HostOs {
    /// Parse a host name as written in config files ("Windows", "Linux", "Darwin")
    pub fn from_name(name: &str) -> Self {
        match name {
            "Windows" => HostOs::Windows,
            "Linux" => HostOs::Linux,
            "Darwin" => HostOs::Darwin,
            other => HostOs::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Windows => write!(f, "Windows"),
            HostOs::Linux => write!(f, "Linux"),
            HostOs::Darwin => write!(f, "Darwin"),
            HostOs::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Detect the current host OS
pub fn detect_host_os() -> HostOs {
    match std::env::consts::OS {
        "windows" => HostOs::Windows,
        "linux" => HostOs::Linux,
        "macos" => HostOs::Darwin,
        other => HostOs::Other(other.to_string()),
    }
}
