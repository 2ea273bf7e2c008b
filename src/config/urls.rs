//! Source repository URLs

/// Emscripten SDK git repository
pub const EMSDK_REPOSITORY: &str = "https://github.com/juj/emsdk.git";
