//! Archive inclusion predicates
//!
//! Predicates decide, from a file's directory (relative to the source root
//! being archived) and its file name, whether the file goes into a release
//! archive. They never touch the filesystem.

use std::path::Path;

/// Suffixes of build byproducts that never ship
pub const BYPRODUCT_SUFFIXES: [&str; 5] = [".pdb", ".ilk", ".exp", ".lib", ".wast"];

/// Build cache marker that never ships
pub const BUILD_CACHE_MARKER: &str = "BuildInfo.data";

/// Pure inclusion decision over `(relative directory, file name)`
pub trait InclusionPredicate {
    /// Whether the file should be written into the archive
    fn includes(&self, relative_dir: &Path, file_name: &str) -> bool;
}

/// Filter applied to a directory source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactFilter {
    /// Include everything
    All,
    /// Exclude build byproducts
    Artifacts,
    /// Exclude build byproducts and files two levels into the named resource folder
    EditorResources {
        /// Resource folder name, relative to the source root
        folder: String,
    },
}

impl InclusionPredicate for ArtifactFilter {
    fn includes(&self, relative_dir: &Path, file_name: &str) -> bool {
        match self {
            ArtifactFilter::All => true,
            ArtifactFilter::Artifacts => is_shippable(file_name),
            ArtifactFilter::EditorResources { folder } => {
                is_shippable(file_name) && !in_excluded_resource_dir(relative_dir, folder)
            }
        }
    }
}

/// Default byproduct rule (case-sensitive)
pub fn is_shippable(file_name: &str) -> bool {
    if file_name == BUILD_CACHE_MARKER {
        return false;
    }
    !BYPRODUCT_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// True when the parent of `relative_dir` is exactly `folder`
///
/// `ZeroLauncherResources/Icons` matches `ZeroLauncherResources`; the folder
/// itself and deeper directories do not.
pub fn in_excluded_resource_dir(relative_dir: &Path, folder: &str) -> bool {
    relative_dir
        .parent()
        .is_some_and(|parent| parent == Path::new(folder))
}
