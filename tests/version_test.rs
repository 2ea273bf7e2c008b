//! Integration tests for version resolution and archive naming
//!
//! - Fields are read from build metadata by tag
//! - Missing or malformed fields name the tag
//! - Archive names follow `<prefix>.<version>-<platform>.<ext>`

mod common;

use common::{TestProject, SAMPLE_VERSION_FILE};
use proptest::prelude::*;
use relpack::core::platform::BuildPlatform;
use relpack::core::version::{parse_version_info, read_version_info};
use relpack::error::VersionError;
use std::path::Path;

#[test]
fn test_reads_sample_metadata() {
    let project = TestProject::new();
    project.create_file("BuildVersion.inl", SAMPLE_VERSION_FILE);

    let version = read_version_info(&project.path().join("BuildVersion.inl")).unwrap();

    assert_eq!(
        version.version_string(BuildPlatform::Win32),
        "1.4.0.847.5411767e62d3-Win32"
    );
    assert_eq!(
        version.archive_file_name(BuildPlatform::Emscripten32, "Develop", "zip"),
        "Develop.1.4.0.847.5411767e62d3-Emscripten32.zip"
    );
}

#[test]
fn test_missing_file() {
    let project = TestProject::new();
    let err = read_version_info(&project.path().join("BuildVersion.inl")).unwrap_err();
    assert!(matches!(err, VersionError::MissingVersionFile { .. }));
}

#[test]
fn test_missing_field_names_tag() {
    let contents = SAMPLE_VERSION_FILE.replace("ZeroRevisionId 847", "ZeroRevisionId");
    let err = parse_version_info(&contents, Path::new("BuildVersion.inl")).unwrap_err();
    assert_eq!(
        err,
        VersionError::MalformedVersionField {
            path: "BuildVersion.inl".into(),
            tag: "ZeroRevisionId".to_string(),
        }
    );
}

#[test]
fn test_non_hex_change_set_is_malformed() {
    let contents = SAMPLE_VERSION_FILE.replace("5411767e62d3", "zzzz");
    let err = parse_version_info(&contents, Path::new("BuildVersion.inl")).unwrap_err();
    assert!(matches!(
        err,
        VersionError::MalformedVersionField { tag, .. } if tag == "ZeroShortChangeSet"
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any well-formed metadata produces a name with the fields in order
    #[test]
    fn test_archive_name_from_fields(
        major in 0u32..100,
        minor in 0u32..100,
        patch in 0u32..100,
        revision in 0u32..100_000,
        hash in "[0-9a-f]{12}",
    ) {
        let contents = format!(
            "#define ZeroMajorVersion {major}\n#define ZeroMinorVersion {minor}\n#define ZeroPatchVersion {patch}\n#define ZeroRevisionId {revision}\n#define ZeroShortChangeSet {hash}\n"
        );
        let version = parse_version_info(&contents, Path::new("BuildVersion.inl")).unwrap();
        prop_assert_eq!(
            version.archive_file_name(BuildPlatform::Win32, "Develop", "zip"),
            format!("Develop.{major}.{minor}.{patch}.{revision}.{hash}-Win32.zip")
        );
    }
}
