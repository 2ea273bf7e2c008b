//! Integration tests for the release pipeline
//!
//! Runs the relpack binary against temporary projects whose toolchain
//! programs are replaced with `true`/`false`:
//! - Platform selection and the nothing-built diagnostic
//! - Archive naming and contents per platform
//! - Failing builds leave no archive and stop the run
//! - Host gating skips stages
//! - Conflicting shells are restored after the run

#![cfg(unix)]

mod common;

use common::{current_host, TestProject, EMSCRIPTEN_ARCHIVE, WIN32_ARCHIVE};

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_win32_build_produces_named_archive() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&["Win32"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists(WIN32_ARCHIVE));
    assert!(!project.file_exists(EMSCRIPTEN_ARCHIVE));
    assert!(stdout(&output).contains(WIN32_ARCHIVE));
}

#[test]
fn test_win32_archive_layout() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&["Win32"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(
        project.archive_entries(WIN32_ARCHIVE),
        vec![
            "Data/Settings.cfg",
            "Resources/Fonts/Inconsolata.ttf",
            "Resources/ZeroLauncherResources/Splash.png",
            "ZeroEditor.exe",
        ]
    );
}

#[test]
fn test_emscripten_build_packages_single_page() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&["Emscripten32"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        project.archive_entries(EMSCRIPTEN_ARCHIVE),
        vec!["ZeroEditor.html"]
    );
}

#[test]
fn test_full_run_builds_every_platform() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists(WIN32_ARCHIVE));
    assert!(project.file_exists(EMSCRIPTEN_ARCHIVE));
    assert!(stdout(&output).contains("Built 2 of 2 platforms"));
}

#[test]
fn test_unknown_platform_builds_nothing() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&["Linux64"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No platforms were built. Was the passed in platform name valid?"));
    assert!(!project.file_exists(WIN32_ARCHIVE));
    assert!(!project.file_exists(EMSCRIPTEN_ARCHIVE));
}

#[test]
fn test_platform_selector_is_case_sensitive() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");

    let output = project.run(&["win32"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(!project.file_exists(WIN32_ARCHIVE));
}

#[test]
fn test_compile_failure_fails_run_without_archive() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "false", "true");

    let output = project.run(&[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed with exit code 1"));
    assert!(!project.file_exists(WIN32_ARCHIVE));
    assert!(!project.file_exists(&format!("{WIN32_ARCHIVE}.partial")));
    // The run stops at the first failure
    assert!(!project.file_exists(EMSCRIPTEN_ARCHIVE));
}

#[test]
fn test_missing_version_file_fails_stage() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");
    project.remove_file("Systems/Engine/BuildVersion.inl");

    let output = project.run(&["Win32"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("BuildVersion.inl"));
    assert!(!project.file_exists(WIN32_ARCHIVE));
}

#[test]
fn test_missing_source_directory_fails_packaging() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");
    std::fs::remove_dir_all(project.path().join("Data")).unwrap();

    let output = project.run(&["Win32"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("not a directory"));
    assert!(!project.file_exists(WIN32_ARCHIVE));
}

#[test]
fn test_other_host_skips_every_stage() {
    let project = TestProject::with_build_outputs();
    project.write_config("Plan9", "true", "true");

    let output = project.run(&[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("must be built on Plan9"));
    assert!(stderr(&output).contains("No platforms were built"));
    assert!(!project.file_exists(WIN32_ARCHIVE));
    assert!(!project.file_exists(EMSCRIPTEN_ARCHIVE));
}

#[test]
fn test_conflicting_shell_is_restored() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");
    project.create_file("Git/usr/bin/sh.exe", "shell");

    let output = project.run(&["Emscripten32"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists("Git/usr/bin/sh.exe"));
    assert!(!project.file_exists("Git/usr/bin/sh.exe.bak"));
}

#[test]
fn test_conflicting_shell_is_restored_after_failure() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "false");
    project.create_file("Git/usr/bin/sh.exe", "shell");

    let output = project.run(&["Emscripten32"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(project.file_exists("Git/usr/bin/sh.exe"));
    assert!(!project.file_exists(EMSCRIPTEN_ARCHIVE));
}

#[test]
fn test_archive_extension_from_config() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");
    let config = std::fs::read_to_string(project.path().join("relpack.toml")).unwrap();
    project.create_file(
        "relpack.toml",
        &format!("[pipeline]\narchive_extension = \"zerobuild\"\n{config}"),
    );

    let output = project.run(&["Win32"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists("Develop.1.4.0.847.5411767e62d3-Win32.zerobuild"));
}

#[test]
fn test_invalid_config_is_reported() {
    let project = TestProject::with_build_outputs();
    project.create_file("relpack.toml", "[win32]\nmax_cpus = 4\n");

    let output = project.run(&[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to parse config file"));
}

#[test]
fn test_config_comes_only_from_flag_or_working_directory() {
    let project = TestProject::with_build_outputs();
    project.write_config(&current_host(), "true", "true");
    project.create_file("broken.toml", "[win32]\nmax_cpus = 4\n");

    let output = project.run_with_env(&["Win32"], &[("RELPACK_CONFIG", "broken.toml")]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.file_exists(WIN32_ARCHIVE));
}
