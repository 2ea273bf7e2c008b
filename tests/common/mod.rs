//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary project tree shaped like the one relpack packages.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Project with version metadata, resources, data and build outputs
    /// for both platforms
    pub fn with_build_outputs() -> Self {
        let project = Self::new();
        project.create_file("Systems/Engine/BuildVersion.inl", SAMPLE_VERSION_FILE);
        project.create_file("Resources/Fonts/Inconsolata.ttf", "font");
        project.create_file("Resources/ZeroLauncherResources/Splash.png", "splash");
        project.create_file("Resources/ZeroLauncherResources/Icons/App.png", "icon");
        project.create_file("Data/Settings.cfg", "settings");
        project.create_file(&format!("{WIN32_OUTPUT}/ZeroEditor.exe"), "exe");
        project.create_file(&format!("{WIN32_OUTPUT}/ZeroEditor.pdb"), "pdb");
        project.create_file(&format!("{WIN32_OUTPUT}/BuildInfo.data"), "marker");
        project.create_file(
            "BuildOutput/Out/Emscripten/Debug/ZeroEditor/ZeroEditor.html",
            "<html></html>",
        );
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Remove a file from the test project
    pub fn remove_file(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    /// Write `relpack.toml` for a host where every tool succeeds
    ///
    /// `msbuild` and `emmake` name the programs used for compiling.
    pub fn write_config(&self, host: &str, msbuild: &str, emmake: &str) {
        let shell = self.dir.path().join("Git/usr/bin/sh.exe");
        self.create_file(
            "relpack.toml",
            &format!(
                r#"
[win32]
host = "{host}"
generator = "true"
msbuild = "{msbuild}"

[emscripten]
host = "{host}"
generator = "true"
emmake = "{emmake}"
shell_path = "{}"
"#,
                shell.display()
            ),
        );
    }

    /// Sorted entry names of an archive in the project
    pub fn archive_entries(&self, name: &str) -> Vec<String> {
        let file = File::open(self.dir.path().join(name)).expect("Failed to open archive");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("Bad entry").name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Run relpack in the project
    ///
    /// `EMSCRIPTEN` points at a fake SDK so no provisioning runs.
    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    /// Run relpack with extra environment variables
    pub fn run_with_env(&self, args: &[&str], vars: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_relpack"));
        cmd.current_dir(self.path());
        cmd.env_remove("RUST_LOG");
        cmd.env(
            "EMSCRIPTEN",
            self.dir.path().join("emsdk/emscripten/1.38.12"),
        );
        cmd.envs(vars.iter().copied());
        cmd.args(args);
        cmd.output().expect("Failed to execute relpack")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Host name relpack reports for the machine running the tests
pub fn current_host() -> String {
    relpack::core::platform::detect_host_os().to_string()
}

/// Win32 build output directory
pub const WIN32_OUTPUT: &str = "BuildOutput/Out/Windows_VS_2015/Release/ZeroEditor";

/// Win32 archive for [`SAMPLE_VERSION_FILE`]
pub const WIN32_ARCHIVE: &str = "Develop.1.4.0.847.5411767e62d3-Win32.zip";

/// Emscripten32 archive for [`SAMPLE_VERSION_FILE`]
pub const EMSCRIPTEN_ARCHIVE: &str = "Develop.1.4.0.847.5411767e62d3-Emscripten32.zip";

/// Sample build metadata
pub const SAMPLE_VERSION_FILE: &str = r#"
#define ZeroMajorVersion 1
#define ZeroMinorVersion 4
#define ZeroPatchVersion 0
#define ZeroRevisionId 847
#define ZeroShortChangeSet 5411767e62d3
#define ZeroChangeSet 5411767e62d3a1b2c3d4
"#;
