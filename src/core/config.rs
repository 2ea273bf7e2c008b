//! Pipeline configuration
//!
//! Reads `relpack.toml`. Every setting has a default, so a project without
//! a config file builds with the stock layout.
//!
//! ```toml
//! [pipeline]
//! archive_extension = "zerobuild"
//! stage_timeout_secs = 5400
//!
//! [emscripten]
//! sdk_root = "D:/emsdk"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::defaults;
use crate::config::urls;
use crate::core::platform::HostOs;
use crate::core::toolchain_env::EmsdkLayout;
use crate::error::ConfigError;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Settings shared by all stages
    #[serde(default)]
    pub pipeline: GeneralConfig,

    /// Native desktop stage
    #[serde(default)]
    pub win32: Win32Config,

    /// Web stage
    #[serde(default)]
    pub emscripten: EmscriptenConfig,
}

/// Settings shared by all stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// Build metadata file
    pub version_file: PathBuf,
    /// Archive name prefix
    pub archive_prefix: String,
    /// Archive extension
    pub archive_extension: String,
    /// Per-stage timeout, 0 disables
    pub stage_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            version_file: PathBuf::from(defaults::VERSION_FILE),
            archive_prefix: defaults::ARCHIVE_PREFIX.to_string(),
            archive_extension: defaults::ARCHIVE_EXTENSION.to_string(),
            stage_timeout_secs: defaults::STAGE_TIMEOUT_SECS,
        }
    }
}

impl GeneralConfig {
    /// Stage timeout, if enabled
    pub fn stage_timeout(&self) -> Option<Duration> {
        (self.stage_timeout_secs > 0).then(|| Duration::from_secs(self.stage_timeout_secs))
    }
}

/// Native desktop stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Win32Config {
    /// Host OS the stage must run on
    pub host: String,
    /// Project generator script
    pub generator: PathBuf,
    /// msbuild executable
    pub msbuild: PathBuf,
    /// Solution to build
    pub solution: PathBuf,
    /// msbuild `/maxcpucount`
    pub max_cpu_count: u32,
    /// msbuild configuration
    pub configuration: String,
    /// Resource tree
    pub resources_dir: PathBuf,
    /// Data tree
    pub data_dir: PathBuf,
    /// Compiled output directory
    pub build_output: PathBuf,
    /// Resource folder excluded two levels deep
    pub resource_exclusion_folder: String,
}

impl Default for Win32Config {
    fn default() -> Self {
        Self {
            host: defaults::REQUIRED_HOST.to_string(),
            generator: PathBuf::from(defaults::WIN32_GENERATOR),
            msbuild: PathBuf::from(defaults::MSBUILD_PATH),
            solution: PathBuf::from(defaults::WIN32_SOLUTION),
            max_cpu_count: defaults::MSBUILD_MAX_CPU_COUNT,
            configuration: defaults::MSBUILD_CONFIGURATION.to_string(),
            resources_dir: PathBuf::from(defaults::RESOURCES_DIR),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            build_output: PathBuf::from(defaults::WIN32_BUILD_OUTPUT),
            resource_exclusion_folder: defaults::RESOURCE_EXCLUSION_FOLDER.to_string(),
        }
    }
}

impl Win32Config {
    /// Required host OS
    pub fn required_host(&self) -> HostOs {
        HostOs::from_name(&self.host)
    }
}

/// Web stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmscriptenConfig {
    /// Host OS the stage must run on
    pub host: String,
    /// Emscripten SDK version
    pub version: String,
    /// SDK root used when `EMSCRIPTEN` is not set
    pub sdk_root: PathBuf,
    /// SDK git repository
    pub repository: String,
    /// `EM_CONFIG` value
    pub em_config: PathBuf,
    /// Bundled node version
    pub node_version: String,
    /// Bundled python version
    pub python_version: String,
    /// Bundled python inner directory
    pub python_dir: String,
    /// Bundled java version
    pub java_version: String,
    /// Known location of a conflicting shell executable
    pub shell_path: PathBuf,
    /// Conflicting shell file name searched on PATH
    pub shell_name: String,
    /// Cross-compiling project generator script
    pub generator: PathBuf,
    /// emmake wrapper
    pub emmake: String,
    /// make program run by emmake
    pub make: String,
    /// Directory with the generated makefiles
    pub make_dir: PathBuf,
    /// File packaged into the archive
    pub output_file: PathBuf,
}

impl Default for EmscriptenConfig {
    fn default() -> Self {
        Self {
            host: defaults::REQUIRED_HOST.to_string(),
            version: defaults::EMSCRIPTEN_VERSION.to_string(),
            sdk_root: PathBuf::from(defaults::EMSDK_ROOT),
            repository: urls::EMSDK_REPOSITORY.to_string(),
            em_config: PathBuf::from(defaults::EM_CONFIG),
            node_version: defaults::EMSDK_NODE_VERSION.to_string(),
            python_version: defaults::EMSDK_PYTHON_VERSION.to_string(),
            python_dir: defaults::EMSDK_PYTHON_DIR.to_string(),
            java_version: defaults::EMSDK_JAVA_VERSION.to_string(),
            shell_path: PathBuf::from(defaults::CONFLICTING_SHELL_PATH),
            shell_name: defaults::CONFLICTING_SHELL_NAME.to_string(),
            generator: PathBuf::from(defaults::EMSCRIPTEN_GENERATOR),
            emmake: defaults::EMMAKE_PROGRAM.to_string(),
            make: defaults::MAKE_PROGRAM.to_string(),
            make_dir: PathBuf::from(defaults::EMSCRIPTEN_MAKE_DIR),
            output_file: PathBuf::from(defaults::EMSCRIPTEN_OUTPUT_FILE),
        }
    }
}

impl EmscriptenConfig {
    /// Required host OS
    pub fn required_host(&self) -> HostOs {
        HostOs::from_name(&self.host)
    }

    /// SDK layout rooted at `root`
    pub fn layout(&self, root: PathBuf) -> EmsdkLayout {
        EmsdkLayout {
            root,
            version: self.version.clone(),
            node_version: self.node_version.clone(),
            python_version: self.python_version.clone(),
            python_dir: self.python_dir.clone(),
            java_version: self.java_version.clone(),
            em_config: self.em_config.clone(),
        }
    }
}

impl PipelineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from a path
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Self::from_toml(&content, path)
    }
}
