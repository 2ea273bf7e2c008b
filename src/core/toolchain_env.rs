//! Toolchain environment
//!
//! The environment a provisioned toolchain needs visible to every command of
//! a stage. It is never applied to the relpack process itself; each
//! [`crate::infra::process::CommandSpec`] receives it explicitly.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory layout of an emscripten SDK checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmsdkLayout {
    /// SDK root (e.g. `C:/emsdk`)
    pub root: PathBuf,
    /// Emscripten version (e.g. "1.38.12")
    pub version: String,
    /// Bundled node version directory
    pub node_version: String,
    /// Bundled python version directory
    pub python_version: String,
    /// Inner python directory
    pub python_dir: String,
    /// Bundled java version directory
    pub java_version: String,
    /// Emscripten config file
    pub em_config: PathBuf,
}

impl EmsdkLayout {
    /// Install identifier passed to `emsdk install/activate` (e.g. "sdk-1.38.12-64bit")
    pub fn install_id(&self) -> String {
        format!("sdk-{}-64bit", self.version)
    }

    /// Clang/LLVM directory
    pub fn clang_dir(&self) -> PathBuf {
        self.root.join("clang").join(format!("e{}_64bit", self.version))
    }

    /// Node binary directory
    pub fn node_bin_dir(&self) -> PathBuf {
        self.root.join("node").join(&self.node_version).join("bin")
    }

    /// Python directory
    pub fn python_dir(&self) -> PathBuf {
        self.root
            .join("python")
            .join(&self.python_version)
            .join(&self.python_dir)
    }

    /// Java home
    pub fn java_home(&self) -> PathBuf {
        self.root.join("java").join(&self.java_version)
    }

    /// Emscripten directory
    pub fn emscripten_dir(&self) -> PathBuf {
        self.root.join("emscripten").join(&self.version)
    }

    /// SDK root for an `EMSCRIPTEN` directory (two levels up)
    pub fn root_from_emscripten_dir(emscripten_dir: &Path) -> PathBuf {
        emscripten_dir.join("..").join("..")
    }
}

/// Environment exported by a provisioned toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainEnvironment {
    /// Install identifier this environment belongs to
    pub install_id: String,
    /// Variables set for child processes
    pub vars: BTreeMap<String, String>,
    /// Directories appended to `PATH`, in order
    pub path_additions: Vec<PathBuf>,
}

impl ToolchainEnvironment {
    /// Environment of a toolchain already configured by the caller's environment
    pub fn inherited(install_id: &str) -> Self {
        Self {
            install_id: install_id.to_string(),
            vars: BTreeMap::new(),
            path_additions: Vec::new(),
        }
    }

    /// Environment exported by an emscripten SDK installed at `layout.root`
    pub fn for_emsdk(layout: &EmsdkLayout) -> Self {
        let clang = layout.clang_dir();
        let node_bin = layout.node_bin_dir();
        let python = layout.python_dir();
        let java_home = layout.java_home();
        let emscripten = layout.emscripten_dir();

        Self::inherited(&layout.install_id())
            .with_path(layout.root.clone())
            .with_path(clang.clone())
            .with_path(node_bin.clone())
            .with_path(python.clone())
            .with_path(java_home.join("bin"))
            .with_path(emscripten.clone())
            .with_env("EMSDK", &layout.root.display().to_string())
            .with_env("EM_CONFIG", &layout.em_config.display().to_string())
            .with_env("LLVM_ROOT", &clang.display().to_string())
            .with_env(
                "EMSCRIPTEN_NATIVE_OPTIMIZER",
                &clang.join("optimizer.exe").display().to_string(),
            )
            .with_env("BINARYEN_ROOT", &clang.join("binaryen").display().to_string())
            .with_env("EMSDK_NODE", &node_bin.join("node.exe").display().to_string())
            .with_env(
                "EMSDK_PYTHON",
                &python.join("python.exe").display().to_string(),
            )
            .with_env("JAVA_HOME", &java_home.display().to_string())
            .with_env("EMSCRIPTEN", &emscripten.display().to_string())
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Append a directory to `PATH`
    #[must_use]
    pub fn with_path(mut self, dir: PathBuf) -> Self {
        if !self.path_additions.contains(&dir) {
            self.path_additions.push(dir);
        }
        self
    }

    /// Variables to set on a child process, given the environment it inherits
    ///
    /// `PATH` is the inherited value with the additions appended.
    pub fn to_env_map(&self, inherited: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut env = self.vars.clone();

        if !self.path_additions.is_empty() {
            let mut dirs: Vec<PathBuf> = inherited
                .get("PATH")
                .map(|p| std::env::split_paths(p).collect())
                .unwrap_or_default();
            for dir in &self.path_additions {
                if !dirs.contains(dir) {
                    dirs.push(dir.clone());
                }
            }
            let joined = std::env::join_paths(dirs)
                .unwrap_or_else(|_| OsString::from(inherited.get("PATH").cloned().unwrap_or_default()));
            env.insert("PATH".to_string(), joined.to_string_lossy().into_owned());
        }

        env
    }

    /// True when no variables or path additions are exported
    pub fn is_inherited(&self) -> bool {
        self.vars.is_empty() && self.path_additions.is_empty()
    }
}
