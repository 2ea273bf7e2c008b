//! Emscripten SDK provisioning
//!
//! Makes sure an emsdk checkout exists, has the requested SDK installed and
//! activated, and returns the environment commands need to use it.
//!
//! Provisioning is idempotent per install identifier:
//! - within one run, later calls return the cached environment;
//! - across runs, a completed install leaves a marker file in the SDK root
//!   and a root carrying the marker is used without running emsdk again.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::core::toolchain_env::{EmsdkLayout, ToolchainEnvironment};
use crate::error::{ProcessError, ToolchainError};
use crate::infra::process::{run_checked, CommandSpec, ProcessRunner};

/// emsdk driver script
#[cfg(windows)]
const EMSDK_SCRIPT: &str = "emsdk.bat";
#[cfg(not(windows))]
const EMSDK_SCRIPT: &str = "emsdk";

/// Marker written into the SDK root once `install_id` is activated
pub fn install_marker(root: &Path, install_id: &str) -> PathBuf {
    root.join(format!(".relpack-{install_id}"))
}

/// Installs and activates emscripten SDKs
#[derive(Debug, Default)]
pub struct EmsdkProvisioner {
    repository: String,
    provisioned: HashMap<String, ToolchainEnvironment>,
}

impl EmsdkProvisioner {
    /// Provisioner cloning from `repository`
    pub fn new(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            provisioned: HashMap::new(),
        }
    }

    /// Whether `install_id` was provisioned during this run
    pub fn is_provisioned(&self, install_id: &str) -> bool {
        self.provisioned.contains_key(install_id)
    }

    /// Provision the SDK described by `layout`
    ///
    /// `inherited` is the environment child processes start from; `cwd` is
    /// where the clone runs.
    pub async fn provision<R: ProcessRunner>(
        &mut self,
        runner: &R,
        layout: &EmsdkLayout,
        inherited: &BTreeMap<String, String>,
        cwd: &Path,
    ) -> Result<ToolchainEnvironment, ToolchainError> {
        let install_id = layout.install_id();
        if let Some(env) = self.provisioned.get(&install_id) {
            tracing::debug!("{install_id} already provisioned in this run");
            return Ok(env.clone());
        }

        let env = ToolchainEnvironment::for_emsdk(layout);
        let root = &layout.root;
        let marker = install_marker(root, &install_id);

        if root.is_dir() && marker.is_file() {
            tracing::info!("{install_id} already installed at {}", root.display());
            self.provisioned.insert(install_id, env.clone());
            return Ok(env);
        }

        let failed = |step: &str| {
            let install_id = install_id.clone();
            let step = step.to_string();
            move |source: ProcessError| ToolchainError::ToolchainProvisioningFailed {
                install_id,
                step,
                source,
            }
        };

        if root.exists() {
            let pull = CommandSpec::new("git", root).arg("pull");
            run_checked(runner, &pull).await.map_err(failed("git pull"))?;
        } else {
            // git creates the directory
            let clone = CommandSpec::new("git", cwd)
                .arg("clone")
                .arg(&self.repository)
                .arg(root.display().to_string());
            run_checked(runner, &clone).await.map_err(failed("git clone"))?;
        }

        let emsdk = root.join(EMSDK_SCRIPT).display().to_string();
        let steps: [(&str, Vec<String>); 3] = [
            ("update-tags", vec!["update-tags".to_string()]),
            (
                "install",
                vec!["install".to_string(), install_id.clone(), "--global".to_string()],
            ),
            (
                "activate",
                vec!["activate".to_string(), install_id.clone(), "--global".to_string()],
            ),
        ];
        for (step, args) in steps {
            let cmd = CommandSpec::new(emsdk.clone(), root)
                .args(args)
                .with_toolchain(&env, inherited);
            run_checked(runner, &cmd).await.map_err(failed(step))?;
        }

        std::fs::write(&marker, &install_id).map_err(|e| ToolchainError::MarkerWriteFailed {
            path: marker.clone(),
            error: e.to_string(),
        })?;
        tracing::info!("Provisioned {install_id} at {}", root.display());

        self.provisioned.insert(install_id, env.clone());
        Ok(env)
    }
}
