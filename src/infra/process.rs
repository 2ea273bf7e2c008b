//! External process execution
//!
//! Runs toolchain commands with an explicit working directory and
//! environment. Output is passed straight through to the terminal.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::core::toolchain_env::ToolchainEnvironment;
use crate::error::ProcessError;

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name, relative path or absolute path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Variables set on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Create a command running in `cwd`
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: BTreeMap::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Apply a toolchain environment on top of `inherited`
    #[must_use]
    pub fn with_toolchain(
        mut self,
        toolchain: &ToolchainEnvironment,
        inherited: &BTreeMap<String, String>,
    ) -> Self {
        self.env.extend(toolchain.to_env_map(inherited));
        self
    }

    /// Program path to execute
    ///
    /// Paths are taken relative to the working directory; bare names are
    /// looked up on the effective `PATH`. Unresolvable names are returned
    /// as-is so the spawn error names them.
    pub fn resolve_program(&self) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_absolute() {
            return program.to_path_buf();
        }
        if program.components().count() > 1 {
            return self.cwd.join(program);
        }

        let search_path: Option<OsString> = self
            .env
            .get("PATH")
            .map(OsString::from)
            .or_else(|| std::env::var_os("PATH"));
        which::which_in(&self.program, search_path, &self.cwd)
            .unwrap_or_else(|_| program.to_path_buf())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands and reports their exit code
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and return the exit code
    ///
    /// Termination by signal is reported as exit code -1.
    fn run(&self, command: &CommandSpec) -> impl Future<Output = Result<i32, ProcessError>> + Send;
}

/// Run a command and treat any non-zero exit code as a failure
pub async fn run_checked<R: ProcessRunner>(
    runner: &R,
    command: &CommandSpec,
) -> Result<(), ProcessError> {
    tracing::info!("Running {command} (in {})", command.cwd.display());
    let exit_code = runner.run(command).await?;
    if exit_code == 0 {
        tracing::debug!("Completed {command}");
        Ok(())
    } else {
        Err(ProcessError::ExternalProcessFailure {
            command: command.to_string(),
            exit_code,
        })
    }
}

/// Runner backed by real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<i32, ProcessError> {
        let program = command.resolve_program();
        tracing::debug!("Resolved {} to {}", command.program, program.display());

        let mut child = tokio::process::Command::new(&program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .envs(&command.env)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::ProcessSpawnFailed {
                command: command.to_string(),
                error: e.to_string(),
            })?;

        let status = child.wait().await.map_err(|e| ProcessError::WaitFailed {
            command: command.to_string(),
            error: e.to_string(),
        })?;

        Ok(status.code().unwrap_or(-1))
    }
}
