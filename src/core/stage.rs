//! Platform build stages
//!
//! A stage takes one platform from sources to a release archive:
//!
//! ```text
//! Gated -> Provisioning -> Configuring -> Compiling -> Packaging -> Completed
//!   \-> Skipped (host mismatch)
//! ```
//!
//! [`StagePlan`] describes what a platform runs; [`StageExecutor`] runs it.
//! The first failing step aborts the stage; nothing after it runs and no
//! archive is written.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::PipelineConfig;
use crate::core::filter::ArtifactFilter;
use crate::core::platform::{detect_host_os, BuildPlatform, HostOs};
use crate::core::toolchain_env::{EmsdkLayout, ToolchainEnvironment};
use crate::core::version::{read_version_info, VersionInfo};
use crate::error::{ArchiveError, StageError};
use crate::infra::archive::{self, ArchiveSource, ArchiveSpec, ArchiveSummary, AssemblyCancel};
use crate::infra::emsdk::EmsdkProvisioner;
use crate::infra::process::{run_checked, CommandSpec, ProcessRunner};
use crate::infra::shell_guard::{find_conflicting_shells, move_shells_aside, ShellRenameGuard};

/// Stage lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Gated,
    Provisioning,
    Configuring,
    Compiling,
    Packaging,
    Completed,
    Skipped,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageState::Gated => "gated",
            StageState::Provisioning => "provisioning",
            StageState::Configuring => "configuring",
            StageState::Compiling => "compiling",
            StageState::Packaging => "packaging",
            StageState::Completed => "completed",
            StageState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

/// Everything a stage reads from its surroundings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageContext {
    /// Project root; commands run here and archives are written here
    pub work_dir: PathBuf,
    /// Host the pipeline runs on
    pub host: HostOs,
    /// Environment child processes inherit
    pub env: BTreeMap<String, String>,
}

impl StageContext {
    /// Context of the current process
    pub fn from_process() -> std::io::Result<Self> {
        Ok(Self {
            work_dir: std::env::current_dir()?,
            host: detect_host_os(),
            env: utf8_env(std::env::vars_os()),
        })
    }
}

/// UTF-8 view of an environment
///
/// Children still inherit a skipped variable from the process, but it takes
/// no part in toolchain `PATH` merging, so each one is logged.
fn utf8_env(vars: impl IntoIterator<Item = (OsString, OsString)>) -> BTreeMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let name = key.unwrap_or_else(|k| k.to_string_lossy().into_owned());
                tracing::warn!("Ignoring environment variable {name}: not valid UTF-8");
                None
            }
        })
        .collect()
}

/// How a stage obtains its toolchain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// Tools are already on the host
    Native,
    /// Emscripten SDK
    Emsdk {
        /// SDK layout
        layout: EmsdkLayout,
        /// False when the caller's environment already configures the SDK
        provision: bool,
    },
}

/// Shell executable to move out of the way before building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConflict {
    /// Known location
    pub known_path: PathBuf,
    /// File name searched on PATH
    pub name: String,
}

/// What one platform's stage runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    /// Platform built
    pub platform: BuildPlatform,
    /// Host the stage must run on
    pub required_host: HostOs,
    /// Toolchain source
    pub toolchain: Toolchain,
    /// Shell to move aside before configuring
    pub shell_conflict: Option<ShellConflict>,
    /// Project generation command
    pub configure: CommandSpec,
    /// Build command
    pub compile: CommandSpec,
    /// Archive contents
    pub package: Vec<ArchiveSource>,
    /// Build metadata file, relative to the work dir
    pub version_file: PathBuf,
    /// Archive name prefix
    pub archive_prefix: String,
    /// Archive extension
    pub archive_extension: String,
    /// Time budget for the whole stage
    pub timeout: Option<Duration>,
}

impl StagePlan {
    /// Plan for `platform`
    pub fn for_platform(platform: BuildPlatform, config: &PipelineConfig, ctx: &StageContext) -> Self {
        match platform {
            BuildPlatform::Win32 => Self::win32(config, ctx),
            BuildPlatform::Emscripten32 => Self::emscripten32(config, ctx),
        }
    }

    fn base(
        platform: BuildPlatform,
        required_host: HostOs,
        config: &PipelineConfig,
        configure: CommandSpec,
        compile: CommandSpec,
    ) -> Self {
        Self {
            platform,
            required_host,
            toolchain: Toolchain::Native,
            shell_conflict: None,
            configure,
            compile,
            package: Vec::new(),
            version_file: config.pipeline.version_file.clone(),
            archive_prefix: config.pipeline.archive_prefix.clone(),
            archive_extension: config.pipeline.archive_extension.clone(),
            timeout: config.pipeline.stage_timeout(),
        }
    }

    /// Native desktop stage: generate the solution, msbuild it, package
    /// resources, data and the compiled editor
    pub fn win32(config: &PipelineConfig, ctx: &StageContext) -> Self {
        let win32 = &config.win32;
        let work = &ctx.work_dir;

        let configure = CommandSpec::new(win32.generator.display().to_string(), work);
        let compile = CommandSpec::new(win32.msbuild.display().to_string(), work).args([
            "/verbosity:quiet".to_string(),
            format!("/maxcpucount:{}", win32.max_cpu_count),
            "/target:Build".to_string(),
            format!("/property:Configuration={}", win32.configuration),
            "/consoleloggerparameters:ErrorsOnly".to_string(),
            work.join(&win32.solution).display().to_string(),
        ]);

        let mut plan = Self::base(
            BuildPlatform::Win32,
            win32.required_host(),
            config,
            configure,
            compile,
        );
        plan.package = vec![
            ArchiveSource::directory(
                work.join(&win32.resources_dir),
                "Resources",
                ArtifactFilter::EditorResources {
                    folder: win32.resource_exclusion_folder.clone(),
                },
            ),
            ArchiveSource::directory(work.join(&win32.data_dir), "Data", ArtifactFilter::All),
            ArchiveSource::directory(work.join(&win32.build_output), "", ArtifactFilter::Artifacts),
        ];
        plan
    }

    /// Web stage: provision emsdk unless `EMSCRIPTEN` is set, move the
    /// conflicting shell aside, generate makefiles, emmake, package the page
    pub fn emscripten32(config: &PipelineConfig, ctx: &StageContext) -> Self {
        let em = &config.emscripten;
        let work = &ctx.work_dir;

        let toolchain = match ctx.env.get("EMSCRIPTEN") {
            Some(dir) => Toolchain::Emsdk {
                layout: em.layout(EmsdkLayout::root_from_emscripten_dir(Path::new(dir))),
                provision: false,
            },
            None => Toolchain::Emsdk {
                layout: em.layout(em.sdk_root.clone()),
                provision: true,
            },
        };

        let configure = CommandSpec::new(em.generator.display().to_string(), work);
        let compile = CommandSpec::new(em.emmake.clone(), work).args([
            em.make.clone(),
            "-j".to_string(),
            format!("--directory={}", work.join(&em.make_dir).display()),
        ]);

        let mut plan = Self::base(
            BuildPlatform::Emscripten32,
            em.required_host(),
            config,
            configure,
            compile,
        );
        plan.toolchain = toolchain;
        plan.shell_conflict = Some(ShellConflict {
            known_path: em.shell_path.clone(),
            name: em.shell_name.clone(),
        });
        plan.package = vec![ArchiveSource::file(work.join(&em.output_file))];
        plan
    }
}

/// Final state of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// Archive written
    Completed {
        /// Version the archive was named after
        version: VersionInfo,
        /// Archive details
        archive: ArchiveSummary,
    },
    /// Host does not match the platform's required host
    Skipped {
        /// Required host
        required: HostOs,
        /// Actual host
        actual: HostOs,
    },
    /// Stage aborted
    Failed(StageError),
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    /// Platform
    pub platform: BuildPlatform,
    /// Outcome
    pub outcome: StageOutcome,
}

impl StageResult {
    /// Whether the stage reached `Completed`
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, StageOutcome::Completed { .. })
    }

    /// Whether the stage was skipped for a host mismatch
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, StageOutcome::Skipped { .. })
    }

    /// Whether the stage failed
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, StageOutcome::Failed(_))
    }
}

/// Runs stage plans
///
/// Owns the per-run provisioning cache and the scoped shell renames; the
/// renames are undone when the executor is dropped.
pub struct StageExecutor<'a, R: ProcessRunner> {
    runner: &'a R,
    provisioner: EmsdkProvisioner,
    shell_guards: Vec<ShellRenameGuard>,
}

impl<'a, R: ProcessRunner> StageExecutor<'a, R> {
    /// Executor cloning emsdk from `repository` when needed
    pub fn new(runner: &'a R, repository: &str) -> Self {
        Self {
            runner,
            provisioner: EmsdkProvisioner::new(repository),
            shell_guards: Vec::new(),
        }
    }

    /// Shells currently moved aside
    pub fn shell_guards(&self) -> &[ShellRenameGuard] {
        &self.shell_guards
    }

    /// Gate and run a stage
    pub async fn run_stage(&mut self, plan: &StagePlan, ctx: &StageContext) -> StageResult {
        let platform = plan.platform;
        transition(platform, StageState::Gated);

        if plan.required_host != ctx.host {
            tracing::warn!(
                "{platform} must be built on {} (current is {})",
                plan.required_host,
                ctx.host
            );
            transition(platform, StageState::Skipped);
            return StageResult {
                platform,
                outcome: StageOutcome::Skipped {
                    required: plan.required_host.clone(),
                    actual: ctx.host.clone(),
                },
            };
        }
        tracing::info!("Building {platform} on {}", ctx.host);

        let executed = match plan.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(plan, ctx))
                .await
                .unwrap_or_else(|_| {
                    Err(StageError::StageTimedOut {
                        platform: platform.to_string(),
                        seconds: limit.as_secs(),
                    })
                }),
            None => self.execute(plan, ctx).await,
        };

        let outcome = match executed {
            Ok((version, archive)) => {
                transition(platform, StageState::Completed);
                StageOutcome::Completed { version, archive }
            }
            Err(error) => {
                tracing::error!("{platform} failed: {error}");
                StageOutcome::Failed(error)
            }
        };
        StageResult { platform, outcome }
    }

    async fn execute(
        &mut self,
        plan: &StagePlan,
        ctx: &StageContext,
    ) -> Result<(VersionInfo, ArchiveSummary), StageError> {
        let platform = plan.platform;

        let toolchain = match &plan.toolchain {
            Toolchain::Native => None,
            Toolchain::Emsdk {
                layout,
                provision: true,
            } => {
                transition(platform, StageState::Provisioning);
                let env = self
                    .provisioner
                    .provision(self.runner, layout, &ctx.env, &ctx.work_dir)
                    .await?;
                Some(env)
            }
            Toolchain::Emsdk {
                layout,
                provision: false,
            } => {
                tracing::info!("Using emscripten configured by the environment");
                Some(ToolchainEnvironment::inherited(&layout.install_id()))
            }
        };
        let with_toolchain = |cmd: &CommandSpec| match &toolchain {
            Some(env) => cmd.clone().with_toolchain(env, &ctx.env),
            None => cmd.clone(),
        };

        let configure = with_toolchain(&plan.configure);
        let compile = with_toolchain(&plan.compile);

        if let Some(conflict) = &plan.shell_conflict {
            let search_path = compile
                .env
                .get("PATH")
                .or_else(|| ctx.env.get("PATH"))
                .map(OsStr::new);
            let shells = find_conflicting_shells(
                &conflict.known_path,
                &conflict.name,
                search_path,
                &ctx.work_dir,
            );
            move_shells_aside(&shells, &mut self.shell_guards)?;
        }

        transition(platform, StageState::Configuring);
        run_checked(self.runner, &configure).await?;

        transition(platform, StageState::Compiling);
        run_checked(self.runner, &compile).await?;

        transition(platform, StageState::Packaging);
        let version = read_version_info(&ctx.work_dir.join(&plan.version_file))?;
        let file_name =
            version.archive_file_name(platform, &plan.archive_prefix, &plan.archive_extension);
        let spec = ArchiveSpec {
            output: ctx.work_dir.join(file_name),
            sources: plan.package.clone(),
        };
        tracing::info!("Outputting {}", spec.output.display());

        let guard = PackagingGuard::new(spec.output.clone());
        let cancel = Arc::clone(&guard.cancel);
        let output = spec.output.clone();
        let joined =
            tokio::task::spawn_blocking(move || archive::assemble_cancellable(&spec, &cancel))
                .await;
        guard.disarm();
        let summary = joined.map_err(|e| ArchiveError::ArchiveWriteFailure {
            path: output,
            error: e.to_string(),
        })??;

        Ok((version, summary))
    }
}

/// Abandons a packaging task whose stage future is dropped
///
/// The zip writer runs on a blocking thread that outlives a timed-out or
/// interrupted stage. Dropping an armed guard cancels it and removes
/// whatever it already wrote.
struct PackagingGuard {
    cancel: Arc<AssemblyCancel>,
    output: PathBuf,
    armed: bool,
}

impl PackagingGuard {
    fn new(output: PathBuf) -> Self {
        Self {
            cancel: Arc::new(AssemblyCancel::default()),
            output,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PackagingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!("Abandoning {}", self.output.display());
        if self.cancel.cancel() {
            archive::remove_if_present(&self.output);
        }
        archive::remove_if_present(&archive::partial_path(&self.output));
    }
}

fn transition(platform: BuildPlatform, state: StageState) {
    tracing::debug!(%platform, %state, "stage transition");
}
