//! Pipeline orchestration
//!
//! Selects the platforms to build, runs their stages one after another and
//! reports the run. The first failing stage stops the run.

use crate::core::config::PipelineConfig;
use crate::core::platform::BuildPlatform;
use crate::core::stage::{StageContext, StageExecutor, StagePlan, StageResult};
use crate::infra::process::ProcessRunner;

/// Shown when a run produced no archive
pub const NOTHING_BUILT: &str = "No platforms were built. Was the passed in platform name valid?";

/// Platforms matching `selector`
///
/// No selector selects every platform in build order. Otherwise the
/// selector must equal a platform identifier exactly; anything else
/// selects nothing.
pub fn select_platforms(selector: Option<&str>) -> Vec<BuildPlatform> {
    match selector {
        None => BuildPlatform::ALL.to_vec(),
        Some(name) => name
            .parse::<BuildPlatform>()
            .map(|p| vec![p])
            .unwrap_or_default(),
    }
}

/// Overall result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every selected stage completed
    Completed,
    /// No stage failed, some were skipped for their host
    PartiallySkipped,
    /// A stage failed
    Failed,
    /// The selector matched no platform
    NothingSelected,
}

impl PipelineStatus {
    /// Process exit code
    pub fn exit_code(self) -> i32 {
        match self {
            PipelineStatus::Completed | PipelineStatus::PartiallySkipped => 0,
            PipelineStatus::Failed => 1,
            PipelineStatus::NothingSelected => 2,
        }
    }
}

/// Report of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Selector the run was started with
    pub selector: Option<String>,
    /// Platforms the selector matched
    pub selected: Vec<BuildPlatform>,
    /// Results of the stages that ran, in order
    pub results: Vec<StageResult>,
}

impl PipelineReport {
    /// Number of archives produced
    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    /// Number of stages skipped for their host
    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }

    /// The failed stage, if any
    pub fn failure(&self) -> Option<&StageResult> {
        self.results.iter().find(|r| r.is_failed())
    }

    /// Platforms not attempted because an earlier stage failed
    pub fn not_attempted(&self) -> Vec<BuildPlatform> {
        self.selected
            .iter()
            .filter(|p| !self.results.iter().any(|r| r.platform == **p))
            .copied()
            .collect()
    }

    /// Overall status
    pub fn status(&self) -> PipelineStatus {
        if self.selected.is_empty() {
            PipelineStatus::NothingSelected
        } else if self.failure().is_some() {
            PipelineStatus::Failed
        } else if self.completed_count() == self.selected.len() {
            PipelineStatus::Completed
        } else {
            PipelineStatus::PartiallySkipped
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }
}

/// Runs the selected platform stages
pub struct Orchestrator<'a, R: ProcessRunner> {
    config: &'a PipelineConfig,
    runner: &'a R,
}

impl<'a, R: ProcessRunner> Orchestrator<'a, R> {
    /// Orchestrator running commands through `runner`
    pub fn new(config: &'a PipelineConfig, runner: &'a R) -> Self {
        Self { config, runner }
    }

    /// Run every stage the selector matches
    ///
    /// Shells moved aside during the run are restored before this returns,
    /// or when the returned future is dropped.
    pub async fn run(&self, selector: Option<&str>, ctx: &StageContext) -> PipelineReport {
        let selected = select_platforms(selector);
        let mut executor = StageExecutor::new(self.runner, &self.config.emscripten.repository);
        let mut results = Vec::with_capacity(selected.len());

        for platform in &selected {
            let plan = StagePlan::for_platform(*platform, self.config, ctx);
            let result = executor.run_stage(&plan, ctx).await;
            let failed = result.is_failed();
            results.push(result);
            if failed {
                break;
            }
        }
        drop(executor);

        let report = PipelineReport {
            selector: selector.map(str::to_string),
            selected,
            results,
        };
        tracing::info!(
            "Built {} of {} selected platforms",
            report.completed_count(),
            report.selected.len()
        );
        report
    }
}
