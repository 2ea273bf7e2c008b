//! Output formatting
//!
//! Human-readable status lines, the `--json` report and error display.

use serde_json::{json, Value};

use crate::core::orchestrator::{PipelineReport, PipelineStatus, NOTHING_BUILT};
use crate::core::stage::{StageOutcome, StageResult};

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// Output settings from the global flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputConfig {
    /// Only errors
    pub quiet: bool,
    /// Machine-readable report on stdout
    pub json: bool,
    /// Verbosity count
    pub verbose: u8,
}

impl OutputConfig {
    /// Output config from the flags
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Base log level: warnings by default, `-v` for info, `-vv` for debug
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }

    /// Install the tracing subscriber
    ///
    /// `RUST_LOG` directives are honored on top of the base level. Logs go
    /// to stderr so `--json` output stays parseable.
    pub fn init_tracing(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(self.log_level().into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// One status line for a stage
pub fn stage_line(result: &StageResult) -> String {
    let platform = result.platform;
    match &result.outcome {
        StageOutcome::Completed { archive, .. } => format!(
            "{} {platform}: {} ({} files, {} bytes, sha256 {})",
            status::SUCCESS,
            archive.path.display(),
            archive.entries,
            archive.size_bytes,
            archive.sha256
        ),
        StageOutcome::Skipped { required, actual } => format!(
            "{} {platform}: skipped, must be built on {required} (current is {actual})",
            status::WARNING
        ),
        StageOutcome::Failed(error) => format!("{} {platform}: {error}", status::ERROR),
    }
}

/// Closing summary line
pub fn summary_line(report: &PipelineReport) -> String {
    match report.status() {
        PipelineStatus::NothingSelected => format!("{} {NOTHING_BUILT}", status::ERROR),
        PipelineStatus::Failed => format!(
            "{} Build failed after {} of {} platforms",
            status::ERROR,
            report.completed_count(),
            report.selected.len()
        ),
        PipelineStatus::Completed => format!(
            "{} Built {} of {} platforms",
            status::SUCCESS,
            report.completed_count(),
            report.selected.len()
        ),
        PipelineStatus::PartiallySkipped if report.completed_count() == 0 => {
            format!("{} {NOTHING_BUILT}", status::WARNING)
        }
        PipelineStatus::PartiallySkipped => format!(
            "{} Built {} of {} platforms ({} skipped)",
            status::WARNING,
            report.completed_count(),
            report.selected.len(),
            report.skipped_count()
        ),
    }
}

/// Machine-readable report
pub fn report_json(report: &PipelineReport) -> Value {
    let stages: Vec<Value> = report
        .results
        .iter()
        .map(|result| match &result.outcome {
            StageOutcome::Completed { version, archive } => json!({
                "platform": result.platform,
                "outcome": "completed",
                "version": version.version_string(result.platform),
                "archive": archive.path.display().to_string(),
                "entries": archive.entries,
                "size_bytes": archive.size_bytes,
                "sha256": archive.sha256,
            }),
            StageOutcome::Skipped { required, actual } => json!({
                "platform": result.platform,
                "outcome": "skipped",
                "required_host": required,
                "host": actual,
            }),
            StageOutcome::Failed(error) => json!({
                "platform": result.platform,
                "outcome": "failed",
                "error": error.to_string(),
            }),
        })
        .collect();

    json!({
        "selector": report.selector,
        "completed": report.completed_count(),
        "exit_code": report.exit_code(),
        "stages": stages,
        "not_attempted": report.not_attempted(),
    })
}

/// Print the run report
pub fn print_report(report: &PipelineReport, output: &OutputConfig) {
    if output.json {
        println!("{:#}", report_json(report));
        return;
    }

    for result in &report.results {
        let line = stage_line(result);
        if result.is_failed() {
            eprintln!("{line}");
        } else if !output.quiet {
            println!("{line}");
        }
    }
    for platform in report.not_attempted() {
        if !output.quiet && report.status() == PipelineStatus::Failed {
            println!("{} {platform}: not attempted", status::INFO);
        }
    }

    let summary = summary_line(report);
    if report.completed_count() == 0 || report.status() == PipelineStatus::Failed {
        eprintln!("{summary}");
    } else if !output.quiet {
        println!("{summary}");
    }
}

/// Print an error and its causes
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
