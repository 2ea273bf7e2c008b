//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! Pipeline logic lives in [`crate::core`].

pub mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::defaults;
use crate::core::config::PipelineConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::stage::StageContext;
use crate::error::RelpackError;
use crate::infra::process::SystemRunner;
use output::{print_report, OutputConfig};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", ",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    ")"
);

/// relpack - build and package release archives
///
/// Builds the editor for every platform (or only PLATFORM) and packages
/// each build into `<prefix>.<version>-<platform>.<ext>` in the working
/// directory.
#[derive(Parser, Debug)]
#[command(name = "relpack")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Platform to build (Win32 or Emscripten32); all platforms when omitted
    pub platform: Option<String>,

    /// Config file (defaults to relpack.toml in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Output in JSON format for scripting
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Output settings for these flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.json, self.verbose)
    }

    /// Load the configuration and capture the process context
    fn prepare(&self) -> Result<(PipelineConfig, StageContext), RelpackError> {
        let ctx = StageContext::from_process()?;
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| ctx.work_dir.join(defaults::CONFIG_FILE_NAME));
        let config = PipelineConfig::load_from_path(&config_path)?;
        tracing::debug!(?config, "Resolved configuration");
        Ok((config, ctx))
    }

    /// Run the pipeline and return the process exit code
    pub async fn run(self) -> Result<i32> {
        let output = self.output_config();
        let (config, ctx) = self.prepare().context("Failed to prepare the run")?;

        let runner = SystemRunner;
        let report = Orchestrator::new(&config, &runner)
            .run(self.platform.as_deref(), &ctx)
            .await;

        print_report(&report, &output);
        Ok(report.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_selects_everything() {
        let cli = Cli::try_parse_from(["relpack"]).unwrap();
        assert!(cli.platform.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.json);
    }

    #[test]
    fn test_platform_and_flags() {
        let cli = Cli::try_parse_from(["relpack", "Win32", "-vv", "--json"]).unwrap();
        assert_eq!(cli.platform.as_deref(), Some("Win32"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
    }

    #[test]
    fn test_unknown_platform_is_accepted_by_parser() {
        // Selection happens in the orchestrator so the run can report it
        let cli = Cli::try_parse_from(["relpack", "Linux64"]).unwrap();
        assert_eq!(cli.platform.as_deref(), Some("Linux64"));
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::try_parse_from(["relpack", "--config", "ci/relpack.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci/relpack.toml")));
    }
}
