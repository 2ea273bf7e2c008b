//! relpack CLI - release packaging pipeline
//!
//! Entry point for the relpack command-line application.

use anyhow::Result;
use clap::Parser;

use relpack::cli::output::{display_error, status};
use relpack::cli::Cli;

/// Exit code after Ctrl-C
const INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.output_config().init_tracing();

    // Dropping the pipeline future restores any shell moved aside and
    // kills running children.
    let exit_code = tokio::select! {
        result = cli.run() => match result {
            Ok(code) => code,
            Err(e) => {
                display_error(&e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("{} Interrupted", status::ERROR);
            INTERRUPTED
        }
    };

    std::process::exit(exit_code);
}
