//! relpack - release packaging pipeline
//!
//! Builds a multi-platform project and packages each platform's output
//! into a versioned archive.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Platforms, versions, filters, stages and orchestration
//! - [`infra`] - Infrastructure layer (processes, archives, SDK provisioning)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
