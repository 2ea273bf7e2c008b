//! Core pipeline logic
//!
//! # Submodules
//!
//! - [`platform`] - Build platforms and host detection
//! - [`version`] - Build metadata parsing and archive naming
//! - [`filter`] - Archive inclusion predicates
//! - [`toolchain_env`] - Toolchain environment for child processes
//! - [`config`] - Pipeline configuration (relpack.toml)
//! - [`stage`] - Per-platform build stages
//! - [`orchestrator`] - Platform selection and sequential execution

pub mod config;
pub mod filter;
pub mod orchestrator;
pub mod platform;
pub mod stage;
pub mod toolchain_env;
pub mod version;
