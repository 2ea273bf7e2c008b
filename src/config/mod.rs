//! Configuration and constants
//!
//! Default values for every pipeline setting. Anything here can be
//! overridden from `relpack.toml` (see [`crate::core::config`]).

pub mod defaults;
pub mod urls;
