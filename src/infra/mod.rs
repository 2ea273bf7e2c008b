//! Infrastructure layer
//!
//! Handles I/O: external processes, archive files, SDK checkouts and
//! renames on the host filesystem.

pub mod archive;
pub mod emsdk;
pub mod process;
pub mod shell_guard;
