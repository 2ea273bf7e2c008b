//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use crate::core::version::VersionInfo;
    use proptest::prelude::*;

    /// Generate a decimal version component
    pub fn version_number() -> impl Strategy<Value = String> {
        "[0-9]{1,4}"
    }

    /// Generate an abbreviated changeset hash
    pub fn short_change_set() -> impl Strategy<Value = String> {
        "[0-9a-f]{6,12}"
    }

    /// Generate a well-formed version
    pub fn version_info() -> impl Strategy<Value = VersionInfo> {
        (
            version_number(),
            version_number(),
            version_number(),
            version_number(),
            short_change_set(),
        )
            .prop_map(|(major, minor, patch, revision, short_change_set)| VersionInfo {
                major,
                minor,
                patch,
                revision,
                short_change_set,
            })
    }

    /// Generate a plain file stem
    pub fn file_stem() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9_]{0,12}"
    }

    /// Generate a file extension, including byproduct extensions
    pub fn file_extension() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(".pdb".to_string()),
            Just(".ilk".to_string()),
            Just(".exp".to_string()),
            Just(".lib".to_string()),
            Just(".wast".to_string()),
            Just(".PDB".to_string()),
            Just(".exe".to_string()),
            Just(".dll".to_string()),
            Just(".png".to_string()),
            Just(".data".to_string()),
            Just(String::new()),
        ]
    }

    /// Generate a relative directory of up to three components
    pub fn relative_dir() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[A-Za-z]{1,8}",
            "[A-Za-z]{1,8}/[A-Za-z]{1,8}",
            "ZeroLauncherResources(/[A-Za-z]{1,8}){0,2}",
        ]
    }
}

/// Process runner double that records commands instead of running them
#[cfg(test)]
pub mod recording {
    use std::sync::Mutex;

    use crate::error::ProcessError;
    use crate::infra::process::{CommandSpec, ProcessRunner};

    type SideEffect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

    /// Records every command; commands whose display contains a configured
    /// needle exit with the configured code
    #[derive(Default)]
    pub struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        failures: Vec<(String, i32)>,
        side_effect: Option<SideEffect>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Exit with `code` for commands containing `needle`
        #[must_use]
        pub fn fail_on(mut self, needle: &str, code: i32) -> Self {
            self.failures.push((needle.to_string(), code));
            self
        }

        /// Run `effect` for every successful command (e.g. to create clone output)
        #[must_use]
        pub fn with_side_effect(mut self, effect: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
            self.side_effect = Some(Box::new(effect));
            self
        }

        /// Recorded commands
        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// Recorded commands, rendered
        pub fn commands(&self) -> Vec<String> {
            self.calls().iter().map(ToString::to_string).collect()
        }
    }

    impl ProcessRunner for RecordingRunner {
        async fn run(&self, command: &CommandSpec) -> Result<i32, ProcessError> {
            self.calls.lock().unwrap().push(command.clone());
            let rendered = command.to_string();
            if let Some((_, code)) = self
                .failures
                .iter()
                .find(|(needle, _)| rendered.contains(needle.as_str()))
            {
                return Ok(*code);
            }
            if let Some(effect) = &self.side_effect {
                effect(command);
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_version_number_generator(n in version_number()) {
            prop_assert!(!n.is_empty());
            prop_assert!(n.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn test_short_change_set_generator(hash in short_change_set()) {
            prop_assert!(hash.len() >= 6);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_relative_dir_generator(dir in relative_dir()) {
            prop_assert!(!dir.starts_with('/'));
            prop_assert!(!dir.ends_with('/'));
        }
    }
}
