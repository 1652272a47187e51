// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: non-empty paths, known log
//! levels and generator bounds.

use crate::diagnostic::ConfigError;
use crate::model::{KeeperConfig, StorageBackend};

/// Shortest password the generator will produce.
pub const MIN_GENERATOR_LENGTH: usize = 4;
/// Longest password the generator will produce.
pub const MAX_GENERATOR_LENGTH: usize = 128;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty for the sqlite backend".to_string(),
        });
    }

    if config.security.min_master_secret_length == 0 {
        errors.push(ConfigError::Validation {
            message: "security.min_master_secret_length must be at least 1".to_string(),
        });
    }

    let length = config.generator.length;
    if !(MIN_GENERATOR_LENGTH..=MAX_GENERATOR_LENGTH).contains(&length) {
        errors.push(ConfigError::Validation {
            message: format!(
                "generator.length must be between {MIN_GENERATOR_LENGTH} and \
                 {MAX_GENERATOR_LENGTH}, got {length}"
            ),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
