// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeeperConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml` (system-wide)
/// 3. `~/.config/keeper/keeper.toml` (user XDG config)
/// 4. `./keeper.toml` (local directory)
/// 5. `KEEPER_*` environment variables
pub fn load_config() -> Result<KeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file("/etc/keeper/keeper.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keeper/keeper.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keeper.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `KEEPER_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `KEEPER_SECURITY_AUTO_LOCK_MINUTES` must become
/// `security.auto_lock_minutes`.
fn env_provider() -> Env {
    Env::prefixed("KEEPER_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("storage_", "storage.", 1)
            .replacen("security_", "security.", 1)
            .replacen("generator_", "generator.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
