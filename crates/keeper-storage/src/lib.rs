// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backends for the Keeper credential vault.
//!
//! [`SqliteStorage`] keeps records in a WAL-mode SQLite file with embedded
//! migrations and a single writer thread. [`MemoryStorage`] keeps them in the
//! process. Both implement [`keeper_core::StorageAdapter`]; which one a vault
//! uses is decided here, from configuration, and nowhere in the core.

pub mod adapter;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod queries;

use std::sync::Arc;

use keeper_config::{StorageBackend, StorageConfig};
use keeper_core::{KeeperError, StorageAdapter};

pub use adapter::SqliteStorage;
pub use database::Database;
pub use memory::MemoryStorage;

/// Open the backend selected by `config`.
pub async fn open_storage(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>, KeeperError> {
    let storage: Arc<dyn StorageAdapter> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(config).await?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    tracing::info!(backend = storage.name(), "storage opened");
    Ok(storage)
}
