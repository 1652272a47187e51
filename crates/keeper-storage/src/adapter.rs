// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use keeper_config::StorageConfig;
use keeper_core::{
    CredentialRecord, EncryptedBlob, KeeperError, NewRecord, RecordFilter, RecordId, RecordUpdate,
    SecretCommit, StorageAdapter,
};
use tracing::debug;

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Delegates every operation to the typed query modules over one
/// [`Database`] handle.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Open the database named in `config`, running migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeeperError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self { db })
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn token_exists(&self) -> Result<bool, KeeperError> {
        queries::meta::token_exists(&self.db).await
    }

    async fn read_token(&self) -> Result<Option<EncryptedBlob>, KeeperError> {
        queries::meta::read_token(&self.db).await
    }

    async fn write_token(&self, token: &EncryptedBlob) -> Result<(), KeeperError> {
        queries::meta::write_token(&self.db, token).await
    }

    async fn insert_record(&self, record: NewRecord) -> Result<CredentialRecord, KeeperError> {
        queries::records::insert_record(&self.db, record).await
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<CredentialRecord>, KeeperError> {
        queries::records::get_record(&self.db, id).await
    }

    async fn search_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<CredentialRecord>, KeeperError> {
        queries::records::search_records(&self.db, filter).await
    }

    async fn update_record(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<Option<CredentialRecord>, KeeperError> {
        queries::records::update_record(&self.db, id, update).await
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool, KeeperError> {
        queries::records::delete_record(&self.db, id).await
    }

    async fn atomic_replace(&self, commit: SecretCommit) -> Result<(), KeeperError> {
        let count = commit.secrets.len();
        queries::records::apply_commit(&self.db, commit).await?;
        debug!(records = count, "re-key commit applied");
        Ok(())
    }

    async fn close(&self) -> Result<(), KeeperError> {
        self.db.checkpoint().await
    }
}
