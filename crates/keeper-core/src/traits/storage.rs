// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, in-memory).

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::types::{
    CredentialRecord, EncryptedBlob, NewRecord, RecordFilter, RecordId, RecordUpdate, SecretCommit,
};

/// Durable home for credential records and the vault-wide verification token.
///
/// Backends only move opaque blobs around; they never see key material. The
/// vault core talks to every backend through this trait and never branches on
/// which one it holds.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Short backend name used in log fields.
    fn name(&self) -> &str;

    /// Whether a verification token has been written.
    async fn token_exists(&self) -> Result<bool, KeeperError>;

    /// Read the verification token, if any.
    async fn read_token(&self) -> Result<Option<EncryptedBlob>, KeeperError>;

    /// Insert or replace the verification token.
    async fn write_token(&self, token: &EncryptedBlob) -> Result<(), KeeperError>;

    /// Persist a new record, assigning its id and timestamps.
    async fn insert_record(&self, record: NewRecord) -> Result<CredentialRecord, KeeperError>;

    /// Fetch one record by id.
    async fn get_record(&self, id: RecordId) -> Result<Option<CredentialRecord>, KeeperError>;

    /// List records matching `filter`, ordered by name then id.
    async fn search_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<CredentialRecord>, KeeperError>;

    /// Replace a record's metadata and, optionally, its secret blob.
    ///
    /// Returns `None` when no record has this id.
    async fn update_record(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<Option<CredentialRecord>, KeeperError>;

    /// Remove a record. Returns `false` when no record has this id.
    async fn delete_record(&self, id: RecordId) -> Result<bool, KeeperError>;

    /// Apply every staged secret and the new token as one atomic unit.
    ///
    /// Either all of `commit` becomes visible or none of it does.
    async fn atomic_replace(&self, commit: SecretCommit) -> Result<(), KeeperError>;

    /// Flush pending writes and release resources.
    async fn close(&self) -> Result<(), KeeperError>;
}
