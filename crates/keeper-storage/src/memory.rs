// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local storage backend.
//!
//! Same contract as the SQLite backend, including the all-or-nothing
//! [`StorageAdapter::atomic_replace`]. Contents vanish with the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use keeper_core::{
    CredentialRecord, EncryptedBlob, KeeperError, NewRecord, RecordFilter, RecordId, RecordUpdate,
    SecretCommit, StorageAdapter,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    records: BTreeMap<RecordId, CredentialRecord>,
    token: Option<EncryptedBlob>,
}

/// In-memory storage adapter.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn token_exists(&self) -> Result<bool, KeeperError> {
        Ok(self.inner.read().await.token.is_some())
    }

    async fn read_token(&self) -> Result<Option<EncryptedBlob>, KeeperError> {
        Ok(self.inner.read().await.token.clone())
    }

    async fn write_token(&self, token: &EncryptedBlob) -> Result<(), KeeperError> {
        self.inner.write().await.token = Some(token.clone());
        Ok(())
    }

    async fn insert_record(&self, record: NewRecord) -> Result<CredentialRecord, KeeperError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let now = Utc::now();
        let stored = CredentialRecord {
            id: RecordId(inner.last_id),
            metadata: record.metadata,
            secret_field: record.secret_field,
            created_at: now,
            updated_at: now,
        };
        inner.records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<CredentialRecord>, KeeperError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn search_records(
        &self,
        filter: &RecordFilter,
    ) -> Result<Vec<CredentialRecord>, KeeperError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<CredentialRecord> = inner
            .records
            .values()
            .filter(|record| filter.matches(&record.metadata))
            .cloned()
            .collect();
        // Mirrors SQLite's `name COLLATE NOCASE, id`.
        matches.sort_by(|a, b| {
            a.metadata
                .name
                .to_ascii_lowercase()
                .cmp(&b.metadata.name.to_ascii_lowercase())
                .then(a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn update_record(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<Option<CredentialRecord>, KeeperError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(None);
        };
        record.metadata = update.metadata;
        if let Some(blob) = update.secret_field {
            record.secret_field = blob;
        }
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool, KeeperError> {
        Ok(self.inner.write().await.records.remove(&id).is_some())
    }

    async fn atomic_replace(&self, commit: SecretCommit) -> Result<(), KeeperError> {
        let mut inner = self.inner.write().await;
        if let Some((missing, _)) = commit
            .secrets
            .iter()
            .find(|(id, _)| !inner.records.contains_key(id))
        {
            return Err(KeeperError::NotFound { id: *missing });
        }

        let now = Utc::now();
        for (id, blob) in commit.secrets {
            if let Some(record) = inner.records.get_mut(&id) {
                record.secret_field = blob;
                record.updated_at = now;
            }
        }
        inner.token = Some(commit.token);
        Ok(())
    }

    async fn close(&self) -> Result<(), KeeperError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use keeper_core::RecordMetadata;

    use super::*;

    fn new_record(name: &str, blob: &str) -> NewRecord {
        NewRecord {
            metadata: RecordMetadata::new(name, "user"),
            secret_field: EncryptedBlob::new(blob),
        }
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let storage = MemoryStorage::new();
        let a = storage.insert_record(new_record("a", "x")).await.unwrap();
        storage.delete_record(a.id).await.unwrap();
        let b = storage.insert_record(new_record("b", "y")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn search_sorts_like_sqlite() {
        let storage = MemoryStorage::new();
        for name in ["zeta", "Alpha", "beta"] {
            storage.insert_record(new_record(name, "x")).await.unwrap();
        }
        let names: Vec<String> = storage
            .search_records(&RecordFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.metadata.name)
            .collect();
        assert_eq!(names, ["Alpha", "beta", "zeta"]);
    }

    #[tokio::test]
    async fn atomic_replace_rejects_unknown_ids_without_writing() {
        let storage = MemoryStorage::new();
        let a = storage.insert_record(new_record("a", "old")).await.unwrap();
        storage.write_token(&EncryptedBlob::new("t0")).await.unwrap();

        let err = storage
            .atomic_replace(SecretCommit {
                secrets: vec![
                    (a.id, EncryptedBlob::new("new")),
                    (RecordId(77), EncryptedBlob::new("ghost")),
                ],
                token: EncryptedBlob::new("t1"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::NotFound { id: RecordId(77) }));
        assert_eq!(storage.get_record(a.id).await.unwrap().unwrap().secret_field.as_str(), "old");
        assert_eq!(storage.read_token().await.unwrap().unwrap().as_str(), "t0");
    }
}
