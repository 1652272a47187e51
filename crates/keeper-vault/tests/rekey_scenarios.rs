// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end master-secret lifecycle against both storage backends.

use std::sync::Arc;
use std::time::Duration;

use keeper_core::{
    EncryptedBlob, KeeperError, RecordFilter, RecordId, RecordMetadata, RecordUpdate,
    StorageAdapter,
};
use keeper_storage::{Database, MemoryStorage, SqliteStorage};
use keeper_vault::{spawn_rekey, VaultRecordStore};
use secrecy::{ExposeSecret, SecretString};

const OLD: &str = "OldPass123";
const NEW: &str = "NewPass456";

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

async fn backends() -> Vec<Arc<dyn StorageAdapter>> {
    vec![
        Arc::new(MemoryStorage::new()),
        Arc::new(SqliteStorage::from_database(
            Database::open_in_memory().await.unwrap(),
        )),
    ]
}

/// A store with a token under `OLD` and three records "p1", "p2", "p3".
async fn seeded(storage: Arc<dyn StorageAdapter>) -> (VaultRecordStore, Vec<RecordId>) {
    let store = VaultRecordStore::new(storage);
    store.initialize(&secret(OLD)).await.unwrap();
    let mut ids = Vec::new();
    for (i, name) in ["Alpha", "Bravo", "Charlie"].iter().enumerate() {
        let record = store
            .create(
                &secret(&format!("p{}", i + 1)),
                RecordMetadata::new(*name, "user"),
                &secret(OLD),
            )
            .await
            .unwrap();
        ids.push(record.id);
    }
    (store, ids)
}

/// A store with a token under `OLD` and `count` records "s0", "s1", ...
async fn seeded_many(storage: Arc<dyn StorageAdapter>, count: usize) -> VaultRecordStore {
    let store = VaultRecordStore::new(storage);
    store.initialize(&secret(OLD)).await.unwrap();
    for i in 0..count {
        store
            .create(
                &secret(&format!("s{i}")),
                RecordMetadata::new(format!("Site {i:02}"), "user"),
                &secret(OLD),
            )
            .await
            .unwrap();
    }
    store
}

async fn reveal(store: &VaultRecordStore, id: RecordId, master: &str) -> Result<String, KeeperError> {
    let record = store.get(id).await?.ok_or(KeeperError::NotFound { id })?;
    store
        .reveal(&record, &secret(master))
        .map(|s| s.expose_secret().to_string())
}

#[tokio::test]
async fn full_rekey_moves_everything_to_new_secret() {
    for storage in backends().await {
        let backend = storage.name().to_string();
        let (store, ids) = seeded(storage).await;

        let result = store.re_key(&secret(OLD), &secret(NEW)).await.unwrap();
        assert_eq!(result.total, 3, "{backend}");
        assert_eq!(result.succeeded, 3, "{backend}");
        assert!(result.failed_ids.is_empty(), "{backend}");

        assert!(store.verify_master_secret(&secret(NEW)).await.unwrap());
        assert!(!store.verify_master_secret(&secret(OLD)).await.unwrap());

        for (i, id) in ids.iter().enumerate() {
            assert_eq!(reveal(&store, *id, NEW).await.unwrap(), format!("p{}", i + 1));
            let err = reveal(&store, *id, OLD).await.unwrap_err();
            assert!(err.is_authentication_failure(), "{backend}: {err:?}");
        }
    }
}

#[tokio::test]
async fn wrong_old_secret_changes_nothing() {
    for storage in backends().await {
        let (store, ids) = seeded(Arc::clone(&storage)).await;
        let token_before = storage.read_token().await.unwrap();
        let before = store.search(&RecordFilter::all()).await.unwrap();

        let err = store
            .re_key(&secret("WrongOld"), &secret(NEW))
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::AuthenticationFailed));

        assert_eq!(storage.read_token().await.unwrap(), token_before);
        assert_eq!(store.search(&RecordFilter::all()).await.unwrap(), before);
        assert!(store.verify_master_secret(&secret(OLD)).await.unwrap());
        assert_eq!(reveal(&store, ids[0], OLD).await.unwrap(), "p1");
    }
}

#[tokio::test]
async fn fresh_vault_token_verifies() {
    for storage in backends().await {
        let store = VaultRecordStore::new(storage);
        assert!(!store.token_exists().await.unwrap());
        store.initialize(&secret("FirstPass789")).await.unwrap();
        assert!(store.token_exists().await.unwrap());
        assert!(store.verify_master_secret(&secret("FirstPass789")).await.unwrap());
    }
}

#[tokio::test]
async fn corrupted_record_is_reported_and_left_alone() {
    for storage in backends().await {
        let backend = storage.name().to_string();
        let (store, ids) = seeded(Arc::clone(&storage)).await;

        // Truncate record #2's blob below the 48-byte header.
        let victim = storage.get_record(ids[1]).await.unwrap().unwrap();
        let truncated = EncryptedBlob::new(&victim.secret_field.as_str()[..20]);
        storage
            .update_record(
                victim.id,
                RecordUpdate {
                    metadata: victim.metadata.clone(),
                    secret_field: Some(truncated.clone()),
                },
            )
            .await
            .unwrap();

        let result = store.re_key(&secret(OLD), &secret(NEW)).await.unwrap();
        assert_eq!(result.total, 3, "{backend}");
        assert_eq!(result.succeeded, 2, "{backend}");
        assert_eq!(result.failed_ids, vec![ids[1]], "{backend}");

        let after = storage.get_record(ids[1]).await.unwrap().unwrap();
        assert_eq!(after.secret_field, truncated, "{backend}");

        assert_eq!(reveal(&store, ids[0], NEW).await.unwrap(), "p1");
        assert_eq!(reveal(&store, ids[2], NEW).await.unwrap(), "p3");
        assert!(store.verify_master_secret(&secret(NEW)).await.unwrap());
    }
}

#[tokio::test]
async fn background_rekey_reports_progress() {
    let (store, ids) = seeded(Arc::new(MemoryStorage::new())).await;
    let store = Arc::new(store);

    let mut handle = spawn_rekey(Arc::clone(&store), secret(OLD), secret(NEW));
    let mut seen = Vec::new();
    while let Some(progress) = handle.next_progress().await {
        assert_eq!(progress.total, 3);
        assert!(progress.migrated);
        seen.push(progress.record_id);
    }
    let result = handle.finish().await.unwrap();

    assert_eq!(result.succeeded, 3);
    assert_eq!(seen, ids);
    assert!(store.verify_master_secret(&secret(NEW)).await.unwrap());
}

#[tokio::test]
async fn cancelled_rekey_writes_nothing() {
    let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
    let (store, ids) = seeded(Arc::clone(&storage)).await;
    let store = Arc::new(store);
    let token_before = storage.read_token().await.unwrap();

    let handle = spawn_rekey(Arc::clone(&store), secret(OLD), secret(NEW));
    handle.cancel();
    let err = handle.finish().await.unwrap_err();
    assert!(matches!(err, KeeperError::Cancelled { total: 3, .. }), "{err:?}");

    assert_eq!(storage.read_token().await.unwrap(), token_before);
    assert!(store.verify_master_secret(&secret(OLD)).await.unwrap());
    for id in ids {
        assert!(reveal(&store, id, OLD).await.is_ok());
    }
}

#[tokio::test]
async fn rekeyed_sqlite_vault_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let config = keeper_config::StorageConfig {
        backend: keeper_config::StorageBackend::Sqlite,
        database_path: path.display().to_string(),
        wal_mode: true,
    };

    {
        let storage = keeper_storage::open_storage(&config).await.unwrap();
        let (store, _) = seeded(Arc::clone(&storage)).await;
        store.re_key(&secret(OLD), &secret(NEW)).await.unwrap();
        storage.close().await.unwrap();
    }

    let storage = keeper_storage::open_storage(&config).await.unwrap();
    let store = VaultRecordStore::new(storage);
    assert!(store.verify_master_secret(&secret(NEW)).await.unwrap());
    let records = store.search(&RecordFilter::all()).await.unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(store.reveal(record, &secret(NEW)).is_ok());
    }
}

#[tokio::test]
async fn reads_stay_available_while_rekey_runs() {
    let store = Arc::new(seeded_many(Arc::new(MemoryStorage::new()), 10).await);

    let mut handle = spawn_rekey(Arc::clone(&store), secret(OLD), secret(NEW));
    let first = handle.next_progress().await.unwrap();
    assert_eq!(first.processed, 1);

    let records = tokio::time::timeout(
        Duration::from_millis(250),
        store.search(&RecordFilter::all()),
    )
    .await
    .expect("search blocked behind the running re-key")
    .unwrap();
    assert_eq!(records.len(), 10);

    // Nothing is committed yet, so the old secret still opens everything.
    let last = records.last().unwrap();
    assert!(store.reveal(last, &secret(OLD)).is_ok());
    assert!(store.verify_master_secret(&secret(OLD)).await.unwrap());

    while handle.next_progress().await.is_some() {}
    let result = handle.finish().await.unwrap();
    assert_eq!(result.succeeded, 10);
    assert!(store.verify_master_secret(&secret(NEW)).await.unwrap());
}

#[tokio::test]
async fn rekey_cancelled_between_records_writes_nothing() {
    let storage: Arc<dyn StorageAdapter> = Arc::new(MemoryStorage::new());
    let store = Arc::new(seeded_many(Arc::clone(&storage), 4).await);
    let token_before = storage.read_token().await.unwrap();
    let before = store.search(&RecordFilter::all()).await.unwrap();

    let mut handle = spawn_rekey(Arc::clone(&store), secret(OLD), secret(NEW));
    assert!(handle.next_progress().await.is_some());
    handle.cancel();

    let err = handle.finish().await.unwrap_err();
    match err {
        KeeperError::Cancelled { processed, total } => {
            assert_eq!(total, 4);
            assert!(processed > 0 && processed < total, "processed {processed}");
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }

    assert_eq!(storage.read_token().await.unwrap(), token_before);
    assert_eq!(store.search(&RecordFilter::all()).await.unwrap(), before);
    assert!(store.verify_master_secret(&secret(OLD)).await.unwrap());
}
