// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential records encrypted under the current master secret.
//!
//! [`VaultRecordStore`] sits on top of any [`StorageAdapter`]. Record secrets
//! are only ever handed to storage as sealed blobs; decryption happens in
//! [`VaultRecordStore::reveal`] and nowhere else.
//!
//! Mutations serialize on a store-wide writer mutex. A re-key holds it from
//! token verification through the final commit, so no record can be added or
//! changed under the old secret while the migration runs. Reads never take
//! it: until the commit lands the vault stays readable under the old secret.
//!
//! Every key derivation runs on the blocking pool.

use std::sync::Arc;

use keeper_core::{
    CredentialRecord, EncryptedBlob, KeeperError, NewRecord, RecordFilter, RecordId,
    RecordMetadata, RecordUpdate, SecretCommit, StorageAdapter,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::crypto;
use crate::rekey::{RekeyProgress, RekeyResult};
use crate::validate::normalize_metadata;
use crate::verifier::{self, VerificationToken};

/// Record store over an injected storage backend.
pub struct VaultRecordStore {
    storage: Arc<dyn StorageAdapter>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for VaultRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultRecordStore")
            .field("backend", &self.storage.name())
            .finish()
    }
}

impl VaultRecordStore {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            writer: Mutex::new(()),
        }
    }

    /// The backend this store writes to.
    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Whether a master secret has been set for this vault.
    pub async fn token_exists(&self) -> Result<bool, KeeperError> {
        self.storage.token_exists().await
    }

    /// Set the first master secret by persisting a new verification token.
    pub async fn initialize(&self, master_secret: &SecretString) -> Result<(), KeeperError> {
        let _guard = self.writer.lock().await;
        if self.storage.token_exists().await? {
            return Err(KeeperError::AlreadyInitialized);
        }
        let master = copy_secret(master_secret);
        let token = run_blocking(move || verifier::create_token(&master)).await??;
        self.storage.write_token(token.as_blob()).await?;
        info!(backend = self.storage.name(), "vault initialized");
        Ok(())
    }

    /// Check `candidate` against the persisted token.
    ///
    /// Returns [`KeeperError::NotInitialized`] when no token exists.
    pub async fn verify_master_secret(&self, candidate: &SecretString) -> Result<bool, KeeperError> {
        let token = self.load_token().await?;
        let candidate = copy_secret(candidate);
        let verified = run_blocking(move || verifier::verify(&candidate, &token)).await?;
        if !verified {
            warn!("master secret rejected");
        }
        Ok(verified)
    }

    /// Encrypt `secret` and persist a new record.
    pub async fn create(
        &self,
        secret: &SecretString,
        metadata: RecordMetadata,
        master_secret: &SecretString,
    ) -> Result<CredentialRecord, KeeperError> {
        let metadata = normalize_metadata(metadata)?;
        let (secret, master) = (copy_secret(secret), copy_secret(master_secret));
        let secret_field = run_blocking(move || crypto::encrypt_str(&secret, &master)).await??;

        let _guard = self.writer.lock().await;
        let record = self
            .storage
            .insert_record(NewRecord {
                metadata,
                secret_field,
            })
            .await?;
        debug!(id = %record.id, "record created");
        Ok(record)
    }

    /// Fetch a record with its secret still encrypted.
    pub async fn get(&self, id: RecordId) -> Result<Option<CredentialRecord>, KeeperError> {
        self.storage.get_record(id).await
    }

    /// List records matching `filter`, secrets still encrypted.
    pub async fn search(&self, filter: &RecordFilter) -> Result<Vec<CredentialRecord>, KeeperError> {
        self.storage.search_records(filter).await
    }

    /// Decrypt a record's secret.
    pub fn reveal(
        &self,
        record: &CredentialRecord,
        master_secret: &SecretString,
    ) -> Result<SecretString, KeeperError> {
        crypto::decrypt_to_secret(&record.secret_field, master_secret).inspect_err(|e| {
            warn!(id = %record.id, error = %e, "failed to reveal record secret");
        })
    }

    /// Replace a record's metadata and, when `new_secret` is given, its secret.
    ///
    /// Without a new secret the stored blob is left byte-for-byte unchanged.
    pub async fn update(
        &self,
        id: RecordId,
        new_secret: Option<&SecretString>,
        metadata: RecordMetadata,
        master_secret: &SecretString,
    ) -> Result<bool, KeeperError> {
        let metadata = normalize_metadata(metadata)?;
        let secret_field = match new_secret {
            Some(secret) => {
                let (secret, master) = (copy_secret(secret), copy_secret(master_secret));
                Some(run_blocking(move || crypto::encrypt_str(&secret, &master)).await??)
            }
            None => None,
        };
        let reencrypted = secret_field.is_some();

        let _guard = self.writer.lock().await;
        match self
            .storage
            .update_record(
                id,
                RecordUpdate {
                    metadata,
                    secret_field,
                },
            )
            .await?
        {
            Some(_) => {
                debug!(id = %id, reencrypted, "record updated");
                Ok(true)
            }
            None => Err(KeeperError::NotFound { id }),
        }
    }

    /// Permanently remove a record.
    pub async fn delete(&self, id: RecordId) -> Result<bool, KeeperError> {
        let _guard = self.writer.lock().await;
        if self.storage.delete_record(id).await? {
            debug!(id = %id, "record deleted");
            Ok(true)
        } else {
            Err(KeeperError::NotFound { id })
        }
    }

    /// Move every record and the verification token from `old` to `new`.
    ///
    /// Records that cannot be migrated are reported in
    /// [`RekeyResult::failed_ids`] and keep their old blob. Everything else,
    /// together with a fresh token, is written in one atomic step.
    pub async fn re_key(
        &self,
        old: &SecretString,
        new: &SecretString,
    ) -> Result<RekeyResult, KeeperError> {
        self.re_key_with(
            Arc::new(copy_secret(old)),
            Arc::new(copy_secret(new)),
            &CancellationToken::new(),
            None,
        )
        .await
    }

    pub(crate) async fn re_key_with(
        &self,
        old: Arc<SecretString>,
        new: Arc<SecretString>,
        cancel: &CancellationToken,
        progress: Option<&mpsc::UnboundedSender<RekeyProgress>>,
    ) -> Result<RekeyResult, KeeperError> {
        if new.expose_secret().is_empty() {
            return Err(KeeperError::InvalidInput(
                "new master secret must not be empty".to_string(),
            ));
        }

        let _guard = self.writer.lock().await;

        let token = self.load_token().await?;
        let verified = {
            let old = Arc::clone(&old);
            run_blocking(move || verifier::verify(&old, &token)).await?
        };
        if !verified {
            warn!("re-key refused: current master secret rejected");
            return Err(KeeperError::AuthenticationFailed);
        }

        let records = self.storage.search_records(&RecordFilter::all()).await?;
        let total = records.len();
        info!(total, "re-key started");

        let mut staged = Vec::with_capacity(total);
        let mut failed_ids = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(processed = index, total, "re-key cancelled; nothing written");
                return Err(KeeperError::Cancelled {
                    processed: index,
                    total,
                });
            }

            let id = record.id;
            let (old, new) = (Arc::clone(&old), Arc::clone(&new));
            let blob = record.secret_field;
            let migrated = run_blocking(move || reencrypt(&blob, &old, &new)).await?;
            let ok = match migrated {
                Ok(blob) => {
                    staged.push((id, blob));
                    true
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "record could not be re-keyed; keeping old blob");
                    failed_ids.push(id);
                    false
                }
            };

            if let Some(tx) = progress {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(RekeyProgress {
                    processed: index + 1,
                    total,
                    record_id: id,
                    migrated: ok,
                });
            }
        }

        if cancel.is_cancelled() {
            info!(processed = total, total, "re-key cancelled before commit; nothing written");
            return Err(KeeperError::Cancelled {
                processed: total,
                total,
            });
        }

        let token = {
            let new = Arc::clone(&new);
            run_blocking(move || verifier::create_token(&new)).await??
        };
        let succeeded = staged.len();
        self.storage
            .atomic_replace(SecretCommit {
                secrets: staged,
                token: token.into_blob(),
            })
            .await?;

        info!(total, succeeded, failed = failed_ids.len(), "re-key committed");
        Ok(RekeyResult {
            total,
            succeeded,
            failed_ids,
        })
    }

    async fn load_token(&self) -> Result<VerificationToken, KeeperError> {
        self.storage
            .read_token()
            .await?
            .map(VerificationToken::from)
            .ok_or(KeeperError::NotInitialized)
    }
}

fn reencrypt(
    blob: &EncryptedBlob,
    old: &SecretString,
    new: &SecretString,
) -> Result<EncryptedBlob, KeeperError> {
    let plaintext = crypto::decrypt(blob, old)?;
    crypto::encrypt(&plaintext, new)
}

async fn run_blocking<T, F>(f: F) -> Result<T, KeeperError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KeeperError::Internal(format!("crypto worker failed: {e}")))
}

pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}
