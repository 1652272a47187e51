// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background re-keying with progress reporting and cancellation.

use std::sync::Arc;

use keeper_core::{KeeperError, RecordId};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::VaultRecordStore;

/// Outcome of a committed re-key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeyResult {
    /// Records seen when the re-key started.
    pub total: usize,
    /// Records now encrypted under the new secret.
    pub succeeded: usize,
    /// Records left under the old secret because they could not be opened.
    pub failed_ids: Vec<RecordId>,
}

impl RekeyResult {
    pub fn is_complete(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

/// Emitted once per record while a background re-key runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RekeyProgress {
    pub processed: usize,
    pub total: usize,
    pub record_id: RecordId,
    /// `false` when this record will keep its old blob.
    pub migrated: bool,
}

/// Handle to a re-key running on the tokio runtime.
#[derive(Debug)]
pub struct RekeyHandle {
    progress: mpsc::UnboundedReceiver<RekeyProgress>,
    cancel: CancellationToken,
    task: JoinHandle<Result<RekeyResult, KeeperError>>,
}

impl RekeyHandle {
    /// Next progress event, or `None` once the re-key has stopped sending.
    pub async fn next_progress(&mut self) -> Option<RekeyProgress> {
        self.progress.recv().await
    }

    /// Ask the re-key to stop at the next record boundary.
    ///
    /// Has no effect once the commit has started.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the re-key to finish.
    pub async fn finish(self) -> Result<RekeyResult, KeeperError> {
        self.task
            .await
            .map_err(|e| KeeperError::Internal(format!("re-key task failed: {e}")))?
    }
}

/// Start a re-key from `old` to `new` as a background task.
///
/// Must be called from within a tokio runtime.
pub fn spawn_rekey(
    store: Arc<VaultRecordStore>,
    old: SecretString,
    new: SecretString,
) -> RekeyHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let (old, new) = (Arc::new(old), Arc::new(new));

    let task = tokio::spawn(async move {
        store.re_key_with(old, new, &task_cancel, Some(&tx)).await
    });

    RekeyHandle {
        progress: rx,
        cancel,
        task,
    }
}
