// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unlock state machine and the only long-lived holder of the master secret.
//!
//! ```text
//! NoTokenExists --setup--> Unlocked
//! Locked --unlock(ok)--> Unlocked
//! Unlocked --lock / idle timeout--> Locked
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use keeper_config::SecurityConfig;
use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::rekey::RekeyResult;
use crate::store::{copy_secret, VaultRecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No master secret has ever been set.
    NoTokenExists,
    Locked,
    Unlocked,
}

/// A user's session against one vault.
pub struct Session {
    store: Arc<VaultRecordStore>,
    state: SessionState,
    master_secret: Option<SecretString>,
    last_activity: Option<Instant>,
    auto_lock_after: Option<Duration>,
    min_secret_len: usize,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("master_secret", &"[REDACTED]")
            .field("auto_lock_after", &self.auto_lock_after)
            .finish()
    }
}

impl Session {
    /// Open a session, starting `Locked` or `NoTokenExists` depending on
    /// whether the vault has a verification token.
    pub async fn open(
        store: Arc<VaultRecordStore>,
        security: &SecurityConfig,
    ) -> Result<Self, KeeperError> {
        let state = if store.token_exists().await? {
            SessionState::Locked
        } else {
            SessionState::NoTokenExists
        };
        let auto_lock_after = (security.auto_lock_minutes > 0)
            .then(|| Duration::from_secs(security.auto_lock_minutes * 60));

        Ok(Self {
            store,
            state,
            master_secret: None,
            last_activity: None,
            auto_lock_after,
            min_secret_len: security.min_master_secret_length,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == SessionState::Unlocked
    }

    pub fn store(&self) -> &Arc<VaultRecordStore> {
        &self.store
    }

    /// Set the first master secret and unlock.
    pub async fn setup(&mut self, master_secret: SecretString) -> Result<(), KeeperError> {
        if self.state != SessionState::NoTokenExists {
            return Err(KeeperError::AlreadyInitialized);
        }
        self.check_policy(&master_secret)?;
        self.store.initialize(&master_secret).await?;
        self.enter_unlocked(master_secret);
        Ok(())
    }

    /// Unlock with a candidate secret.
    ///
    /// A rejected candidate leaves the session locked.
    pub async fn unlock(&mut self, candidate: SecretString) -> Result<(), KeeperError> {
        if self.state == SessionState::NoTokenExists {
            return Err(KeeperError::NotInitialized);
        }
        if !self.store.verify_master_secret(&candidate).await? {
            return Err(KeeperError::AuthenticationFailed);
        }
        self.enter_unlocked(candidate);
        info!("session unlocked");
        Ok(())
    }

    /// Drop the master secret.
    pub fn lock(&mut self) {
        if self.state == SessionState::Unlocked {
            self.master_secret = None;
            self.last_activity = None;
            self.state = SessionState::Locked;
            info!("session locked");
        }
    }

    /// Record user activity, postponing auto-lock.
    pub fn touch(&mut self) {
        if self.is_unlocked() {
            self.last_activity = Some(Instant::now());
        }
    }

    /// Lock if the session has been idle for the configured period.
    ///
    /// Returns `true` when the session is locked after the call.
    pub fn check_auto_lock(&mut self) -> bool {
        self.check_auto_lock_at(Instant::now())
    }

    /// [`Session::check_auto_lock`] against an explicit clock reading.
    pub fn check_auto_lock_at(&mut self, now: Instant) -> bool {
        if !self.is_unlocked() {
            return true;
        }
        let (Some(limit), Some(last)) = (self.auto_lock_after, self.last_activity) else {
            return false;
        };
        if now.saturating_duration_since(last) >= limit {
            info!(idle_secs = limit.as_secs(), "auto-locking idle session");
            self.lock();
            return true;
        }
        false
    }

    /// The held master secret.
    pub fn master_secret(&self) -> Result<&SecretString, KeeperError> {
        self.master_secret.as_ref().ok_or(KeeperError::Locked)
    }

    /// Re-key the vault to `new_secret` and hold it from now on.
    ///
    /// The session adopts the new secret even when some records failed to
    /// migrate, because the committed token is already under the new one.
    pub async fn change_master_secret(
        &mut self,
        new_secret: SecretString,
    ) -> Result<RekeyResult, KeeperError> {
        self.check_policy(&new_secret)?;
        let current = copy_secret(self.master_secret()?);
        let result = self.store.re_key(&current, &new_secret).await?;
        self.adopt_master_secret(new_secret)?;
        if !result.is_complete() {
            warn!(
                failed = result.failed_ids.len(),
                "master secret changed with unmigrated records"
            );
        }
        Ok(result)
    }

    /// Hold `new_secret` after a re-key committed elsewhere, for example
    /// through [`crate::rekey::spawn_rekey`].
    pub fn adopt_master_secret(&mut self, new_secret: SecretString) -> Result<(), KeeperError> {
        if !self.is_unlocked() {
            return Err(KeeperError::Locked);
        }
        self.master_secret = Some(new_secret);
        self.touch();
        Ok(())
    }

    fn enter_unlocked(&mut self, master_secret: SecretString) {
        self.master_secret = Some(master_secret);
        self.state = SessionState::Unlocked;
        self.last_activity = Some(Instant::now());
    }

    fn check_policy(&self, secret: &SecretString) -> Result<(), KeeperError> {
        let len = secret.expose_secret().chars().count();
        if len < self.min_secret_len.max(1) {
            return Err(KeeperError::InvalidInput(format!(
                "master secret must be at least {} characters",
                self.min_secret_len.max(1)
            )));
        }
        Ok(())
    }
}
