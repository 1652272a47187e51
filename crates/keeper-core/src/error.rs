// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keeper credential vault.
//!
//! Messages carry only a classification plus identifiers or lengths. Master
//! secrets, derived keys and decrypted payloads never appear in an error.

use thiserror::Error;

use crate::types::RecordId;

/// The primary error type used across the vault core and its storage backends.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Malformed arguments (wrong salt length, empty master secret, bad metadata).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stored data that cannot be decoded into an encrypted blob.
    #[error("malformed blob: {reason}")]
    MalformedBlob { reason: String },

    /// Wrong master secret or tampered ciphertext. The two are
    /// indistinguishable to the caller.
    #[error("authentication failed -- incorrect master secret or tampered data")]
    AuthenticationFailed,

    /// Operation on an unknown record id.
    #[error("record not found: {id}")]
    NotFound { id: RecordId },

    /// The AEAD transform or the random source failed while sealing.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// The session holds no master secret.
    #[error("vault is locked")]
    Locked,

    /// No verification token exists yet: the master secret was never set.
    #[error("vault has no master secret set")]
    NotInitialized,

    /// A verification token already exists.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// A re-key was cancelled before its commit step. Nothing was written.
    #[error("re-key cancelled after {processed} of {total} records; vault unchanged")]
    Cancelled { processed: usize, total: usize },

    /// Storage backend errors (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeeperError {
    /// Shorthand for a [`KeeperError::MalformedBlob`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedBlob {
            reason: reason.into(),
        }
    }

    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Whether this error means "the supplied master secret is wrong".
    ///
    /// UI layers re-prompt on this and surface everything else as a failure.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_id() {
        let err = KeeperError::NotFound { id: RecordId(42) };
        assert_eq!(err.to_string(), "record not found: 42");
    }

    #[test]
    fn malformed_helper_builds_variant() {
        let err = KeeperError::malformed("decoded length 12 is shorter than 48-byte header");
        assert!(matches!(err, KeeperError::MalformedBlob { .. }));
        assert!(err.to_string().contains("48-byte header"));
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = KeeperError::storage(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn only_authentication_failed_is_an_auth_failure() {
        assert!(KeeperError::AuthenticationFailed.is_authentication_failure());
        assert!(!KeeperError::Locked.is_authentication_failure());
        assert!(!KeeperError::malformed("x").is_authentication_failure());
    }
}
