// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keeper credential vault.
//!
//! Holds the error taxonomy, the record and blob types persisted by storage
//! backends, and the [`StorageAdapter`] trait that decouples the vault core
//! from any particular database.

pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use error::KeeperError;
pub use traits::StorageAdapter;
pub use types::{
    CredentialRecord, EncryptedBlob, NewRecord, RecordFilter, RecordId, RecordMetadata,
    RecordUpdate, SecretCommit, DEFAULT_CATEGORY,
};
