// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared between the vault core and storage backends.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned to records created without one.
pub const DEFAULT_CATEGORY: &str = "Default";

/// Store-assigned identifier of a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base64 text form of `salt || nonce || tag || ciphertext`.
///
/// This type only carries the persisted text; sealing and opening live in
/// `keeper-vault`. Debug output shows the length, not the content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Length of the base64 text.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("text_len", &self.0.len())
            .finish()
    }
}

impl From<String> for EncryptedBlob {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Plaintext, non-secret description of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Site or account display name.
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl RecordMetadata {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            username: username.into(),
            notes: String::new(),
            category: default_category(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// A persisted credential. `secret_field` stays encrypted until a caller
/// explicitly decrypts it with the session's master secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: RecordId,
    pub metadata: RecordMetadata,
    pub secret_field: EncryptedBlob,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record about to be inserted. The backend assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub metadata: RecordMetadata,
    pub secret_field: EncryptedBlob,
}

/// Replacement values for an existing record.
///
/// `secret_field: None` leaves the stored blob untouched.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
    pub metadata: RecordMetadata,
    pub secret_field: Option<EncryptedBlob>,
}

/// Everything a re-key writes, applied by the backend in one atomic step.
#[derive(Debug, Clone)]
pub struct SecretCommit {
    /// New blobs for the records that migrated successfully.
    pub secrets: Vec<(RecordId, EncryptedBlob)>,
    /// Replacement verification token under the new master secret.
    pub token: EncryptedBlob,
}

/// Search criteria for listing records.
///
/// `keyword` is a case-insensitive substring match against name, url, notes
/// and category. Results are ordered by name, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Match every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.keyword = if keyword.trim().is_empty() {
            None
        } else {
            Some(keyword)
        };
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `metadata` satisfies the keyword and category criteria.
    ///
    /// `limit` is applied by the caller after ordering.
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        if let Some(category) = &self.category
            && metadata.category != *category
        {
            return false;
        }
        match &self.keyword {
            None => true,
            Some(keyword) => {
                let needle = keyword.to_lowercase();
                [
                    &metadata.name,
                    &metadata.url,
                    &metadata.notes,
                    &metadata.category,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}
