// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks on the plaintext metadata of a record.

use std::sync::LazyLock;

use keeper_core::{KeeperError, RecordMetadata, DEFAULT_CATEGORY};
use regex::Regex;

// Optional http(s) scheme, then localhost, a dotted IPv4 address or a domain,
// then an optional port and path.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(https?://)?(localhost|(\d{1,3}\.){3}\d{1,3}|([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,})(:\d{1,5})?(/\S*)?$",
    )
    .expect("valid URL regex")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Whether `url` looks like a website address.
pub fn validate_url(url: &str) -> bool {
    URL_PATTERN.is_match(url.trim())
}

/// Whether `email` looks like an e-mail address.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Validate and normalize metadata before it is persisted.
///
/// Trims the name, requires it to be non-empty, validates a non-empty URL and
/// puts a blank category back to the default one.
pub fn normalize_metadata(mut metadata: RecordMetadata) -> Result<RecordMetadata, KeeperError> {
    metadata.name = metadata.name.trim().to_string();
    if metadata.name.is_empty() {
        return Err(KeeperError::InvalidInput(
            "record name must not be empty".to_string(),
        ));
    }

    metadata.url = metadata.url.trim().to_string();
    if !metadata.url.is_empty() && !validate_url(&metadata.url) {
        return Err(KeeperError::InvalidInput(format!(
            "`{}` is not a valid URL",
            metadata.url
        )));
    }

    if metadata.category.trim().is_empty() {
        metadata.category = DEFAULT_CATEGORY.to_string();
    }
    Ok(metadata)
}
