// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted credential records for the Keeper vault.
//!
//! Each secret is sealed on its own with AES-256-GCM under a key derived from
//! the master secret by PBKDF2-HMAC-SHA256 with a per-blob salt. A random
//! verification token proves a candidate master secret without storing it.
//! Changing the master secret re-encrypts every record and replaces the token
//! in a single storage commit.

pub mod crypto;
pub mod generator;
pub mod kdf;
pub mod rekey;
pub mod session;
pub mod store;
pub mod validate;
pub mod verifier;

pub use crypto::{decrypt, decrypt_to_secret, encrypt, encrypt_str};
pub use generator::{check_strength, generate_password, PasswordStrength, StrengthLevel};
pub use kdf::{derive_key, generate_salt};
pub use rekey::{spawn_rekey, RekeyHandle, RekeyProgress, RekeyResult};
pub use session::{Session, SessionState};
pub use store::VaultRecordStore;
pub use verifier::{create_token, verify, VerificationToken};
