// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master-secret verification without storing the secret.
//!
//! The token is an ordinary envelope around 32 random bytes in hex. A
//! candidate secret is accepted when it can open the envelope; the random
//! payload itself is never compared against anything.

use keeper_core::{EncryptedBlob, KeeperError};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::crypto;

const TOKEN_RANDOM_LEN: usize = 32;

/// The persisted proof that a master secret has been set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(EncryptedBlob);

impl VerificationToken {
    pub fn as_blob(&self) -> &EncryptedBlob {
        &self.0
    }

    pub fn into_blob(self) -> EncryptedBlob {
        self.0
    }
}

impl From<EncryptedBlob> for VerificationToken {
    fn from(blob: EncryptedBlob) -> Self {
        Self(blob)
    }
}

/// Create a fresh token under `master_secret`.
pub fn create_token(master_secret: &SecretString) -> Result<VerificationToken, KeeperError> {
    let mut random = Zeroizing::new([0u8; TOKEN_RANDOM_LEN]);
    SystemRandom::new()
        .fill(random.as_mut())
        .map_err(|_| KeeperError::Encryption("failed to generate token bytes".to_string()))?;
    let payload = Zeroizing::new(hex::encode(random.as_ref()));
    crypto::encrypt(payload.as_bytes(), master_secret).map(VerificationToken)
}

/// Whether `candidate` opens `token`.
///
/// Every failure, including a malformed token or an empty candidate, reads
/// as "not verified".
pub fn verify(candidate: &SecretString, token: &VerificationToken) -> bool {
    crypto::decrypt(&token.0, candidate).is_ok()
}
