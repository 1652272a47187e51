// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated envelope around a single secret.
//!
//! Wire layout before base64:
//!
//! ```text
//! salt (16) || nonce (16) || tag (16) || ciphertext (n)
//! ```
//!
//! Every call to [`encrypt`] draws a fresh salt and a fresh 128-bit nonce, so
//! each blob also carries its own derived key. AES-256-GCM runs with the
//! non-default 16-byte nonce, which `ring` does not offer; the `aes-gcm`
//! crate handles the GHASH-derived counter block for it.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use keeper_core::{EncryptedBlob, KeeperError};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::kdf::{self, SALT_LEN};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Fixed prefix before the ciphertext.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt `plaintext` under a key derived from `master_secret`.
///
/// The decoded blob is exactly `HEADER_LEN + plaintext.len()` bytes.
pub fn encrypt(
    plaintext: &[u8],
    master_secret: &SecretString,
) -> Result<EncryptedBlob, KeeperError> {
    let rng = SystemRandom::new();
    let salt = kdf::generate_salt()?;
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| KeeperError::Encryption("failed to generate random nonce".to_string()))?;

    let key = kdf::derive_key(master_secret.expose_secret().as_bytes(), &salt)?;
    let cipher = Aes256Gcm16::new_from_slice(key.as_ref())
        .map_err(|_| KeeperError::Encryption("failed to create AES-256-GCM key".to_string()))?;

    let mut out = Zeroizing::new(Vec::with_capacity(HEADER_LEN + plaintext.len()));
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&[0u8; TAG_LEN]);
    out.extend_from_slice(plaintext);

    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(&nonce), b"", &mut out[HEADER_LEN..])
        .map_err(|_| KeeperError::Encryption("AES-256-GCM encryption failed".to_string()))?;
    out[SALT_LEN + NONCE_LEN..HEADER_LEN].copy_from_slice(tag.as_slice());

    Ok(EncryptedBlob::new(STANDARD.encode(out.as_slice())))
}

/// Decrypt a blob produced by [`encrypt`].
///
/// A wrong master secret and a modified blob both yield
/// [`KeeperError::AuthenticationFailed`]; no partial plaintext is returned.
pub fn decrypt(
    blob: &EncryptedBlob,
    master_secret: &SecretString,
) -> Result<Zeroizing<Vec<u8>>, KeeperError> {
    let mut raw = Zeroizing::new(
        STANDARD
            .decode(blob.as_str())
            .map_err(|e| KeeperError::malformed(format!("invalid base64: {e}")))?,
    );
    if raw.len() < HEADER_LEN {
        return Err(KeeperError::malformed(format!(
            "decoded length {} is shorter than {HEADER_LEN}-byte header",
            raw.len()
        )));
    }

    let (header, body) = raw.split_at_mut(HEADER_LEN);
    let salt = &header[..SALT_LEN];
    let nonce = Nonce::<U16>::from_slice(&header[SALT_LEN..SALT_LEN + NONCE_LEN]);
    let tag = Tag::<U16>::from_slice(&header[SALT_LEN + NONCE_LEN..]);

    let key = kdf::derive_key(master_secret.expose_secret().as_bytes(), salt)?;
    let cipher = Aes256Gcm16::new_from_slice(key.as_ref())
        .map_err(|_| KeeperError::Encryption("failed to create AES-256-GCM key".to_string()))?;

    if cipher
        .decrypt_in_place_detached(nonce, b"", body, tag)
        .is_err()
    {
        return Err(KeeperError::AuthenticationFailed);
    }
    Ok(Zeroizing::new(body.to_vec()))
}

/// Encrypt a UTF-8 secret.
pub fn encrypt_str(
    plaintext: &SecretString,
    master_secret: &SecretString,
) -> Result<EncryptedBlob, KeeperError> {
    encrypt(plaintext.expose_secret().as_bytes(), master_secret)
}

/// Decrypt a blob whose payload is UTF-8 text.
pub fn decrypt_to_secret(
    blob: &EncryptedBlob,
    master_secret: &SecretString,
) -> Result<SecretString, KeeperError> {
    let bytes = decrypt(blob, master_secret)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| KeeperError::malformed("decrypted payload is not valid UTF-8"))?;
    Ok(SecretString::from(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn decoded_len(blob: &EncryptedBlob) -> usize {
        STANDARD.decode(blob.as_str()).unwrap().len()
    }

    #[test]
    fn roundtrip_returns_original_bytes() {
        let master = secret("OldPass123");
        let blob = encrypt(b"hunter2", &master).unwrap();
        assert_eq!(decrypt(&blob, &master).unwrap().as_slice(), b"hunter2");
    }

    #[test]
    fn same_input_encrypts_differently() {
        let master = secret("OldPass123");
        let a = encrypt(b"same", &master).unwrap();
        let b = encrypt(b"same", &master).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let blob = encrypt(b"payload", &secret("right")).unwrap();
        let err = decrypt(&blob, &secret("wrong")).unwrap_err();
        assert!(matches!(err, KeeperError::AuthenticationFailed));
    }

    #[test]
    fn decoded_length_is_header_plus_plaintext() {
        let master = secret("m");
        for n in [0usize, 1, 15, 16, 17, 100] {
            let blob = encrypt(&vec![0xAB; n], &master).unwrap();
            assert_eq!(decoded_len(&blob), HEADER_LEN + n);
        }
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let master = secret("m");
        let blob = encrypt(b"", &master).unwrap();
        assert_eq!(decoded_len(&blob), 48);
        assert!(decrypt(&blob, &master).unwrap().is_empty());
    }

    #[test]
    fn every_single_bit_flip_is_rejected() {
        let master = secret("flip");
        let blob = encrypt(b"abc", &master).unwrap();
        let raw = STANDARD.decode(blob.as_str()).unwrap();
        for byte in 0..raw.len() {
            // One bit per byte keeps the test fast while still touching every
            // region of the layout.
            let mut tampered = raw.clone();
            tampered[byte] ^= 1 << (byte % 8);
            let tampered = EncryptedBlob::new(STANDARD.encode(&tampered));
            let err = decrypt(&tampered, &master).unwrap_err();
            assert!(
                matches!(
                    err,
                    KeeperError::AuthenticationFailed | KeeperError::MalformedBlob { .. }
                ),
                "byte {byte}: {err:?}"
            );
        }
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let err = decrypt(&EncryptedBlob::new("not base64!!"), &secret("m")).unwrap_err();
        assert!(matches!(err, KeeperError::MalformedBlob { .. }));
    }

    #[test]
    fn short_blob_is_malformed() {
        let blob = EncryptedBlob::new(STANDARD.encode([0u8; 47]));
        let err = decrypt(&blob, &secret("m")).unwrap_err();
        assert!(matches!(err, KeeperError::MalformedBlob { .. }));
    }

    #[test]
    fn empty_master_secret_is_invalid_input() {
        let err = encrypt(b"x", &secret("")).unwrap_err();
        assert!(matches!(err, KeeperError::InvalidInput(_)));
    }

    #[test]
    fn string_helpers_roundtrip_unicode() {
        let master = secret("m");
        let blob = encrypt_str(&secret("pässwörd ✓"), &master).unwrap();
        let out = decrypt_to_secret(&blob, &master).unwrap();
        assert_eq!(out.expose_secret(), "pässwörd ✓");
    }

    #[test]
    fn non_utf8_payload_is_malformed_for_string_helper() {
        let master = secret("m");
        let blob = encrypt(&[0xFF, 0xFE, 0x00], &master).unwrap();
        let err = decrypt_to_secret(&blob, &master).unwrap_err();
        assert!(matches!(err, KeeperError::MalformedBlob { .. }));
    }
}
