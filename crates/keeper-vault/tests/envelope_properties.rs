// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests for the encryption envelope and the verification token.

use keeper_vault::crypto::{decrypt, encrypt, HEADER_LEN};
use keeper_vault::verifier::{create_token, verify};
use proptest::prelude::*;
use secrecy::SecretString;

// Each case runs PBKDF2 with 100k iterations twice, so keep the case count low.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn decrypt_inverts_encrypt(
        data in proptest::collection::vec(any::<u8>(), 0..512),
        master in "[ -~]{1,32}",
    ) {
        let master = SecretString::from(master);
        let blob = encrypt(&data, &master).unwrap();
        let plain = decrypt(&blob, &master).unwrap();
        prop_assert_eq!(plain.as_slice(), data.as_slice());
    }

    #[test]
    fn blob_length_tracks_plaintext(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        use base64::Engine as _;
        let master = SecretString::from("len".to_string());
        let blob = encrypt(&data, &master).unwrap();
        let raw = base64::engine::general_purpose::STANDARD.decode(blob.as_str()).unwrap();
        prop_assert_eq!(raw.len(), HEADER_LEN + data.len());
    }

    #[test]
    fn token_verifies_only_with_its_secret(
        master in "[a-zA-Z0-9]{1,24}",
        other in "[a-zA-Z0-9]{1,24}",
    ) {
        prop_assume!(master != other);
        let token = create_token(&SecretString::from(master.clone())).unwrap();
        prop_assert!(verify(&SecretString::from(master), &token));
        prop_assert!(!verify(&SecretString::from(other), &token));
    }
}
