// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vault_meta` key/value access.

use keeper_core::{EncryptedBlob, KeeperError};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

/// Key under which the verification token is stored.
pub const TOKEN_KEY: &str = "verification_token";

pub async fn token_exists(db: &Database) -> Result<bool, KeeperError> {
    db.connection()
        .call(|conn| -> Result<bool, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM vault_meta WHERE key = ?1",
                params![TOKEN_KEY],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn read_token(db: &Database) -> Result<Option<EncryptedBlob>, KeeperError> {
    db.connection()
        .call(|conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT value FROM vault_meta WHERE key = ?1",
                params![TOKEN_KEY],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map(|value| value.map(EncryptedBlob::new))
        .map_err(map_tr_err)
}

pub async fn write_token(db: &Database, token: &EncryptedBlob) -> Result<(), KeeperError> {
    let value = token.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            upsert_token(conn, &value)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace the token on an open connection or transaction.
pub(crate) fn upsert_token(conn: &rusqlite::Connection, value: &str) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT INTO vault_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![TOKEN_KEY, value],
    )
}
