// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential record CRUD and the atomic re-key commit.

use chrono::{DateTime, Utc};
use keeper_core::{
    CredentialRecord, EncryptedBlob, KeeperError, NewRecord, RecordFilter, RecordId,
    RecordMetadata, RecordUpdate, SecretCommit,
};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};
use crate::queries::meta::upsert_token;

const SELECT_COLUMNS: &str = "SELECT id, name, url, username, notes, category, secret_field,
        created_at, updated_at
 FROM credential_records";

fn row_to_record(row: &Row<'_>) -> Result<CredentialRecord, rusqlite::Error> {
    Ok(CredentialRecord {
        id: RecordId(row.get(0)?),
        metadata: RecordMetadata {
            name: row.get(1)?,
            url: row.get(2)?,
            username: row.get(3)?,
            notes: row.get(4)?,
            category: row.get(5)?,
        },
        secret_field: EncryptedBlob::new(row.get::<_, String>(6)?),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn select_one(
    conn: &rusqlite::Connection,
    id: i64,
) -> Result<Option<CredentialRecord>, rusqlite::Error> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id],
        row_to_record,
    )
    .optional()
}

/// Insert a record, returning it with its assigned id and timestamps.
pub async fn insert_record(db: &Database, record: NewRecord) -> Result<CredentialRecord, KeeperError> {
    let now: DateTime<Utc> = Utc::now();
    db.connection()
        .call(move |conn| -> Result<CredentialRecord, rusqlite::Error> {
            let NewRecord {
                metadata,
                secret_field,
            } = record;
            conn.execute(
                "INSERT INTO credential_records
                     (name, url, username, notes, category, secret_field, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    metadata.name,
                    metadata.url,
                    metadata.username,
                    metadata.notes,
                    metadata.category,
                    secret_field.as_str(),
                    now,
                ],
            )?;
            Ok(CredentialRecord {
                id: RecordId(conn.last_insert_rowid()),
                metadata,
                secret_field,
                created_at: now,
                updated_at: now,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_record(db: &Database, id: RecordId) -> Result<Option<CredentialRecord>, KeeperError> {
    db.connection()
        .call(move |conn| select_one(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// List records matching `filter`, ordered case-insensitively by name, then id.
///
/// Category and ordering are resolved in SQL. The keyword is applied with
/// [`RecordFilter::matches`] so every backend shares one matching rule.
pub async fn search_records(
    db: &Database,
    filter: &RecordFilter,
) -> Result<Vec<CredentialRecord>, KeeperError> {
    if filter.limit == Some(0) {
        return Ok(Vec::new());
    }
    let filter = filter.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<CredentialRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE (?1 IS NULL OR category = ?1)
                 ORDER BY name COLLATE NOCASE, id"
            ))?;
            let rows = stmt.query_map(params![filter.category], row_to_record)?;

            let mut records = Vec::new();
            for row in rows {
                let record = row?;
                if filter.matches(&record.metadata) {
                    records.push(record);
                    if filter.limit.is_some_and(|limit| records.len() >= limit) {
                        break;
                    }
                }
            }
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace metadata and, when supplied, the secret blob of one record.
pub async fn update_record(
    db: &Database,
    id: RecordId,
    update: RecordUpdate,
) -> Result<Option<CredentialRecord>, KeeperError> {
    let now = Utc::now();
    db.connection()
        .call(move |conn| -> Result<Option<CredentialRecord>, rusqlite::Error> {
            let RecordUpdate {
                metadata,
                secret_field,
            } = update;
            let changed = conn.execute(
                "UPDATE credential_records
                 SET name = ?1, url = ?2, username = ?3, notes = ?4, category = ?5,
                     secret_field = COALESCE(?6, secret_field), updated_at = ?7
                 WHERE id = ?8",
                params![
                    metadata.name,
                    metadata.url,
                    metadata.username,
                    metadata.notes,
                    metadata.category,
                    secret_field.as_ref().map(EncryptedBlob::as_str),
                    now,
                    id.0,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_one(conn, id.0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_record(db: &Database, id: RecordId) -> Result<bool, KeeperError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "DELETE FROM credential_records WHERE id = ?1",
                params![id.0],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Write every staged secret plus the new token in one transaction.
///
/// A record that vanished since staging aborts the whole commit.
pub async fn apply_commit(db: &Database, commit: SecretCommit) -> Result<(), KeeperError> {
    let now = Utc::now();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "UPDATE credential_records SET secret_field = ?1, updated_at = ?2
                     WHERE id = ?3",
                )?;
                for (id, blob) in &commit.secrets {
                    if stmt.execute(params![blob.as_str(), now, id.0])? == 0 {
                        return Err(rusqlite::Error::QueryReturnedNoRows);
                    }
                }
            }
            upsert_token(&tx, commit.token.as_str())?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}
