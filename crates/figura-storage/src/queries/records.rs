// SPDX-FileCopyrightText: 2026 Figura Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation record operations.
//!
//! Every owner-scoped operation checks ownership inside the same closure that
//! performs the write, so the check and the write run back to back on the
//! single writer thread.

use figura_core::types::{
    ArtifactRef, GenerationRecord, NewGenerationRecord, Page, PublicRecord, RecordId,
    RecordUpdate, UserId,
};
use figura_core::FiguraError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{now_timestamp, Database};

const RECORD_COLUMNS: &str = "id, owner_id, instructions, reference_image_ref, generated_2d_ref,
     generated_3d_ref, is_public, created_at";

/// Outcome of an ownership-checked lookup.
enum Scoped<T> {
    Found(T),
    Missing,
    Foreign,
}

impl<T> Scoped<T> {
    fn into_result(self, id: RecordId) -> Result<T, FiguraError> {
        match self {
            Scoped::Found(value) => Ok(value),
            Scoped::Missing => Err(FiguraError::RecordNotFound { id: id.0 }),
            Scoped::Foreign => Err(FiguraError::Forbidden(format!(
                "record {id} belongs to another user"
            ))),
        }
    }
}

fn row_to_record(row: &Row<'_>) -> Result<GenerationRecord, rusqlite::Error> {
    Ok(GenerationRecord {
        id: RecordId(row.get(0)?),
        owner: UserId(row.get(1)?),
        instructions: row.get(2)?,
        reference_image_ref: row.get::<_, Option<String>>(3)?.map(ArtifactRef),
        generated_2d_ref: row.get::<_, Option<String>>(4)?.map(ArtifactRef),
        generated_3d_ref: row.get::<_, Option<String>>(5)?.map(ArtifactRef),
        is_public: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn fetch_record(
    conn: &rusqlite::Connection,
    id: i64,
) -> Result<Option<GenerationRecord>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {RECORD_COLUMNS} FROM generation_records WHERE id = ?1"),
        params![id],
        row_to_record,
    )
    .optional()
}

fn check_owner(
    conn: &rusqlite::Connection,
    owner: UserId,
    id: i64,
) -> Result<Scoped<GenerationRecord>, rusqlite::Error> {
    Ok(match fetch_record(conn, id)? {
        None => Scoped::Missing,
        Some(record) if record.owner != owner => Scoped::Foreign,
        Some(record) => Scoped::Found(record),
    })
}

/// Escape LIKE wildcards so user search text matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Create a new record owned by `owner`.
pub async fn create_record(
    db: &Database,
    owner: UserId,
    record: &NewGenerationRecord,
) -> Result<GenerationRecord, FiguraError> {
    let record = record.clone();
    let created_at = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<GenerationRecord, rusqlite::Error> {
            conn.execute(
                "INSERT INTO generation_records
                   (owner_id, instructions, reference_image_ref, generated_2d_ref,
                    is_public, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    owner.0,
                    record.instructions,
                    record.reference_image_ref.map(|r| r.0),
                    record.generated_2d_ref.map(|r| r.0),
                    record.is_public,
                    created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();
            fetch_record(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a record owned by `owner`.
pub async fn get_record(
    db: &Database,
    owner: UserId,
    id: RecordId,
) -> Result<GenerationRecord, FiguraError> {
    db.connection()
        .call(move |conn| check_owner(conn, owner, id.0))
        .await
        .map_err(crate::database::map_tr_err)?
        .into_result(id)
}

/// List records owned by `owner`, newest first.
pub async fn list_records(
    db: &Database,
    owner: UserId,
    page: Page,
) -> Result<Vec<GenerationRecord>, FiguraError> {
    let limit = page.effective_limit();
    let skip = page.skip;
    db.connection()
        .call(move |conn| -> Result<Vec<GenerationRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM generation_records
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(params![owner.0, limit, skip], row_to_record)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial update to a record owned by `owner`.
pub async fn update_record(
    db: &Database,
    owner: UserId,
    id: RecordId,
    update: &RecordUpdate,
) -> Result<GenerationRecord, FiguraError> {
    let update = update.clone();
    db.connection()
        .call(move |conn| -> Result<Scoped<GenerationRecord>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current = match check_owner(&tx, owner, id.0)? {
                Scoped::Found(record) => record,
                Scoped::Missing => return Ok(Scoped::Missing),
                Scoped::Foreign => return Ok(Scoped::Foreign),
            };
            if update.is_empty() {
                return Ok(Scoped::Found(current));
            }

            tx.execute(
                "UPDATE generation_records SET
                   instructions = COALESCE(?2, instructions),
                   reference_image_ref = COALESCE(?3, reference_image_ref),
                   generated_2d_ref = COALESCE(?4, generated_2d_ref),
                   is_public = COALESCE(?5, is_public)
                 WHERE id = ?1",
                params![
                    id.0,
                    update.instructions,
                    update.reference_image_ref.map(|r| r.0),
                    update.generated_2d_ref.map(|r| r.0),
                    update.is_public,
                ],
            )?;
            let updated = fetch_record(&tx, id.0)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(Scoped::Found(updated))
        })
        .await
        .map_err(crate::database::map_tr_err)?
        .into_result(id)
}

/// Toggle the public flag of a record owned by `owner`.
pub async fn set_visibility(
    db: &Database,
    owner: UserId,
    id: RecordId,
    is_public: bool,
) -> Result<GenerationRecord, FiguraError> {
    let update = RecordUpdate {
        is_public: Some(is_public),
        ..RecordUpdate::default()
    };
    update_record(db, owner, id, &update).await
}

/// Delete a record owned by `owner`.
pub async fn delete_record(db: &Database, owner: UserId, id: RecordId) -> Result<(), FiguraError> {
    db.connection()
        .call(move |conn| -> Result<Scoped<()>, rusqlite::Error> {
            let tx = conn.transaction()?;
            match check_owner(&tx, owner, id.0)? {
                Scoped::Found(_) => {}
                Scoped::Missing => return Ok(Scoped::Missing),
                Scoped::Foreign => return Ok(Scoped::Foreign),
            }
            tx.execute(
                "DELETE FROM generation_records WHERE id = ?1",
                params![id.0],
            )?;
            tx.commit()?;
            Ok(Scoped::Found(()))
        })
        .await
        .map_err(crate::database::map_tr_err)?
        .into_result(id)
}

/// List public records, newest first, optionally filtered by a
/// case-insensitive substring of the instructions or owner username.
pub async fn list_public_records(
    db: &Database,
    search: Option<&str>,
    page: Page,
) -> Result<Vec<PublicRecord>, FiguraError> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));
    let limit = page.effective_limit();
    let skip = page.skip;

    db.connection()
        .call(move |conn| -> Result<Vec<PublicRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.owner_id, r.instructions, r.reference_image_ref,
                        r.generated_2d_ref, r.generated_3d_ref, r.is_public, r.created_at,
                        u.username
                 FROM generation_records r JOIN users u ON u.id = r.owner_id
                 WHERE r.is_public = 1
                   AND (?1 IS NULL
                        OR r.instructions LIKE ?1 ESCAPE '\\'
                        OR u.username LIKE ?1 ESCAPE '\\')
                 ORDER BY r.created_at DESC, r.id DESC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt.query_map(params![pattern, limit, skip], |row| {
                Ok(PublicRecord {
                    record: row_to_record(row)?,
                    owner_username: row.get(8)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Write the generated 3D reference onto a record.
///
/// Returns `false` without writing when the record already holds `artifact`,
/// so reconciling the same completion twice has no further effect.
pub async fn attach_generated_3d(
    db: &Database,
    id: RecordId,
    artifact: &ArtifactRef,
) -> Result<bool, FiguraError> {
    let artifact = artifact.0.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<Option<usize>, rusqlite::Error> {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM generation_records WHERE id = ?1)",
                params![id.0],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }
            let changed = conn.execute(
                "UPDATE generation_records SET generated_3d_ref = ?2
                 WHERE id = ?1 AND generated_3d_ref IS NOT ?2",
                params![id.0, artifact],
            )?;
            Ok(Some(changed))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match changed {
        Some(rows) => Ok(rows > 0),
        None => Err(FiguraError::RecordNotFound { id: id.0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("robot"), "robot");
    }
}
