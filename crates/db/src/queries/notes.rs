// crates/db/src/queries/notes.rs
//! Notes attached to documents.

use crate::{Database, DbError, DbResult};
use docrepo_core::{Note, NoteVisibility, ValidationError};
use sqlx::Row;

struct NoteRow {
    id: i64,
    document_id: i64,
    message: String,
    creator: Option<String>,
    visibility: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for NoteRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            document_id: row.try_get("document_id")?,
            message: row.try_get("message")?,
            creator: row.try_get("creator")?,
            visibility: row.try_get("visibility")?,
        })
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = DbError;

    fn try_from(row: NoteRow) -> DbResult<Self> {
        let visibility: NoteVisibility =
            row.visibility.parse().map_err(ValidationError::from)?;
        Ok(Note {
            id: Some(row.id),
            document_id: row.document_id,
            message: row.message,
            creator: row.creator,
            visibility,
        })
    }
}

impl Database {
    /// Insert or update a note. The referenced document must exist.
    pub async fn store_note(&self, note: &mut Note) -> DbResult<i64> {
        note.validate()?;

        if let Some(id) = note.id {
            let result = sqlx::query(
                "UPDATE notes SET document_id = ?, message = ?, creator = ?, visibility = ? WHERE id = ?",
            )
            .bind(note.document_id)
            .bind(&note.message)
            .bind(&note.creator)
            .bind(note.visibility.as_str())
            .bind(id)
            .execute(self.pool())
            .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::NotFound { entity: "note", id });
            }
            return Ok(id);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO notes (document_id, message, creator, visibility) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(note.document_id)
        .bind(&note.message)
        .bind(&note.creator)
        .bind(note.visibility.as_str())
        .fetch_one(self.pool())
        .await?;
        note.id = Some(id);
        Ok(id)
    }

    /// Notes of a document in insertion order, optionally only one visibility.
    pub async fn notes_for_document(
        &self,
        document_id: i64,
        visibility: Option<NoteVisibility>,
    ) -> DbResult<Vec<Note>> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            "SELECT id, document_id, message, creator, visibility FROM notes
             WHERE document_id = ?1 AND (?2 IS NULL OR visibility = ?2)
             ORDER BY id ASC",
        )
        .bind(document_id)
        .bind(visibility.map(|v| v.as_str()))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Note::try_from).collect()
    }

    pub async fn delete_note(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
