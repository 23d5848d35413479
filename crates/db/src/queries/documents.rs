// crates/db/src/queries/documents.rs
//! Document CRUD.

use crate::{now_unix, Database, DbError, DbResult};
use docrepo_core::{Document, ServerState, ValidationError};
use sqlx::Row;
use tracing::debug;

const DOCUMENT_COLUMNS: &str =
    "id, doc_type, server_state, language, server_date_created, server_date_modified";

struct DocumentRow {
    id: i64,
    doc_type: String,
    server_state: String,
    language: Option<String>,
    server_date_created: i64,
    server_date_modified: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for DocumentRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            doc_type: row.try_get("doc_type")?,
            server_state: row.try_get("server_state")?,
            language: row.try_get("language")?,
            server_date_created: row.try_get("server_date_created")?,
            server_date_modified: row.try_get("server_date_modified")?,
        })
    }
}

impl TryFrom<DocumentRow> for Document {
    type Error = DbError;

    fn try_from(row: DocumentRow) -> DbResult<Self> {
        let server_state: ServerState = row
            .server_state
            .parse()
            .map_err(ValidationError::from)?;
        Ok(Document {
            id: Some(row.id),
            doc_type: row.doc_type,
            server_state,
            language: row.language,
            server_date_created: Some(row.server_date_created),
            server_date_modified: Some(row.server_date_modified),
        })
    }
}

impl Database {
    /// Insert a new document or update an existing one.
    ///
    /// `server_date_created` is set once on insert; `server_date_modified` is
    /// refreshed on every call.
    pub async fn store_document(&self, doc: &mut Document) -> DbResult<i64> {
        doc.validate()?;
        let now = now_unix();

        if let Some(id) = doc.id {
            let result = sqlx::query(
                "UPDATE documents SET doc_type = ?, server_state = ?, language = ?, server_date_modified = ?
                 WHERE id = ?",
            )
            .bind(&doc.doc_type)
            .bind(doc.server_state.as_str())
            .bind(&doc.language)
            .bind(now)
            .bind(id)
            .execute(self.pool())
            .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::NotFound {
                    entity: "document",
                    id,
                });
            }
            doc.server_date_modified = Some(now);
            return Ok(id);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO documents (doc_type, server_state, language, server_date_created, server_date_modified)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&doc.doc_type)
        .bind(doc.server_state.as_str())
        .bind(&doc.language)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        doc.id = Some(id);
        doc.server_date_created = Some(now);
        doc.server_date_modified = Some(now);
        debug!(document.id = id, state = %doc.server_state, "Stored document");
        Ok(id)
    }

    pub async fn get_document(&self, id: i64) -> DbResult<Option<Document>> {
        let row: Option<DocumentRow> =
            sqlx::query_as(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        row.map(Document::try_from).transpose()
    }

    /// Delete a document together with its notes.
    pub async fn delete_document(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn documents_by_state(&self, state: ServerState) -> DbResult<Vec<Document>> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE server_state = ? ORDER BY id ASC"
        ))
        .bind(state.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(Document::try_from).collect()
    }
}
