/// Inline SQL migrations for the docrepo database schema.
///
/// Entries are applied in order and tracked by 1-based position in the
/// `_migrations` table, so existing entries must never be reordered or edited.

pub const MIGRATIONS: &[&str] = &[
    // Job queue (versions 1-2). The UNIQUE fingerprint column is what actually
    // prevents two equivalent jobs from being queued.
    r#"
CREATE TABLE IF NOT EXISTS jobs (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    label       TEXT NOT NULL,
    data        TEXT NOT NULL DEFAULT '',
    fingerprint TEXT NOT NULL UNIQUE,
    state       TEXT CHECK (state IS NULL OR state IN ('processing', 'failed', 'undefined')),
    errors      TEXT,
    created_at  INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_label_state ON jobs(label, state);"#,
    // Documents (versions 3-4).
    r#"
CREATE TABLE IF NOT EXISTS documents (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_type             TEXT NOT NULL,
    server_state         TEXT NOT NULL DEFAULT 'unpublished'
        CHECK (server_state IN ('published', 'unpublished', 'deleted', 'temporary', 'audited', 'inprogress', 'restricted')),
    language             TEXT,
    server_date_created  INTEGER NOT NULL,
    server_date_modified INTEGER NOT NULL
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_documents_server_state ON documents(server_state);"#,
    // Notes (versions 5-6). Cascade needs `foreign_keys` on the connection.
    r#"
CREATE TABLE IF NOT EXISTS notes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    message     TEXT NOT NULL,
    creator     TEXT,
    visibility  TEXT NOT NULL DEFAULT 'private' CHECK (visibility IN ('private', 'public'))
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_notes_document ON notes(document_id);"#,
];
