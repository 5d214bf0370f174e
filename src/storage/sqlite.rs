//! SQLite storage implementation

use crate::capability::{Store, StoredDocument};
use crate::storage::schema::initialize_schema;
use crate::storage::StorageResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A stored document as read back from the database
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub url: String,
    pub final_url: String,
    pub depth: u32,
    pub status_code: u16,
    pub content_class: String,
    pub content: serde_json::Value,
    pub structured: serde_json::Value,
    pub stored_at: String,
}

/// SQLite-backed document store shared by all workers
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Each statement is atomic in SQLite, so a poisoned lock is still usable
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts or replaces the row for `document.url`
    pub fn upsert(&self, document: &StoredDocument) -> StorageResult<()> {
        let content = serde_json::to_string(&document.content)?;
        let structured = serde_json::to_string(&document.structured)?;
        let domain = crate::url::host_of(&document.url);

        self.conn().execute(
            "INSERT INTO documents (
                url, final_url, domain, depth, status_code, content_type,
                content_class, content_json, structured_json, size_bytes, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(url) DO UPDATE SET
                final_url = excluded.final_url,
                domain = excluded.domain,
                depth = excluded.depth,
                status_code = excluded.status_code,
                content_type = excluded.content_type,
                content_class = excluded.content_class,
                content_json = excluded.content_json,
                structured_json = excluded.structured_json,
                size_bytes = excluded.size_bytes,
                stored_at = excluded.stored_at",
            params![
                document.url,
                document.final_url,
                domain,
                document.depth,
                document.status,
                document.content_type,
                document.class.to_string(),
                content,
                structured,
                document.size_bytes as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Looks up the stored row for a URL
    pub fn get(&self, url: &str) -> StorageResult<Option<DocumentRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT url, final_url, depth, status_code, content_class,
                    content_json, structured_json, stored_at
             FROM documents WHERE url = ?1",
        )?;

        let raw = stmt
            .query_row(params![url], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, u16>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .optional()?;

        raw.map(
            |(url, final_url, depth, status_code, content_class, content, structured, stored_at)|
             -> StorageResult<DocumentRow> {
                Ok(DocumentRow {
                    url,
                    final_url,
                    depth,
                    status_code,
                    content_class,
                    content: serde_json::from_str(&content)?,
                    structured: serde_json::from_str(&structured)?,
                    stored_at,
                })
            },
        )
        .transpose()
    }

    /// Number of stored documents
    pub fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Store for SqliteStore {
    fn store(&self, document: &StoredDocument) -> crate::Result<()> {
        Ok(self.upsert(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ContentClass;
    use serde_json::json;
    use tempfile::TempDir;

    fn document(url: &str, text: &str) -> StoredDocument {
        StoredDocument {
            url: url.to_string(),
            final_url: url.to_string(),
            depth: 1,
            status: 200,
            content_type: Some("text/html".to_string()),
            class: ContentClass::Html,
            content: json!({ "text": text }),
            structured: json!({ "json_ld": [] }),
            size_bytes: text.len(),
        }
    }

    #[test]
    fn test_store_and_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.store(&document("https://example.com/a", "hello")).unwrap();

        let row = store.get("https://example.com/a").unwrap().unwrap();
        assert_eq!(row.depth, 1);
        assert_eq!(row.status_code, 200);
        assert_eq!(row.content_class, "html");
        assert_eq!(row.content["text"], "hello");
    }

    #[test]
    fn test_store_is_idempotent_per_url() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.store(&document("https://example.com/a", "first")).unwrap();
        store.store(&document("https://example.com/a", "second")).unwrap();
        store.store(&document("https://example.com/b", "other")).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let row = store.get("https://example.com/a").unwrap().unwrap();
        assert_eq!(row.content["text"], "second");
    }

    #[test]
    fn test_missing_document() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("https://example.com/none").unwrap().is_none());
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("out");
        let store = crate::storage::open_store(&output).unwrap();
        store.store(&document("https://example.com/", "x")).unwrap();
        assert!(output.join(crate::storage::DATABASE_FILE).exists());
    }
}
