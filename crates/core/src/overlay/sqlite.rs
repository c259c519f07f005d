//! SQLite-backed overlay store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{parse_overlay_id, validate_new_overlay, Overlay, OverlayError, OverlayStore};

/// SQLite-backed overlay store. Documents are kept as JSON text.
pub struct SqliteOverlayStore {
    conn: Mutex<Connection>,
}

impl SqliteOverlayStore {
    /// Create a new SQLite overlay store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, OverlayError> {
        let conn = Connection::open(path).map_err(|e| OverlayError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite overlay store (useful for testing).
    pub fn in_memory() -> Result<Self, OverlayError> {
        let conn =
            Connection::open_in_memory().map_err(|e| OverlayError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OverlayError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS overlays (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_overlays_created_at ON overlays(created_at);
            "#,
        )
        .map_err(|e| OverlayError::Database(e.to_string()))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn encode(doc: &Map<String, Value>) -> Result<String, OverlayError> {
        serde_json::to_string(doc).map_err(|e| OverlayError::Database(e.to_string()))
    }
}

impl OverlayStore for SqliteOverlayStore {
    fn create(&self, mut doc: Map<String, Value>) -> Result<String, OverlayError> {
        validate_new_overlay(&doc)?;
        doc.remove("_id");

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let document = Self::encode(&doc)?;

        self.conn()
            .execute(
                "INSERT INTO overlays (id, document, created_at, updated_at) VALUES (?, ?, ?, ?)",
                params![id, document, now, now],
            )
            .map_err(|e| OverlayError::Database(e.to_string()))?;

        Ok(id)
    }

    fn list(&self) -> Result<Vec<Overlay>, OverlayError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, document FROM overlays ORDER BY created_at, rowid")
            .map_err(|e| OverlayError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| OverlayError::Database(e.to_string()))?;

        let mut overlays = Vec::new();
        for row in rows {
            let (id, document) = row.map_err(|e| OverlayError::Database(e.to_string()))?;
            // Rows are only ever written from a serialized map
            let fields: Map<String, Value> = serde_json::from_str(&document).unwrap_or_default();
            overlays.push(Overlay { id, fields });
        }
        Ok(overlays)
    }

    fn update(&self, id: &str, mut patch: Map<String, Value>) -> Result<(), OverlayError> {
        let id = parse_overlay_id(id)?;
        patch.remove("_id");

        let conn = self.conn();
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM overlays WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| OverlayError::Database(e.to_string()))?;

        let Some(document) = document else {
            return Err(OverlayError::NotFound(id));
        };

        let mut fields: Map<String, Value> = serde_json::from_str(&document).unwrap_or_default();
        fields.extend(patch);

        conn.execute(
            "UPDATE overlays SET document = ?, updated_at = ? WHERE id = ?",
            params![Self::encode(&fields)?, Utc::now().to_rfc3339(), id],
        )
        .map_err(|e| OverlayError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), OverlayError> {
        let id = parse_overlay_id(id)?;
        let deleted = self
            .conn()
            .execute("DELETE FROM overlays WHERE id = ?", params![id])
            .map_err(|e| OverlayError::Database(e.to_string()))?;

        if deleted == 0 {
            return Err(OverlayError::NotFound(id));
        }
        Ok(())
    }
}
