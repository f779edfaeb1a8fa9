//! Database operations for the parts registry
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! The store is a single `parts` table; `vendor_code` uniqueness is
//! enforced at the schema level.

use crate::error::RegistryError;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// A spare part record as stored in the `parts` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: i64,
    pub vendor_code: String,
    pub original_code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub equipment: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
    pub status: String,
}

/// A part record ready for insertion (surrogate id not yet assigned)
#[derive(Debug, Clone)]
pub struct NewPart {
    pub vendor_code: String,
    pub original_code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub equipment: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
    pub status: String,
}

/// Initialize the database schema
///
/// Creates the `parts` table if it doesn't exist. Safe to call on every
/// process start.
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS parts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor_code TEXT UNIQUE NOT NULL,
            original_code TEXT,
            name TEXT NOT NULL,
            description TEXT,
            equipment TEXT,
            notes TEXT,
            image_path TEXT,
            status TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_parts_original_code ON parts(original_code);
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

const PART_COLUMNS: &str =
    "id, vendor_code, original_code, name, description, equipment, notes, image_path, status";

fn part_from_row(row: &Row<'_>) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        vendor_code: row.get(1)?,
        original_code: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        equipment: row.get(5)?,
        notes: row.get(6)?,
        image_path: row.get(7)?,
        status: row.get(8)?,
    })
}

/// Find the part whose vendor code or original code exactly equals `code`
///
/// Case-sensitive, exact match only. `vendor_code` is unique, so at most
/// one row matches on that branch.
pub fn find_by_code(conn: &Connection, code: &str) -> DbResult<Option<Part>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PART_COLUMNS} FROM parts
         WHERE vendor_code = ?1 OR original_code = ?1
         LIMIT 1",
    ))?;

    let mut rows = stmt.query(params![code])?;
    match rows.next()? {
        Some(row) => Ok(Some(part_from_row(row)?)),
        None => Ok(None),
    }
}

/// Insert a new part and return it with its assigned id
///
/// A `UNIQUE` violation on `vendor_code` is reported as
/// [`RegistryError::DuplicateCode`], not a crash.
pub fn insert_part(conn: &Connection, part: &NewPart) -> Result<Part, RegistryError> {
    let result = conn.execute(
        "INSERT INTO parts
         (vendor_code, original_code, name, description, equipment, notes, image_path, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &part.vendor_code,
            &part.original_code,
            &part.name,
            &part.description,
            &part.equipment,
            &part.notes,
            &part.image_path,
            &part.status,
        ],
    );

    match result {
        Ok(_) => Ok(Part {
            id: conn.last_insert_rowid(),
            vendor_code: part.vendor_code.clone(),
            original_code: part.original_code.clone(),
            name: part.name.clone(),
            description: part.description.clone(),
            equipment: part.equipment.clone(),
            notes: part.notes.clone(),
            image_path: part.image_path.clone(),
            status: part.status.clone(),
        }),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(RegistryError::DuplicateCode(part.vendor_code.clone()))
        }
        Err(e) => Err(RegistryError::Database(e)),
    }
}

/// Delete the part with the given id
///
/// Returns `false` when the id does not exist; that is a no-op, not an
/// error.
pub fn delete_part(conn: &Connection, id: i64) -> DbResult<bool> {
    let affected = conn.execute("DELETE FROM parts WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Full scan of the store, sorted ascending by vendor code
///
/// Used by the spreadsheet exporter.
pub fn list_all_ordered(conn: &Connection) -> DbResult<Vec<Part>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PART_COLUMNS} FROM parts ORDER BY vendor_code ASC",
    ))?;

    let results: DbResult<Vec<Part>> = stmt.query_map([], |row| part_from_row(row))?.collect();
    results
}

/// Get total count of parts in the database
pub fn part_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM parts", [], |row| row.get(0))
}
