//! Part service: lookup, registration and deletion
//!
//! Orchestrates validation, image intake and the spreadsheet export around
//! the store calls. The export and the image write are explicit hooks here
//! so the database layer stays free of file side effects.

use crate::database::{self, NewPart, Part};
use crate::error::RegistryError;
use crate::export;
use crate::images;
use rusqlite::Connection;
use std::path::PathBuf;

/// Locations for persisted state outside the database
#[derive(Debug, Clone)]
pub struct StoragePaths {
    /// Directory for uploaded part images
    pub images_dir: PathBuf,
    /// Fixed path of the spreadsheet master
    pub export_path: PathBuf,
}

/// Raw form input for a new part, untrimmed
#[derive(Debug, Clone, Default)]
pub struct PartInput {
    pub vendor_code: String,
    pub original_code: String,
    pub name: String,
    pub description: String,
    pub equipment: String,
    pub notes: String,
    pub status: String,
}

/// An uploaded image file: original filename plus content
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Exact-code lookup
///
/// An empty or whitespace-only query is rejected before any store call.
pub fn search(conn: &Connection, query: &str) -> Result<Option<Part>, RegistryError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(RegistryError::Validation(
            "Enter a code to search.".to_string(),
        ));
    }
    Ok(database::find_by_code(conn, query)?)
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Register a new part, optionally with an uploaded image
///
/// The image is persisted before the insert, so a duplicate-code failure
/// leaves the already-written file behind. On success the spreadsheet
/// master is regenerated synchronously before returning.
pub fn create(
    conn: &Connection,
    paths: &StoragePaths,
    input: &PartInput,
    upload: Option<&Upload>,
) -> Result<Part, RegistryError> {
    let vendor_code = input.vendor_code.trim();
    let name = input.name.trim();
    if vendor_code.is_empty() || name.is_empty() {
        return Err(RegistryError::Validation(
            "Vendor code and name are required.".to_string(),
        ));
    }

    let image_path = match upload {
        Some(upload) => Some(images::store_image(
            &paths.images_dir,
            vendor_code,
            &upload.filename,
            &upload.bytes,
        )?),
        None => None,
    };

    let part = database::insert_part(
        conn,
        &NewPart {
            vendor_code: vendor_code.to_string(),
            original_code: optional(&input.original_code),
            name: name.to_string(),
            description: optional(&input.description),
            equipment: optional(&input.equipment),
            notes: optional(&input.notes),
            image_path,
            status: optional(&input.status).unwrap_or_else(|| "Active".to_string()),
        },
    )?;

    export::regenerate(conn, &paths.export_path)?;
    log::info!("Registered part {} (id {})", part.vendor_code, part.id);
    Ok(part)
}

/// Delete a part by id
///
/// A missing id is treated as success. The image file, if any, is not
/// cleaned up; the spreadsheet master is regenerated either way.
pub fn delete(conn: &Connection, paths: &StoragePaths, id: i64) -> Result<(), RegistryError> {
    let existed = database::delete_part(conn, id)?;
    export::regenerate(conn, &paths.export_path)?;

    if existed {
        log::info!("Deleted part id {}", id);
    } else {
        log::info!("Delete requested for unknown part id {}", id);
    }
    Ok(())
}
