//! Spreadsheet master export
//!
//! Always overwrites the single master file; never creates copies. The
//! export is a full rebuild from the store, so the file reflects the
//! current complete record set after every call.

use crate::database::list_all_ordered;
use crate::error::RegistryError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Column order of the master file, matching the `Part` fields
pub const HEADER: [&str; 9] = [
    "id",
    "vendor_code",
    "original_code",
    "name",
    "description",
    "equipment",
    "notes",
    "image_path",
    "status",
];

/// Regenerate the spreadsheet master from the full store contents
///
/// One header row plus one row per part, sorted ascending by vendor code.
/// The content is written to a temp file and renamed over the master path.
/// Returns the master path.
pub fn regenerate(conn: &Connection, export_path: &Path) -> Result<PathBuf, RegistryError> {
    let parts = list_all_ordered(conn)?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(HEADER)?;
    for part in &parts {
        wtr.serialize(part)?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| RegistryError::Csv(e.into_error().into()))?;

    if let Some(parent) = export_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = export_path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, export_path)?;

    log::info!(
        "Spreadsheet master regenerated: {} rows -> {}",
        parts.len(),
        export_path.display()
    );
    Ok(export_path.to_path_buf())
}
