//! Image intake for part records
//!
//! Validates uploads against a fixed extension allow-list and persists
//! them under a deterministic name derived from the vendor code. No image
//! decoding or content sniffing happens here; the extension check is the
//! whole validation.

use crate::error::RegistryError;
use std::path::Path;

/// File extensions accepted for uploaded part images (lower-case, with dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp"];

/// Filesystem-safe token for a vendor code
///
/// Every run of characters outside `[A-Za-z0-9_-]` collapses to a single
/// underscore; the input is trimmed first.
pub fn sanitize_code(code: &str) -> String {
    let mut token = String::with_capacity(code.len());
    let mut in_run = false;
    for c in code.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            token.push(c);
            in_run = false;
        } else if !in_run {
            token.push('_');
            in_run = true;
        }
    }
    token
}

/// Lower-cased extension of an uploaded filename, including the dot
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Persist an uploaded image and return its relative path
///
/// The file is stored as `<sanitized_code><extension>`, overwriting any
/// existing file of that exact name. Two parts whose codes sanitize to the
/// same token and share an extension overwrite each other's image. The
/// content goes to a temp file first and is renamed into place.
pub fn store_image(
    images_dir: &Path,
    vendor_code: &str,
    filename: &str,
    bytes: &[u8],
) -> Result<String, RegistryError> {
    let ext = extension_of(filename)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| RegistryError::Validation("Image format not allowed.".to_string()))?;

    std::fs::create_dir_all(images_dir)?;

    let final_name = format!("{}{}", sanitize_code(vendor_code), ext);
    let dest = images_dir.join(&final_name);
    let tmp = images_dir.join(format!("{final_name}.tmp"));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, &dest)?;

    log::info!("Stored image {}", dest.display());
    Ok(format!("images/{final_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_code("W-100_b"), "W-100_b");
        assert_eq!(sanitize_code("ABC123"), "ABC123");
    }

    #[test]
    fn sanitize_collapses_runs_of_unsafe_characters() {
        assert_eq!(sanitize_code("W 100"), "W_100");
        assert_eq!(sanitize_code("W / # 100"), "W_100");
        assert_eq!(sanitize_code("código:100"), "c_digo_100");
    }

    #[test]
    fn sanitize_trims_input() {
        assert_eq!(sanitize_code("  W-100  "), "W-100");
    }

    #[test]
    fn store_writes_file_and_returns_relative_path() {
        let dir = TempDir::new().unwrap();
        let path = store_image(dir.path(), "W-100", "photo.png", b"fake png").unwrap();

        assert_eq!(path, "images/W-100.png");
        let stored = std::fs::read(dir.path().join("W-100.png")).unwrap();
        assert_eq!(stored, b"fake png");
    }

    #[test]
    fn extension_is_lower_cased() {
        let dir = TempDir::new().unwrap();
        let path = store_image(dir.path(), "W-100", "PHOTO.JPG", b"fake jpg").unwrap();
        assert_eq!(path, "images/W-100.jpg");
    }

    #[test]
    fn disallowed_extension_is_rejected_before_any_write() {
        let dir = TempDir::new().unwrap();
        let result = store_image(dir.path(), "W-100", "animation.gif", b"fake gif");

        match result {
            Err(RegistryError::Validation(msg)) => assert!(msg.contains("not allowed")),
            other => panic!("expected Validation, got {:?}", other),
        }
        // Nothing was written, not even the images directory
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn missing_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(store_image(dir.path(), "W-100", "photo", b"data").is_err());
    }

    #[test]
    fn same_token_same_extension_overwrites() {
        let dir = TempDir::new().unwrap();

        store_image(dir.path(), "W 100", "a.png", b"first").unwrap();
        let path = store_image(dir.path(), "W/100", "b.png", b"second").unwrap();

        assert_eq!(path, "images/W_100.png");
        let stored = std::fs::read(dir.path().join("W_100.png")).unwrap();
        assert_eq!(stored, b"second");
        // Only the one overwritten file exists
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
