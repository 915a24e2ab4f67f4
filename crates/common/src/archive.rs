//! Zip codec for website bundles.
//!
//! Bundles travel as flat lists of [`BundleFile`]s whose paths are relative,
//! `/`-separated and free of `..` components. Decoding never touches the
//! filesystem, so a rejected upload leaves stored content untouched.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{AppError, AppResult};

/// A single file of a website bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Relative path inside the bundle, `/`-separated.
    pub path: String,
    /// File contents.
    pub contents: Vec<u8>,
}

impl BundleFile {
    /// Create a bundle file.
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Whether an uploaded file name denotes a zip archive.
#[must_use]
pub fn is_zip_name(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; whitespace becomes `_`.
/// Returns `None` when nothing usable is left.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Normalize a relative path into `/`-separated form.
///
/// Returns `None` for absolute paths and anything containing `..`.
#[must_use]
pub fn normalize_relative_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Decode a zip archive into bundle files.
///
/// Fails with [`AppError::InvalidArchive`] on corrupt data, on any entry
/// whose name escapes the bundle root or collides with another entry, and
/// when the decompressed total exceeds `max_extracted_bytes`.
pub fn unpack(bytes: &[u8], max_extracted_bytes: u64) -> AppResult<Vec<BundleFile>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::InvalidArchive(e.to_string()))?;

    let mut files = Vec::with_capacity(archive.len());
    let mut total: u64 = 0;

    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| AppError::InvalidArchive(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let path = entry
            .enclosed_name()
            .as_deref()
            .and_then(normalize_relative_path)
            .ok_or_else(|| {
                AppError::InvalidArchive(format!("unsafe entry path: {}", entry.name()))
            })?;

        // Declared sizes are not trusted; read at most one byte past the budget.
        let remaining = max_extracted_bytes.saturating_sub(total);
        let mut contents = Vec::new();
        entry
            .take(remaining + 1)
            .read_to_end(&mut contents)
            .map_err(|e| AppError::InvalidArchive(e.to_string()))?;

        total += contents.len() as u64;
        if total > max_extracted_bytes {
            return Err(AppError::InvalidArchive(format!(
                "archive expands beyond {max_extracted_bytes} bytes"
            )));
        }

        files.push(BundleFile { path, contents });
    }

    check_layout(&files)?;
    Ok(files)
}

/// Reject duplicate paths and files that would also have to be directories.
fn check_layout(files: &[BundleFile]) -> AppResult<()> {
    let mut paths = BTreeSet::new();
    for file in files {
        if !paths.insert(file.path.as_str()) {
            return Err(AppError::InvalidArchive(format!(
                "duplicate entry: {}",
                file.path
            )));
        }
    }

    for path in &paths {
        let mut rest = *path;
        while let Some((parent, _)) = rest.rsplit_once('/') {
            if paths.contains(parent) {
                return Err(AppError::InvalidArchive(format!(
                    "entry {parent} is both a file and a directory"
                )));
            }
            rest = parent;
        }
    }
    Ok(())
}

/// Encode bundle files into a deflated zip archive.
pub fn pack(files: &[BundleFile]) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        writer
            .start_file(file.path.as_str(), options)
            .map_err(|e| AppError::Internal(format!("Failed to write zip entry: {e}")))?;
        writer.write_all(&file.contents)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| AppError::Internal(format!("Failed to finish zip archive: {e}")))?;
    Ok(cursor.into_inner())
}
