//! File replacement and CSV append helpers shared by every store file.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// `inventory_master.csv` → `inventory_master.csv.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Replaces `path` with `bytes`.
///
/// The previous content is copied to [`backup_path`] first when `backup` is
/// set. The new content goes to a temp file in the same directory that is then
/// renamed over the target, so readers never see a half-written file. The
/// temp file is removed if any step fails.
pub fn write_replacing(path: &Path, bytes: &[u8], backup: bool) -> StoreResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    if backup && path.exists() {
        let bak = backup_path(path);
        fs::copy(path, &bak).map_err(|e| StoreError::io(&bak, e))?;
        debug!(backup = %bak.display(), "Backed up file");
    }

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

/// Reads a file, mapping "not found" to `None`.
pub fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

/// Appends rows to a CSV log, creating it with `columns` when missing.
///
/// An existing file keeps its own header: each row is written in that
/// column order and cells for unknown headers stay empty.
pub fn append_csv_rows(
    path: &Path,
    columns: &[&str],
    rows: &[HashMap<&'static str, String>],
) -> StoreResult<()> {
    let existing = read_optional(path)?
        .map(|bytes| read_csv_headers(path, &bytes))
        .transpose()?
        .flatten();

    let headers: Vec<String> = match &existing {
        Some(h) => h.clone(),
        None => columns.iter().map(|c| c.to_string()).collect(),
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if existing.is_none() {
        writer
            .write_record(&headers)
            .map_err(|e| StoreError::csv(path, e))?;
    }
    for cells in rows {
        let row: Vec<&str> = headers
            .iter()
            .map(|h| cells.get(h.as_str()).map(String::as_str).unwrap_or(""))
            .collect();
        writer
            .write_record(&row)
            .map_err(|e| StoreError::csv(path, e))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))?;

    if existing.is_none() {
        return write_replacing(path, &bytes, false);
    }
    let needs_newline = !ends_with_newline(path)?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io(path, e))?;
    if needs_newline {
        file.write_all(b"\n").map_err(|e| StoreError::io(path, e))?;
    }
    file.write_all(&bytes).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn read_csv_headers(path: &Path, bytes: &[u8]) -> StoreResult<Option<Vec<String>>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes);
    let headers = reader.headers().map_err(|e| StoreError::csv(path, e))?;
    Ok(Some(headers.iter().map(str::to_string).collect()))
}

fn ends_with_newline(path: &Path) -> StoreResult<bool> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    Ok(bytes.last().map_or(true, |b| *b == b'\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_replacing_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sheet.csv");

        write_replacing(&path, b"v1", true).unwrap();
        assert!(!backup_path(&path).exists());

        write_replacing(&path, b"v2", true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"v2");
        assert_eq!(fs::read(backup_path(&path)).unwrap(), b"v1");
        assert_eq!(backup_path(&path).file_name().unwrap(), "sheet.csv.bak");
    }

    #[test]
    fn test_failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inside"), b"x").unwrap();

        assert!(write_replacing(&path, b"v1", false).is_err());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("sheet.csv")]);
    }

    #[test]
    fn test_append_csv_rows_keeps_existing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let row = |a: &str, b: &str| HashMap::from([("A", a.to_string()), ("B", b.to_string())]);

        append_csv_rows(&path, &["A", "B"], &[row("1", "x")]).unwrap();
        fs::write(&path, "B,A\nold,0").unwrap();
        append_csv_rows(&path, &["A", "B"], &[row("2", "y")]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "B,A\nold,0\ny,2\n");
    }

    #[test]
    fn test_read_optional_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("nope.json")).unwrap().is_none());
    }
}
