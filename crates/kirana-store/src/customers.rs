//! Customer book file (`customers.json`).

use std::path::{Path, PathBuf};

use kirana_core::customer::CustomerBook;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::fsio;

/// Repository for the customer book.
#[derive(Debug, Clone)]
pub struct CustomerFile {
    path: PathBuf,
    backup: bool,
}

impl CustomerFile {
    pub fn new(path: impl Into<PathBuf>, backup: bool) -> Self {
        CustomerFile {
            path: path.into(),
            backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the book. A missing or blank file is an empty book.
    pub fn load(&self) -> StoreResult<CustomerBook> {
        let Some(bytes) = fsio::read_optional(&self.path)? else {
            return Ok(CustomerBook::new());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CustomerBook::new());
        }
        let book: CustomerBook =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::json(&self.path, e))?;
        debug!(path = %self.path.display(), customers = book.len(), "Loaded customers");
        Ok(book)
    }

    pub fn save(&self, book: &CustomerBook) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec_pretty(book).map_err(|e| StoreError::json(&self.path, e))?;
        fsio::write_replacing(&self.path, &bytes, self.backup)?;
        debug!(path = %self.path.display(), customers = book.len(), "Saved customers");
        Ok(())
    }
}
