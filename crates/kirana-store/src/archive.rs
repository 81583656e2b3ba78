//! # Deleted-Product Archive
//!
//! `deleted_products.json` keeps removed products so they can be put back.
//!
//! ```text
//! {
//!   "Savour Mix 200g": {
//!     "product_data": { "Sr_No": "7", "Product_Name": "Savour Mix 200g", ... },
//!     "deleted_at": "2025-08-14 12:34:56",
//!     "deleted_by": "Admin"
//!   }
//! }
//! ```
//!
//! Entries are keyed by product name; only the most recent
//! [`DEFAULT_ARCHIVE_LIMIT`] deletions are kept. `product_data` holds the full
//! sheet row, unknown columns included, so a restore brings those back too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use kirana_core::Product;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::catalog::{product_from_cells, CatalogLayout, LoadedCatalog, KNOWN_COLUMNS};
use crate::error::{StoreError, StoreResult};
use crate::fsio;

pub const DEFAULT_ARCHIVE_LIMIT: usize = 50;

const DELETED_BY: &str = "Admin";

// =============================================================================
// Entry
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedProduct {
    /// Sheet row by header. Older files wrote numbers as JSON numbers.
    #[serde(deserialize_with = "cells_as_text")]
    pub product_data: BTreeMap<String, String>,
    #[serde(with = "archive_time")]
    pub deleted_at: NaiveDateTime,
    #[serde(default)]
    pub deleted_by: String,
}

impl ArchivedProduct {
    /// The archived row as a product. The id is blank when the row had none.
    pub fn product(&self) -> Product {
        product_from_cells(
            |col| self.product_data.get(col).map(String::as_str),
            "",
        )
    }

    /// Cells of columns outside the product fields.
    pub fn extras(&self) -> BTreeMap<String, String> {
        self.product_data
            .iter()
            .filter(|(h, _)| !KNOWN_COLUMNS.contains(&h.as_str()))
            .map(|(h, v)| (h.clone(), v.clone()))
            .collect()
    }
}

fn cells_as_text<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(d)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

mod archive_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(de::Error::custom)
    }
}

// =============================================================================
// Archive File
// =============================================================================

/// Repository for the deleted-product archive.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    path: PathBuf,
    limit: usize,
}

impl ArchiveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ArchiveFile {
            path: path.into(),
            limit: DEFAULT_ARCHIVE_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<BTreeMap<String, ArchivedProduct>> {
        let Some(bytes) = fsio::read_optional(&self.path)? else {
            return Ok(BTreeMap::new());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::json(&self.path, e))
    }

    fn save(&self, entries: &BTreeMap<String, ArchivedProduct>) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec_pretty(entries).map_err(|e| StoreError::json(&self.path, e))?;
        fsio::write_replacing(&self.path, &bytes, false)
    }

    /// Archived products, most recently deleted first.
    pub fn list(&self) -> StoreResult<Vec<(String, ArchivedProduct)>> {
        let mut entries: Vec<_> = self.load()?.into_iter().collect();
        entries.sort_by(|a, b| b.1.deleted_at.cmp(&a.1.deleted_at));
        Ok(entries)
    }

    /// Records a removed product with its full sheet row.
    ///
    /// A previous entry under the same name is replaced. The oldest entries
    /// are dropped beyond the limit.
    pub fn archive(
        &self,
        product: &Product,
        layout: &CatalogLayout,
        deleted_at: NaiveDateTime,
    ) -> StoreResult<()> {
        let mut entries = self.load()?;
        entries.insert(
            product.name.clone(),
            ArchivedProduct {
                product_data: layout.record(product),
                deleted_at,
                deleted_by: DELETED_BY.to_string(),
            },
        );

        if entries.len() > self.limit {
            let mut by_age: Vec<(NaiveDateTime, String)> = entries
                .iter()
                .map(|(name, e)| (e.deleted_at, name.clone()))
                .collect();
            by_age.sort();
            let excess = entries.len() - self.limit;
            for (_, name) in by_age.into_iter().take(excess) {
                entries.remove(&name);
            }
        }

        self.save(&entries)?;
        info!(name = %product.name, archived = entries.len(), "Archived deleted product");
        Ok(())
    }

    /// Puts an archived product back into a loaded catalog.
    ///
    /// The entry leaves the archive only once the catalog accepted it. The
    /// caller still has to save the catalog.
    pub fn restore(&self, name: &str, loaded: &mut LoadedCatalog) -> StoreResult<Product> {
        let mut entries = self.load()?;
        let entry = entries
            .get(name)
            .ok_or_else(|| StoreError::not_found("Archived product", name))?;

        let extras = entry.extras();
        let mut product = entry.product();
        if product.id.is_empty() {
            product.id = loaded.catalog.next_id();
        }
        let restored = loaded.catalog.restore_product(product)?.clone();
        loaded.layout.set_extras(&restored.id, &extras);

        entries.remove(name);
        self.save(&entries)?;
        debug!(name = %name, product_id = %restored.id, "Removed entry from archive");
        Ok(restored)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_legacy_numeric_cells() {
        let json = r#"{
            "Tea 250g": {
                "product_data": {"Sr_No": 3, "Product_Name": "Tea 250g", "Cost_Price": 80.5, "Barcode": null},
                "deleted_at": "2025-08-14 09:30:00"
            }
        }"#;
        let entries: BTreeMap<String, ArchivedProduct> = serde_json::from_str(json).unwrap();
        let entry = &entries["Tea 250g"];
        assert_eq!(entry.product_data["Sr_No"], "3");
        assert_eq!(entry.product_data["Barcode"], "");
        assert_eq!(entry.deleted_by, "");

        let product = entry.product();
        assert_eq!(product.id, "3");
        assert_eq!(product.cost_price.unwrap().paise(), 8050);
        assert_eq!(product.barcode, None);
    }

    #[test]
    fn test_archive_keeps_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ArchiveFile::new(dir.path().join("deleted_products.json")).with_limit(2);
        let layout = CatalogLayout::default();

        for (hour, name) in [(9, "A"), (11, "B"), (10, "C")] {
            archive
                .archive(&Product::new("1", name), &layout, at(hour))
                .unwrap();
        }

        let names: Vec<String> = archive.list().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}
