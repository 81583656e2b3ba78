//! # Catalog File
//!
//! Loads and saves the inventory sheet (`inventory_master.csv`).
//!
//! ## Column Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sr_No,Product_Name,Cost_Price,MRP,SP_5_Percent,...,Barcode,Sell_Price  │
//! │    │       │           │       │        │               │        │      │
//! │    ▼       ▼           ▼       ▼        ▼               ▼        ▼      │
//! │  known columns ──► Product fields      unknown columns ──► CatalogLayout│
//! │                                                                         │
//! │  save(): rows rebuilt in the original column order, unknown cells      │
//! │          written back untouched, Sell_Price / Barcode appended when    │
//! │          the sheet lacks them and some product needs them              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `Product_Name` is mandatory. A bad numeric cell loads as "absent"
//! with a warning; it never fails the whole sheet.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use kirana_core::money::Money;
use kirana_core::search::normalize_barcode;
use kirana_core::{Catalog, Product, MAX_STOCK_QTY};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::fsio;

// =============================================================================
// Column Names
// =============================================================================

pub const COL_ID: &str = "Sr_No";
pub const COL_NAME: &str = "Product_Name";
pub const COL_COST: &str = "Cost_Price";
pub const COL_MRP: &str = "MRP";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_CATEGORY: &str = "Category";
pub const COL_BARCODE: &str = "Barcode";
pub const COL_SELL_PRICE: &str = "Sell_Price";

/// Columns this crate reads and writes. Everything else is carried along.
pub const KNOWN_COLUMNS: [&str; 8] = [
    COL_ID,
    COL_NAME,
    COL_COST,
    COL_MRP,
    COL_QUANTITY,
    COL_CATEGORY,
    COL_BARCODE,
    COL_SELL_PRICE,
];

fn is_known(column: &str) -> bool {
    KNOWN_COLUMNS.contains(&column)
}

// =============================================================================
// Layout
// =============================================================================

/// What the sheet looked like on load, beyond the product fields.
///
/// Keeps the header order and, per product id, the original row, so that
/// columns this crate does not understand survive a save unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLayout {
    headers: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl CatalogLayout {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Unknown-column cells of one product, by header.
    pub fn extras(&self, product_id: &str) -> BTreeMap<String, String> {
        let Some(row) = self.rows.get(product_id) else {
            return BTreeMap::new();
        };
        self.headers
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| !is_known(h))
            .map(|(h, v)| (h.clone(), v.clone()))
            .collect()
    }

    /// Attaches unknown-column cells to a product (e.g. after a restore).
    /// Headers the sheet has never seen are appended.
    pub fn set_extras(&mut self, product_id: &str, extras: &BTreeMap<String, String>) {
        for header in extras.keys() {
            if !is_known(header) && !self.headers.contains(header) {
                self.headers.push(header.clone());
            }
        }
        let row = self
            .headers
            .iter()
            .map(|h| extras.get(h).cloned().unwrap_or_default())
            .collect();
        self.rows.insert(product_id.to_string(), row);
    }

    /// The product as a full sheet row keyed by header.
    pub fn record(&self, product: &Product) -> BTreeMap<String, String> {
        let mut record = self.extras(&product.id);
        record.extend(
            known_cells(product)
                .into_iter()
                .map(|(h, v)| (h.to_string(), v)),
        );
        record
    }
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Builds a product from cell lookups. `fallback_id` is used when the sheet
/// has no usable `Sr_No`.
pub fn product_from_cells<'a>(
    cell: impl Fn(&str) -> Option<&'a str>,
    fallback_id: &str,
) -> Product {
    let text = |col: &str| cell(col).map(str::trim).filter(|s| !s.is_empty());

    let id = text(COL_ID)
        .and_then(normalize_barcode)
        .unwrap_or_else(|| fallback_id.to_string());
    let name = text(COL_NAME).unwrap_or_default().to_string();

    let money = |col: &str| -> Option<Money> {
        let raw = text(col)?;
        match raw.parse::<Money>() {
            Ok(m) => Some(m),
            Err(e) => {
                if !raw.eq_ignore_ascii_case("nan") {
                    warn!(product_id = %id, column = col, error = %e, "Unreadable price cell");
                }
                None
            }
        }
    };

    let stock_qty = match text(COL_QUANTITY) {
        None => 0,
        Some(raw) => match parse_count(raw) {
            Some(n) if (-MAX_STOCK_QTY..=MAX_STOCK_QTY).contains(&n) => n,
            Some(_) => {
                warn!(product_id = %id, value = raw, max = MAX_STOCK_QTY, "Quantity out of range, using 0");
                0
            }
            None => {
                warn!(product_id = %id, value = raw, "Unreadable quantity, using 0");
                0
            }
        },
    };

    Product {
        name,
        barcode: text(COL_BARCODE).and_then(normalize_barcode),
        cost_price: money(COL_COST),
        mrp: money(COL_MRP),
        sell_price: money(COL_SELL_PRICE),
        stock_qty,
        category: text(COL_CATEGORY)
            .filter(|c| !c.eq_ignore_ascii_case("nan"))
            .map(str::to_string),
        id,
    }
}

/// Integer cell that a spreadsheet may have written as "12.0".
pub(crate) fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let f: f64 = raw.parse().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
}

fn known_cells(product: &Product) -> Vec<(&'static str, String)> {
    let money = |m: Option<Money>| m.map(|m| m.to_decimal_string()).unwrap_or_default();
    vec![
        (COL_ID, product.id.clone()),
        (COL_NAME, product.name.clone()),
        (COL_COST, money(product.cost_price)),
        (COL_MRP, money(product.mrp)),
        (COL_QUANTITY, product.stock_qty.to_string()),
        (COL_CATEGORY, product.category.clone().unwrap_or_default()),
        (COL_BARCODE, product.barcode.clone().unwrap_or_default()),
        (COL_SELL_PRICE, money(product.sell_price)),
    ]
}

// =============================================================================
// Catalog File
// =============================================================================

/// A loaded sheet.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub layout: CatalogLayout,
}

/// Repository for the inventory sheet.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    path: PathBuf,
    backup: bool,
}

impl CatalogFile {
    pub fn new(path: impl Into<PathBuf>, backup: bool) -> Self {
        CatalogFile {
            path: path.into(),
            backup,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the sheet. A missing file is an empty catalog.
    pub fn load(&self) -> StoreResult<LoadedCatalog> {
        let Some(bytes) = fsio::read_optional(&self.path)? else {
            info!(path = %self.path.display(), "No inventory sheet yet, starting empty");
            return Ok(LoadedCatalog::default());
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(bytes.as_slice());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| StoreError::csv(&self.path, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        if !headers.iter().any(|h| h == COL_NAME) {
            return Err(StoreError::MissingColumn {
                path: self.path.clone(),
                column: COL_NAME.to_string(),
            });
        }
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();

        let mut read = Vec::new();
        for (n, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&self.path, e))?;
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let cell = |col: &str| index.get(col).and_then(|&i| record.get(i));
            let product = product_from_cells(cell, &(n + 1).to_string());

            if product.name.is_empty() {
                warn!(row = n + 2, "Skipping row without a product name");
                continue;
            }
            let mut raw: Vec<String> = record.iter().map(str::to_string).collect();
            raw.resize(headers.len(), String::new());
            read.push((n + 2, product, raw));
        }

        // Repeated ids get fresh numbers above every id in the sheet, so no
        // id that was unique on disk changes.
        let mut next_id = read
            .iter()
            .filter_map(|(_, p, _)| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let mut products = Vec::with_capacity(read.len());
        let mut rows = HashMap::new();
        let mut seen = HashSet::new();
        for (row, mut product, raw) in read {
            if !seen.insert(product.id.clone()) {
                next_id = next_id.saturating_add(1);
                let fresh = next_id.to_string();
                warn!(row, duplicate = %product.id, new_id = %fresh, "Duplicate Sr_No, renumbering");
                product.id = fresh;
                seen.insert(product.id.clone());
            }
            rows.insert(product.id.clone(), raw);
            products.push(product);
        }

        info!(path = %self.path.display(), products = products.len(), "Loaded inventory");
        Ok(LoadedCatalog {
            catalog: Catalog::new(products),
            layout: CatalogLayout { headers, rows },
        })
    }

    /// Writes the whole catalog back.
    pub fn save(&self, catalog: &Catalog, layout: &CatalogLayout) -> StoreResult<()> {
        let headers = output_headers(catalog, layout);

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&headers)
            .map_err(|e| StoreError::csv(&self.path, e))?;

        for product in catalog.iter() {
            let original = layout.rows.get(&product.id);
            let known: HashMap<&str, String> = known_cells(product).into_iter().collect();
            let row: Vec<String> = headers
                .iter()
                .enumerate()
                .map(|(i, h)| match known.get(h.as_str()) {
                    Some(v) => v.clone(),
                    None => original
                        .and_then(|r| r.get(i))
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::io(&self.path, e.into_error()))?;
        fsio::write_replacing(&self.path, &bytes, self.backup)?;
        debug!(path = %self.path.display(), products = catalog.len(), "Saved inventory");
        Ok(())
    }
}

/// Original headers, plus any known column the sheet lacks but the data needs.
///
/// Appending keeps positions of existing columns stable, so `layout.rows`
/// indices stay valid for the original part of every row.
fn output_headers(catalog: &Catalog, layout: &CatalogLayout) -> Vec<String> {
    let mut headers = layout.headers.clone();
    let mut need = |col: &str, needed: bool| {
        if needed && !headers.iter().any(|h| h == col) {
            headers.push(col.to_string());
        }
    };

    need(COL_ID, true);
    need(COL_NAME, true);
    need(COL_COST, catalog.iter().any(|p| p.cost_price.is_some()));
    need(COL_MRP, catalog.iter().any(|p| p.mrp.is_some()));
    need(COL_QUANTITY, true);
    need(COL_CATEGORY, catalog.iter().any(|p| p.category.is_some()));
    need(COL_BARCODE, catalog.iter().any(|p| p.barcode.is_some()));
    need(COL_SELL_PRICE, catalog.iter().any(|p| p.sell_price.is_some()));
    headers
}

// =============================================================================
// Unit Tests
// =============================================================================
