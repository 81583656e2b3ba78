//! # Stock Movement Log
//!
//! `stock_movements.csv`: append-only, one row per stock change.
//!
//! ```text
//! Date,Time,Product_Name,Movement_Type,Quantity,Reference,Notes,User,Product_Id
//! 2025-08-14,12:34:56,Savour Mix 200g,SALE,2,TXN20250814123456,Sale TXN...,Admin,1
//! ```
//!
//! Logs written without `Product_Id` load fine; rows without a readable
//! date or quantity are skipped with a warning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use kirana_core::movement::{StockMovement, DEFAULT_USER};
use tracing::{debug, warn};

use crate::catalog::parse_count;
use crate::error::{StoreError, StoreResult};
use crate::fsio;

pub const MOVEMENT_COLUMNS: [&str; 9] = [
    "Date",
    "Time",
    "Product_Name",
    "Movement_Type",
    "Quantity",
    "Reference",
    "Notes",
    "User",
    "Product_Id",
];

/// Repository for the stock movement log.
#[derive(Debug, Clone)]
pub struct MovementFile {
    path: PathBuf,
}

impl MovementFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MovementFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, movements: &[StockMovement]) -> StoreResult<()> {
        if movements.is_empty() {
            return Ok(());
        }
        let rows: Vec<HashMap<&'static str, String>> = movements.iter().map(movement_row).collect();
        fsio::append_csv_rows(&self.path, &MOVEMENT_COLUMNS, &rows)?;
        debug!(path = %self.path.display(), rows = rows.len(), "Appended stock movements");
        Ok(())
    }

    /// Every movement in log order. A missing log is empty.
    pub fn load_all(&self) -> StoreResult<Vec<StockMovement>> {
        let Some(bytes) = fsio::read_optional(&self.path)? else {
            return Ok(Vec::new());
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes.as_slice());
        let headers = reader
            .headers()
            .map_err(|e| StoreError::csv(&self.path, e))?
            .clone();
        let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let mut movements = Vec::new();
        for (n, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&self.path, e))?;
            let cell = |col: &str| {
                index
                    .get(col)
                    .and_then(|&i| record.get(i))
                    .filter(|s| !s.is_empty())
            };

            let date = cell("Date").and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
            let quantity = cell("Quantity").and_then(parse_count);
            let (Some(date), Some(quantity)) = (date, quantity) else {
                warn!(row = n + 2, path = %self.path.display(), "Skipping unreadable movement row");
                continue;
            };
            let time = cell("Time")
                .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok())
                .unwrap_or_default();

            movements.push(StockMovement {
                timestamp: date.and_time(time),
                product_id: cell("Product_Id").map(str::to_string),
                product_name: cell("Product_Name").unwrap_or_default().to_string(),
                kind: cell("Movement_Type")
                    .unwrap_or_default()
                    .parse()
                    .unwrap_or_else(|e: std::convert::Infallible| match e {}),
                quantity: quantity.saturating_abs(),
                reference: cell("Reference").unwrap_or_default().to_string(),
                notes: cell("Notes").unwrap_or_default().to_string(),
                user: cell("User").unwrap_or(DEFAULT_USER).to_string(),
            });
        }

        debug!(path = %self.path.display(), movements = movements.len(), "Loaded stock movements");
        Ok(movements)
    }
}

fn movement_row(m: &StockMovement) -> HashMap<&'static str, String> {
    HashMap::from([
        ("Date", m.timestamp.format("%Y-%m-%d").to_string()),
        ("Time", m.timestamp.format("%H:%M:%S").to_string()),
        ("Product_Name", m.product_name.clone()),
        ("Movement_Type", m.kind.to_string()),
        ("Quantity", m.quantity.to_string()),
        ("Reference", m.reference.clone()),
        ("Notes", m.notes.clone()),
        ("User", m.user.clone()),
        ("Product_Id", m.product_id.clone().unwrap_or_default()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::movement::MovementKind;
    use kirana_core::Product;

    #[test]
    fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = MovementFile::new(dir.path().join("stock_movements.csv"));
        assert!(file.load_all().unwrap().is_empty());

        let when = NaiveDate::from_ymd_opt(2025, 8, 14)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let tea = Product::new("4", "Tea, loose");
        let written = vec![
            StockMovement::adjustment(&tea, -3, when, "spilt"),
            StockMovement::adjustment(&tea, 10, when, ""),
        ];
        file.append(&written).unwrap();
        file.append(&[]).unwrap();

        assert_eq!(file.load_all().unwrap(), written);
    }

    #[test]
    fn test_loads_older_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock_movements.csv");
        std::fs::write(
            &path,
            "Date,Time,Product_Name,Movement_Type,Quantity,Reference,Notes,User\n\
             2025-08-01,09:15:00,Tea,QUICK_SALE,2,TXN20250801091500,,Admin\n\
             junk,,Tea,SALE,1,,,\n\
             2025-08-02,,Sugar,PURCHASE,12.0,PUR1,Invoice 7,\n",
        )
        .unwrap();

        let loaded = MovementFile::new(&path).load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].kind, MovementKind::Sale);
        assert_eq!(loaded[0].product_id, None);
        assert_eq!(loaded[1].kind, MovementKind::Purchase);
        assert_eq!(loaded[1].quantity, 12);
        assert_eq!(loaded[1].user, "Admin");
        assert_eq!(loaded[1].timestamp.to_string(), "2025-08-02 00:00:00");
    }
}
