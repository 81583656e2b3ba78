//! # Supplier Price Lists
//!
//! Reads a price list CSV for `price import`. `Product_Name` and `MRP` are
//! required; `Cost_Price` is optional. Rows whose MRP cannot be read are
//! skipped with a warning.

use std::collections::HashMap;
use std::path::Path;

use kirana_core::money::Money;
use tracing::{debug, warn};

use crate::catalog::{COL_COST, COL_MRP, COL_NAME};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceListEntry {
    pub name: String,
    pub mrp: Money,
    pub cost: Option<Money>,
}

pub fn read_price_list(path: &Path) -> StoreResult<Vec<PriceListEntry>> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StoreError::csv(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    for required in [COL_NAME, COL_MRP] {
        if !headers.iter().any(|h| h == required) {
            return Err(StoreError::MissingColumn {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut entries = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| StoreError::csv(path, e))?;
        let cell = |col: &str| {
            index
                .get(col)
                .and_then(|&i| record.get(i))
                .filter(|s| !s.is_empty())
        };

        let name = cell(COL_NAME);
        let mrp = cell(COL_MRP).and_then(|m| m.parse::<Money>().ok());
        let (Some(name), Some(mrp)) = (name, mrp) else {
            warn!(row = n + 2, path = %path.display(), "Skipping price list row without name or MRP");
            continue;
        };
        entries.push(PriceListEntry {
            name: name.to_string(),
            mrp,
            cost: cell(COL_COST).and_then(|c| c.parse::<Money>().ok()),
        });
    }

    debug!(path = %path.display(), entries = entries.len(), "Read price list");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_price_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(
            &path,
            "Product_Name,MRP,Cost_Price\n\
             Savour Mix 200g,110,85\n\
             Loose Rice,,\n\
             Cherry Liquid 135ml,105.50,\n",
        )
        .unwrap();

        let list = read_price_list(&path).unwrap();
        assert_eq!(
            list,
            vec![
                PriceListEntry {
                    name: "Savour Mix 200g".to_string(),
                    mrp: Money::from_rupees(110),
                    cost: Some(Money::from_rupees(85)),
                },
                PriceListEntry {
                    name: "Cherry Liquid 135ml".to_string(),
                    mrp: Money::from_paise(10550),
                    cost: None,
                },
            ]
        );
    }

    #[test]
    fn test_price_list_needs_mrp_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, "Product_Name,Cost_Price\nTea,40\n").unwrap();

        let err = read_price_list(&path).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn { ref column, .. } if column == "MRP"));
    }
}
