//! # Sales Ledger
//!
//! `sales_transactions.csv`: one row per sold line, grouped back into sales
//! by `Transaction_ID` when read.
//!
//! ```text
//! Transaction_ID,Date,Time,Customer_Name,...,Final_Amount,MRP,Sale_Id,Product_Id
//! TXN20250814123456,2025-08-14,12:34:56,Ramesh,...,167.20,100.00,6f1c...,1
//! ```
//!
//! Older ledgers stop at `Final_Amount`. They load fine (no MRP snapshot,
//! nil sale id) and new rows are appended in whatever columns the file has.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use kirana_core::money::Money;
use kirana_core::search::normalize_barcode;
use kirana_core::{CustomerRef, PaymentMethod, Sale, SaleLine};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::parse_count;
use crate::error::{StoreError, StoreResult};
use crate::fsio;

pub const LEDGER_COLUMNS: [&str; 15] = [
    "Transaction_ID",
    "Date",
    "Time",
    "Customer_Name",
    "Customer_Phone",
    "Product_Name",
    "Quantity_Sold",
    "Unit_Price",
    "Total_Amount",
    "Payment_Method",
    "Discount",
    "Final_Amount",
    "MRP",
    "Sale_Id",
    "Product_Id",
];

/// Repository for the sales ledger.
#[derive(Debug, Clone)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LedgerFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends every line of a sale.
    pub fn append(&self, sale: &Sale) -> StoreResult<()> {
        fsio::append_csv_rows(&self.path, &LEDGER_COLUMNS, &sale_rows(sale))?;
        debug!(transaction_id = %sale.transaction_id, lines = sale.lines.len(), "Appended sale to ledger");
        Ok(())
    }

    /// Every sale in ledger order. A missing ledger is empty.
    pub fn load_all(&self) -> StoreResult<Vec<Sale>> {
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
        if !headers.iter().any(|h| h == "Transaction_ID") {
            return Err(StoreError::MissingColumn {
                path: self.path.clone(),
                column: "Transaction_ID".to_string(),
            });
        }
        let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let mut sales: Vec<Sale> = Vec::new();
        let mut by_txn: HashMap<String, usize> = HashMap::new();

        for (n, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::csv(&self.path, e))?;
            let cell = |col: &str| {
                index
                    .get(col)
                    .and_then(|&i| record.get(i))
                    .filter(|s| !s.is_empty())
            };

            let Some(txn) = cell("Transaction_ID") else {
                continue;
            };
            let line = SaleLine {
                product_id: cell("Product_Id").map(str::to_string),
                product_name: cell("Product_Name").unwrap_or_default().to_string(),
                quantity: cell("Quantity_Sold").and_then(parse_count).unwrap_or(0),
                unit_price: cell("Unit_Price")
                    .and_then(|s| s.parse::<Money>().ok())
                    .unwrap_or_default(),
                mrp: cell("MRP").and_then(|s| s.parse::<Money>().ok()),
            };

            if let Some(&i) = by_txn.get(txn) {
                sales[i].lines.push(line);
                continue;
            }

            let Some(timestamp) = row_timestamp(cell("Date"), cell("Time"), txn) else {
                warn!(row = n + 2, transaction_id = txn, "Skipping ledger row without a date");
                continue;
            };
            let customer = CustomerRef {
                name: blank_if_placeholder(cell("Customer_Name")),
                phone: cell("Customer_Phone")
                    .and_then(normalize_barcode)
                    .unwrap_or_default(),
            };
            let customer = (!customer.name.is_empty() || !customer.phone.is_empty()).then_some(customer);

            by_txn.insert(txn.to_string(), sales.len());
            sales.push(Sale {
                id: cell("Sale_Id")
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .unwrap_or_else(Uuid::nil),
                transaction_id: txn.to_string(),
                timestamp,
                customer,
                payment_method: cell("Payment_Method")
                    .map(|s| s.parse::<PaymentMethod>().unwrap_or_default())
                    .unwrap_or_default(),
                lines: vec![line],
                discount_bps: cell("Discount").map(parse_percent_bps).unwrap_or(0),
            });
        }

        debug!(path = %self.path.display(), sales = sales.len(), "Loaded ledger");
        Ok(sales)
    }

    /// One sale by transaction id.
    pub fn find(&self, transaction_id: &str) -> StoreResult<Sale> {
        let wanted = transaction_id.trim();
        self.load_all()?
            .into_iter()
            .find(|s| s.transaction_id == wanted)
            .ok_or_else(|| StoreError::not_found("Sale", wanted))
    }
}

fn sale_rows(sale: &Sale) -> Vec<HashMap<&'static str, String>> {
    let date = sale.timestamp.format("%Y-%m-%d").to_string();
    let time = sale.timestamp.format("%H:%M:%S").to_string();
    let (name, phone) = sale
        .customer
        .as_ref()
        .map(|c| (c.name.clone(), c.phone.clone()))
        .unwrap_or_default();
    let finals = sale.line_final_amounts();

    sale.lines
        .iter()
        .zip(finals)
        .map(|(line, final_amount)| {
            HashMap::from([
                ("Transaction_ID", sale.transaction_id.clone()),
                ("Date", date.clone()),
                ("Time", time.clone()),
                ("Customer_Name", name.clone()),
                ("Customer_Phone", phone.clone()),
                ("Product_Name", line.product_name.clone()),
                ("Quantity_Sold", line.quantity.to_string()),
                ("Unit_Price", line.unit_price.to_decimal_string()),
                ("Total_Amount", line.line_total().to_decimal_string()),
                ("Payment_Method", sale.payment_method.to_string()),
                ("Discount", format_percent_bps(sale.discount_bps)),
                ("Final_Amount", final_amount.to_decimal_string()),
                (
                    "MRP",
                    line.mrp.map(|m| m.to_decimal_string()).unwrap_or_default(),
                ),
                ("Sale_Id", sale.id.to_string()),
                ("Product_Id", line.product_id.clone().unwrap_or_default()),
            ])
        })
        .collect()
}

fn row_timestamp(date: Option<&str>, time: Option<&str>, txn: &str) -> Option<NaiveDateTime> {
    let from_cells = date
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| match time.and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok()) {
            Some(t) => Some(d.and_time(t)),
            None => d.and_hms_opt(0, 0, 0),
        });
    from_cells.or_else(|| {
        txn.strip_prefix("TXN")
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S").ok())
    })
}

fn blank_if_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !matches!(v.to_ascii_lowercase().as_str(), "none" | "nan" | "null") => {
            v.to_string()
        }
        _ => String::new(),
    }
}

/// "5" / "5.0" / "2.5" percent → basis points.
fn parse_percent_bps(raw: &str) -> u32 {
    raw.parse::<Money>()
        .ok()
        .filter(|m| !m.is_negative())
        .map_or(0, |m| m.paise().min(10_000) as u32)
}

fn format_percent_bps(bps: u32) -> String {
    if bps % 100 == 0 {
        (bps / 100).to_string()
    } else {
        format!("{}.{:02}", bps / 100, bps % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
