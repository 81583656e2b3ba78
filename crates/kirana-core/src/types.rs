//! # Domain Types
//!
//! Core domain types for Kirana POS.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Entity Relationship Diagram                          │
//! │                                                                         │
//! │  ┌──────────────┐         ┌──────────────┐         ┌──────────────┐   │
//! │  │   Product    │         │     Sale     │         │   Customer   │   │
//! │  │──────────────│         │──────────────│         │──────────────│   │
//! │  │ id (Sr_No)   │◄────┐   │ id (uuid)    │    ┌───►│ phone (key)  │   │
//! │  │ name         │     │   │ transaction  │    │    │ name         │   │
//! │  │ barcode?     │     │   │ customer? ───┼────┘    │ points       │   │
//! │  │ cost / mrp?  │     │   │ discount_bps │         └──────────────┘   │
//! │  │ sell_price?  │     │   └──────┬───────┘                            │
//! │  │ stock_qty    │     │          │ 1:N                                │
//! │  └──────────────┘     │   ┌──────▼───────┐                            │
//! │                       │   │   SaleLine   │                            │
//! │                       └───┤ product_id?  │  (snapshot at sale time)   │
//! │                           │ qty / price  │                            │
//! │                           └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product row from the inventory sheet.
///
/// Prices are optional at the type level: a sheet may omit or mangle them, and
/// the pricing engine is the component that reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable identifier (`Sr_No`).
    pub id: String,
    pub name: String,
    /// Unique when present. Never an empty string or "nan".
    pub barcode: Option<String>,
    pub cost_price: Option<Money>,
    pub mrp: Option<Money>,
    /// Stored override. Authoritative when positive.
    pub sell_price: Option<Money>,
    pub stock_qty: i64,
    pub category: Option<String>,
}

impl Product {
    /// Creates a product with no prices, barcode or stock.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            barcode: None,
            cost_price: None,
            mrp: None,
            sell_price: None,
            stock_qty: 0,
            category: None,
        }
    }

    /// Checks if enough stock exists for the requested quantity.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock_qty >= quantity
    }

    pub fn has_barcode(&self) -> bool {
        self.barcode.is_some()
    }
}

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub cost_price: Money,
    pub mrp: Money,
    pub stock_qty: i64,
    pub category: Option<String>,
    pub barcode: Option<String>,
    /// Leave `None` to let the pricing engine derive it.
    pub sell_price: Option<Money>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
    /// Shop credit ("khata").
    Credit,
    /// Anything else found in an older ledger.
    Other(String),
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
            PaymentMethod::Upi => write!(f, "UPI"),
            PaymentMethod::Credit => write!(f, "Credit"),
            PaymentMethod::Other(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "upi" => PaymentMethod::Upi,
            "credit" => PaymentMethod::Credit,
            _ => PaymentMethod::Other(s.trim().to_string()),
        })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Who bought, as printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub name: String,
    pub phone: String,
}

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Internal id.
    pub id: Uuid,
    /// Human-facing number, `TXN%Y%m%d%H%M%S`.
    pub transaction_id: String,
    pub timestamp: NaiveDateTime,
    pub customer: Option<CustomerRef>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<SaleLine>,
    /// Bill-level discount in basis points (500 = 5%).
    pub discount_bps: u32,
}

impl Sale {
    /// Builds the transaction id for a moment in time.
    pub fn transaction_id_for(timestamp: NaiveDateTime) -> String {
        format!("TXN{}", timestamp.format("%Y%m%d%H%M%S"))
    }

    /// Sum of line totals before the bill discount.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_total()).sum()
    }

    pub fn discount_amount(&self) -> Money {
        self.subtotal().percentage(self.discount_bps)
    }

    /// Amount paid.
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// What the customer saved against MRP, bill discount included.
    pub fn savings(&self) -> Money {
        let mrp_total: Money = self.lines.iter().map(|l| l.mrp_total()).sum();
        (mrp_total - self.subtotal()).max(Money::zero()) + self.discount_amount()
    }

    /// Splits the bill total across lines in proportion to line totals.
    ///
    /// The last line absorbs the rounding remainder, so the parts always sum
    /// to [`Sale::total`].
    pub fn line_final_amounts(&self) -> Vec<Money> {
        let subtotal = self.subtotal();
        let total = self.total();
        if self.lines.is_empty() {
            return Vec::new();
        }
        if subtotal.is_zero() {
            let mut parts = vec![Money::zero(); self.lines.len()];
            if let Some(last) = parts.last_mut() {
                *last = total;
            }
            return parts;
        }

        let mut parts: Vec<Money> = self
            .lines
            .iter()
            .map(|l| {
                let share = l.line_total().paise() as i128 * total.paise() as i128
                    / subtotal.paise() as i128;
                Money::from_paise(share as i64)
            })
            .collect();
        let allocated: Money = parts.iter().sum();
        if let Some(last) = parts.last_mut() {
            *last += total - allocated;
        }
        parts
    }
}

/// A line of a sale, frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// `None` for lines read from a ledger that predates the column.
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// MRP snapshot for the receipt's savings line.
    pub mrp: Option<Money>,
}

impl SaleLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// MRP × qty, falling back to the selling price when MRP is unknown.
    pub fn mrp_total(&self) -> Money {
        self.mrp
            .unwrap_or(self.unit_price)
            .multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
