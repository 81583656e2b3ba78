//! # Stock Movements
//!
//! Every change to stock on hand, as an audit trail next to the sales ledger.
//!
//! ```text
//! sell 1:2        ──► SALE            2  TXN20250814123456
//! stock adjust 3  ──► ADJUSTMENT_IN   3  ADJ20250814130000
//! return TXN.. 1  ──► RETURN          1  TXN20250814123456
//! ```
//!
//! Quantities are stored unsigned; the kind says which way stock moved.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::report::HistoryPeriod;
use crate::types::{Product, Sale};

/// Who made the change, as written in the log.
pub const DEFAULT_USER: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    Sale,
    Return,
    /// Stock received from a supplier.
    Purchase,
    AdjustmentIn,
    AdjustmentOut,
    /// Anything else found in an older log.
    Other(String),
}

impl MovementKind {
    pub fn for_adjustment(delta: i64) -> Self {
        if delta >= 0 {
            MovementKind::AdjustmentIn
        } else {
            MovementKind::AdjustmentOut
        }
    }

    /// +1 when stock went up, -1 when it went down.
    pub fn direction(&self) -> i64 {
        match self {
            MovementKind::Sale | MovementKind::AdjustmentOut => -1,
            _ => 1,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementKind::Sale => write!(f, "SALE"),
            MovementKind::Return => write!(f, "RETURN"),
            MovementKind::Purchase => write!(f, "PURCHASE"),
            MovementKind::AdjustmentIn => write!(f, "ADJUSTMENT_IN"),
            MovementKind::AdjustmentOut => write!(f, "ADJUSTMENT_OUT"),
            MovementKind::Other(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for MovementKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "SALE" | "QUICK_SALE" => MovementKind::Sale,
            "RETURN" => MovementKind::Return,
            "PURCHASE" => MovementKind::Purchase,
            "ADJUSTMENT_IN" => MovementKind::AdjustmentIn,
            "ADJUSTMENT_OUT" => MovementKind::AdjustmentOut,
            _ => MovementKind::Other(s.trim().to_string()),
        })
    }
}

/// One line of the movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub timestamp: NaiveDateTime,
    /// `None` in logs written before ids were recorded.
    pub product_id: Option<String>,
    pub product_name: String,
    pub kind: MovementKind,
    /// Units moved, never negative.
    pub quantity: i64,
    /// Transaction id or adjustment number.
    pub reference: String,
    pub notes: String,
    pub user: String,
}

impl StockMovement {
    /// One `SALE` movement per line of the sale.
    pub fn for_sale(sale: &Sale) -> Vec<StockMovement> {
        sale.lines
            .iter()
            .map(|line| StockMovement {
                timestamp: sale.timestamp,
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                kind: MovementKind::Sale,
                quantity: line.quantity,
                reference: sale.transaction_id.clone(),
                notes: format!("Sale {}", sale.transaction_id),
                user: DEFAULT_USER.to_string(),
            })
            .collect()
    }

    /// A manual correction of `delta` units.
    pub fn adjustment(
        product: &Product,
        delta: i64,
        timestamp: NaiveDateTime,
        reason: &str,
    ) -> StockMovement {
        let reason = reason.trim();
        StockMovement {
            timestamp,
            product_id: Some(product.id.clone()),
            product_name: product.name.clone(),
            kind: MovementKind::for_adjustment(delta),
            quantity: delta.saturating_abs(),
            reference: format!("ADJ{}", timestamp.format("%Y%m%d%H%M%S")),
            notes: if reason.is_empty() {
                "Manual adjustment".to_string()
            } else {
                reason.to_string()
            },
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Signed change to stock.
    pub fn change(&self) -> i64 {
        self.quantity.saturating_mul(self.kind.direction())
    }
}

// =============================================================================
// Filter
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub period: HistoryPeriod,
    /// Case-insensitive part of the product name.
    pub product: String,
    /// Keep only the most recent N matches.
    pub limit: Option<usize>,
}

impl MovementFilter {
    /// Matching movements in log order (oldest first).
    pub fn apply<'a>(
        &self,
        movements: &'a [StockMovement],
        today: NaiveDate,
    ) -> Vec<&'a StockMovement> {
        let needle = self.product.trim().to_lowercase();
        let found: Vec<&StockMovement> = movements
            .iter()
            .filter(|m| self.period.covers(m.timestamp.date(), today))
            .filter(|m| needle.is_empty() || m.product_name.to_lowercase().contains(&needle))
            .collect();
        match self.limit {
            Some(n) if found.len() > n => found[found.len() - n..].to_vec(),
            _ => found,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{PaymentMethod, SaleLine};
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MovementKind::AdjustmentOut.to_string(), "ADJUSTMENT_OUT");
        assert_eq!("quick_sale".parse::<MovementKind>().unwrap(), MovementKind::Sale);
        assert_eq!(
            "TRANSFER".parse::<MovementKind>().unwrap(),
            MovementKind::Other("TRANSFER".to_string())
        );
    }

    #[test]
    fn test_sale_movements() {
        let sale = Sale {
            id: Uuid::nil(),
            transaction_id: "TXN20250814120000".to_string(),
            timestamp: at(14, 12),
            customer: None,
            payment_method: PaymentMethod::Cash,
            lines: vec![SaleLine {
                product_id: Some("1".to_string()),
                product_name: "Tea".to_string(),
                quantity: 3,
                unit_price: Money::from_rupees(40),
                mrp: None,
            }],
            discount_bps: 0,
        };
        let moves = StockMovement::for_sale(&sale);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].change(), -3);
        assert_eq!(moves[0].reference, "TXN20250814120000");
        assert_eq!(moves[0].user, "Admin");
    }

    #[test]
    fn test_adjustment_movement() {
        let tea = Product::new("1", "Tea");
        let m = StockMovement::adjustment(&tea, -4, at(14, 13), " ");
        assert_eq!(m.kind, MovementKind::AdjustmentOut);
        assert_eq!(m.quantity, 4);
        assert_eq!(m.change(), -4);
        assert_eq!(m.reference, "ADJ20250814130000");
        assert_eq!(m.notes, "Manual adjustment");

        let m = StockMovement::adjustment(&tea, i64::MIN, at(14, 13), "damaged");
        assert_eq!(m.quantity, i64::MAX);
    }

    #[test]
    fn test_filter() {
        let tea = Product::new("1", "Tea");
        let sugar = Product::new("2", "Sugar");
        let log = vec![
            StockMovement::adjustment(&tea, 5, at(1, 9), ""),
            StockMovement::adjustment(&sugar, 2, at(12, 9), ""),
            StockMovement::adjustment(&tea, -1, at(14, 9), ""),
            StockMovement::adjustment(&tea, 3, at(14, 10), ""),
        ];
        let today = at(14, 0).date();

        let f = MovementFilter {
            period: HistoryPeriod::Today,
            ..MovementFilter::default()
        };
        assert_eq!(f.apply(&log, today).len(), 2);

        let f = MovementFilter {
            product: "TEA".to_string(),
            limit: Some(2),
            ..MovementFilter::default()
        };
        let found = f.apply(&log, today);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].quantity, 3);
    }
}
