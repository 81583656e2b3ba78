//! # Returns
//!
//! Taking goods back against a past sale.
//!
//! ```text
//! return TXN20250814123456 1 2
//!   pick line 1 of the sale ──► cap at units sold minus units already
//!   returned (RETURN movements) ──► refund = line final amount / qty × 2
//! ```
//!
//! The refund uses the line's share of the amount actually paid, so a bill
//! discount is taken back in proportion.

use chrono::NaiveDateTime;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::movement::{MovementKind, StockMovement, DEFAULT_USER};
use crate::types::Sale;

/// What a return pays out and puts back on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    pub transaction_id: String,
    /// Zero-based index into the sale's lines.
    pub line: usize,
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub amount: Money,
}

impl Refund {
    /// The `RETURN` entry for the movement log.
    pub fn movement(&self, timestamp: NaiveDateTime) -> StockMovement {
        StockMovement {
            timestamp,
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            kind: MovementKind::Return,
            quantity: self.quantity,
            reference: self.transaction_id.clone(),
            notes: format!("Return from transaction {}", self.transaction_id),
            user: DEFAULT_USER.to_string(),
        }
    }
}

/// Finds a sale line by 1-based number or by part of the product name.
pub fn select_line(sale: &Sale, item: &str) -> CoreResult<usize> {
    let item = item.trim();
    if let Ok(n) = item.parse::<usize>() {
        if n == 0 || n > sale.lines.len() {
            return Err(line_range(sale).into());
        }
        return Ok(n - 1);
    }
    let needle = item.to_lowercase();
    sale.lines
        .iter()
        .position(|l| !needle.is_empty() && l.product_name.to_lowercase().contains(&needle))
        .ok_or_else(|| CoreError::ProductNotFound(item.to_string()))
}

/// Units of a line already taken back, from the movement log.
pub fn already_returned(sale: &Sale, line: usize, movements: &[StockMovement]) -> i64 {
    let Some(sold) = sale.lines.get(line) else {
        return 0;
    };
    movements
        .iter()
        .filter(|m| m.kind == MovementKind::Return && m.reference == sale.transaction_id)
        .filter(|m| match (&m.product_id, &sold.product_id) {
            (Some(a), Some(b)) => a == b,
            _ => m.product_name == sold.product_name,
        })
        .fold(0i64, |total, m| total.saturating_add(m.quantity))
}

/// Works out the refund for `quantity` units of one line.
///
/// `returned` is what has already come back from that line; the request is
/// capped at the remainder.
pub fn quote_refund(sale: &Sale, line: usize, quantity: i64, returned: i64) -> CoreResult<Refund> {
    let sold = sale.lines.get(line).ok_or_else(|| line_range(sale))?;
    let remaining = sold.quantity.saturating_sub(returned).max(0);
    if quantity < 1 || quantity > remaining {
        return Err(ValidationError::OutOfRange {
            field: "return quantity".to_string(),
            min: 1,
            max: remaining,
        }
        .into());
    }

    let paid = sale
        .line_final_amounts()
        .get(line)
        .copied()
        .unwrap_or_default();
    let amount = if quantity == sold.quantity {
        paid
    } else {
        let share = paid.paise() as i128 * quantity as i128;
        let q = sold.quantity as i128;
        Money::from_paise(((share * 2 + q) / (q * 2)) as i64)
    };

    Ok(Refund {
        transaction_id: sale.transaction_id.clone(),
        line,
        product_id: sold.product_id.clone(),
        product_name: sold.product_name.clone(),
        quantity,
        amount,
    })
}

fn line_range(sale: &Sale) -> ValidationError {
    ValidationError::OutOfRange {
        field: "line".to_string(),
        min: 1,
        max: sale.lines.len() as i64,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
