//! # Return Command
//!
//! ```text
//! return TXN20250814123456 1 2
//!
//!   ledger.find(txn) ──► pick the line ──► units already returned (movement log)
//!                    ──► refund quote  ──► restock, save sheet
//!                    ──► movements.append(RETURN)
//! ```
//!
//! The restocked product is found by the id on the sale line, or by exact
//! name when that id is gone. Customer totals are left as they were.

use std::io::Write;

use kirana_core::returns::{already_returned, quote_refund, select_line};
use kirana_core::CoreError;
use tracing::info;

use crate::error::AppResult;
use crate::state::Shop;

pub fn take_back(
    shop: &Shop,
    transaction_id: &str,
    item: &str,
    quantity: i64,
    out: &mut dyn Write,
) -> AppResult<()> {
    let sale = shop.store().ledger().find(transaction_id)?;
    let line = select_line(&sale, item)?;

    let movements = shop.store().movements();
    let returned = already_returned(&sale, line, &movements.load_all()?);
    let refund = quote_refund(&sale, line, quantity, returned)?;

    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = refund
        .product_id
        .as_deref()
        .and_then(|id| loaded.catalog.get(id).ok())
        .or_else(|| loaded.catalog.find_by_name(&refund.product_name))
        .map(|p| p.id.clone())
        .ok_or_else(|| CoreError::ProductNotFound(refund.product_name.clone()))?;

    let stock = loaded.catalog.adjust_stock(&id, refund.quantity)?;
    file.save(&loaded.catalog, &loaded.layout)?;
    movements.append(&[refund.movement(shop.now())])?;
    info!(
        transaction = %refund.transaction_id,
        product = %id,
        quantity = refund.quantity,
        amount = %refund.amount,
        "Return recorded"
    );

    writeln!(
        out,
        "Returned {} x {} from {}: refund {}",
        refund.quantity, refund.product_name, refund.transaction_id, refund.amount
    )?;
    writeln!(out, "{}: stock now {}", refund.product_name, stock)?;
    Ok(())
}
