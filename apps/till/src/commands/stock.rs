//! # Stock Commands
//!
//! Adjustments are written to the movement log after the sheet is saved.

use std::io::Write;

use kirana_core::movement::{MovementFilter, StockMovement};
use kirana_core::report::{low_stock, stock_valuation};
use tracing::info;

use super::{product_header, product_row, truncate};
use crate::error::AppResult;
use crate::state::Shop;

/// Receiving stock or writing off damage. Stock never goes below zero.
pub fn adjust(
    shop: &Shop,
    code: &str,
    delta: i64,
    reason: &str,
    out: &mut dyn Write,
) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    let stock = loaded.catalog.adjust_stock(&id, delta)?;
    file.save(&loaded.catalog, &loaded.layout)?;

    let product = loaded.catalog.get(&id)?;
    if delta != 0 {
        let movement = StockMovement::adjustment(product, delta, shop.now(), reason);
        shop.store().movements().append(&[movement])?;
    }
    info!(product = %id, delta, stock, "Adjusted stock");

    writeln!(out, "{}: stock now {}", product.name, stock)?;
    Ok(())
}

pub fn movements(shop: &Shop, filter: MovementFilter, out: &mut dyn Write) -> AppResult<()> {
    let log = shop.store().movements().load_all()?;
    let found = filter.apply(&log, shop.today());

    for m in &found {
        writeln!(
            out,
            "{}  {:<14} {:>+6}  {:<32} {}  {}",
            m.timestamp.format("%Y-%m-%d %H:%M"),
            m.kind.to_string(),
            m.change(),
            truncate(&m.product_name, 32),
            m.reference,
            m.notes
        )?;
    }
    writeln!(out, "{} movements ({})", found.len(), filter.period)?;
    Ok(())
}

pub fn low(shop: &Shop, threshold: Option<i64>, out: &mut dyn Write) -> AppResult<()> {
    let threshold = threshold.unwrap_or(shop.config().stock.low_stock_threshold);
    let loaded = shop.store().catalog().load()?;
    let products = low_stock(&loaded.catalog, threshold);

    if products.is_empty() {
        writeln!(out, "Nothing at or below {} units", threshold)?;
        return Ok(());
    }
    writeln!(out, "{}", product_header())?;
    for product in &products {
        writeln!(out, "{}", product_row(product, shop.engine()))?;
    }
    writeln!(out, "{} products at or below {} units", products.len(), threshold)?;
    Ok(())
}

pub fn value(shop: &Shop, out: &mut dyn Write) -> AppResult<()> {
    let loaded = shop.store().catalog().load()?;
    let v = stock_valuation(&loaded.catalog);

    writeln!(out, "Products          {}", v.products)?;
    writeln!(out, "Units on hand     {}", v.units)?;
    writeln!(out, "Value at cost     {}", v.at_cost)?;
    writeln!(out, "Value at MRP      {}", v.at_mrp)?;
    writeln!(out, "Potential margin  {}", v.potential_margin())?;
    if v.missing_cost > 0 {
        writeln!(out, "({} stocked products have no cost price)", v.missing_cost)?;
    }
    Ok(())
}
