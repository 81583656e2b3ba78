//! # Pricing Commands
//!
//! ```text
//! reprice            every product: keep a valid stored price, compute the rest,
//!                    save the sheet if anything changed
//! price set 7 95     store a manual price (must be > 0)
//! price clear 7      drop the stored price; it is computed again from cost/MRP
//! price bulk --percent 5 --category Snacks
//!                    MRP (and cost with --include-cost) up 5%, sell prices
//!                    derived again; manual prices that fall outside the new
//!                    MRP are dropped
//! price import list.csv
//!                    MRP/cost by exact product name from a supplier list
//! ```

use std::io::Write;
use std::path::Path;

use kirana_core::money::Money;
use kirana_core::BulkPriceChange;
use kirana_store::read_price_list;
use tracing::info;

use super::percent;
use crate::error::AppResult;
use crate::state::Shop;

pub fn reprice(shop: &Shop, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let report = loaded.catalog.resolve_prices(shop.engine());

    for failure in &report.failures {
        writeln!(out, "  skipped: {}", failure)?;
    }
    if report.is_dirty() {
        file.save(&loaded.catalog, &loaded.layout)?;
        info!(recomputed = report.recomputed, "Saved repriced sheet");
    }
    writeln!(out, "{}", report.status_line())?;
    Ok(())
}

pub fn set_price(shop: &Shop, code: &str, price: Money, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    loaded.catalog.set_sell_price(&id, price)?;
    file.save(&loaded.catalog, &loaded.layout)?;

    let product = loaded.catalog.get(&id)?;
    writeln!(out, "{} now sells at {}", product.name, price)?;
    Ok(())
}

pub fn clear_price(shop: &Shop, code: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    loaded.catalog.clear_sell_price(&id)?;
    file.save(&loaded.catalog, &loaded.layout)?;

    let product = loaded.catalog.get(&id)?;
    match shop.engine().resolve(product) {
        Ok(resolved) => writeln!(
            out,
            "{}: stored price cleared, computed price is {}",
            product.name, resolved.price
        )?,
        Err(e) => writeln!(out, "{}: stored price cleared ({})", product.name, e)?,
    }
    Ok(())
}

pub fn bulk(
    shop: &Shop,
    change: BulkPriceChange,
    dry_run: bool,
    out: &mut dyn Write,
) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let report = loaded.catalog.apply_price_change(&change, shop.engine())?;

    for id in &report.unpriced {
        let product = loaded.catalog.get(id)?;
        writeln!(out, "  no valid price: {} (#{})", product.name, product.id)?;
    }
    let scope = change.category.as_deref().unwrap_or("all products");
    if dry_run {
        writeln!(
            out,
            "Would change {} MRPs by {} ({}); nothing saved",
            report.changed,
            percent(change.percent_bps),
            scope
        )?;
        return Ok(());
    }
    if report.changed > 0 {
        file.save(&loaded.catalog, &loaded.layout)?;
    }
    writeln!(
        out,
        "Changed {} MRPs by {} ({})",
        report.changed,
        percent(change.percent_bps),
        scope
    )?;
    Ok(())
}

pub fn import(shop: &Shop, path: &Path, dry_run: bool, out: &mut dyn Write) -> AppResult<()> {
    let entries = read_price_list(path)?;
    let file = shop.store().catalog();
    let mut loaded = file.load()?;

    let mut updated = 0;
    for entry in &entries {
        let Some(id) = loaded.catalog.find_by_name(&entry.name).map(|p| p.id.clone()) else {
            writeln!(out, "  not in catalog: {}", entry.name)?;
            continue;
        };
        loaded
            .catalog
            .set_list_price(&id, entry.mrp, entry.cost, shop.engine())?;
        updated += 1;
    }

    if dry_run {
        writeln!(out, "Would update {} of {} listed products; nothing saved", updated, entries.len())?;
        return Ok(());
    }
    if updated > 0 {
        file.save(&loaded.catalog, &loaded.layout)?;
        info!(path = %path.display(), updated, "Imported price list");
    }
    writeln!(out, "Updated {} of {} listed products", updated, entries.len())?;
    Ok(())
}
