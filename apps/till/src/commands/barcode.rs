//! # Barcode Commands
//!
//! Barcodes are trimmed (a spreadsheet's trailing `.0` dropped) and must be
//! unique across the sheet. Removing a barcode leaves the product in place.

use std::io::Write;

use kirana_core::search::BarcodeFilter;

use super::{product_header, product_row};
use crate::error::AppResult;
use crate::state::Shop;

pub fn assign(shop: &Shop, code: &str, barcode: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    let stored = loaded.catalog.assign_barcode(&id, barcode)?;
    file.save(&loaded.catalog, &loaded.layout)?;

    writeln!(out, "{} → {}", loaded.catalog.get(&id)?.name, stored)?;
    Ok(())
}

pub fn remove(shop: &Shop, code: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    match loaded.catalog.remove_barcode(&id)? {
        Some(old) => {
            file.save(&loaded.catalog, &loaded.layout)?;
            writeln!(out, "Removed barcode {} from {}", old, loaded.catalog.get(&id)?.name)?;
        }
        None => writeln!(out, "{} has no barcode", loaded.catalog.get(&id)?.name)?,
    }
    Ok(())
}

pub fn list(shop: &Shop, filter: BarcodeFilter, out: &mut dyn Write) -> AppResult<()> {
    let loaded = shop.store().catalog().load()?;
    let products = filter.apply(loaded.catalog.iter());
    let with = loaded.catalog.iter().filter(|p| p.has_barcode()).count();

    writeln!(out, "{}", product_header())?;
    for product in &products {
        writeln!(out, "{}", product_row(product, shop.engine()))?;
    }
    writeln!(
        out,
        "{} with barcode, {} without",
        with,
        loaded.catalog.len() - with
    )?;
    Ok(())
}
