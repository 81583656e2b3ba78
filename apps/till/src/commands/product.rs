//! # Product Commands
//!
//! Lookup and catalog maintenance.
//!
//! ## Remove / Restore Flow
//! ```text
//! product remove 7
//!   catalog.remove_product ──► archive.archive(row incl. unknown columns)
//!                          ──► save sheet
//!
//! product restore "Savour Mix 200g"
//!   archive.restore ──► catalog.restore_product (name must be free,
//!                       id/barcode clashes resolved) ──► save sheet
//! ```

use std::io::Write;

use kirana_core::search::BarcodeFilter;
use kirana_core::NewProduct;

use super::{product_header, product_row, truncate};
use crate::cli::AddProductArgs;
use crate::error::AppResult;
use crate::state::Shop;

pub fn search(
    shop: &Shop,
    query: &str,
    filter: BarcodeFilter,
    out: &mut dyn Write,
) -> AppResult<()> {
    let loaded = shop.store().catalog().load()?;
    let found = filter.apply(loaded.catalog.search(query));

    writeln!(out, "{}", product_header())?;
    for product in &found {
        writeln!(out, "{}", product_row(product, shop.engine()))?;
    }
    writeln!(out, "{} of {} products", found.len(), loaded.catalog.len())?;
    Ok(())
}

pub fn scan(shop: &Shop, code: &str, out: &mut dyn Write) -> AppResult<()> {
    let loaded = shop.store().catalog().load()?;
    let product = loaded.catalog.scan(code)?;

    writeln!(out, "{} (#{})", product.name, product.id)?;
    let show = |m: Option<kirana_core::Money>| m.map_or("-".to_string(), |m| m.to_string());
    writeln!(out, "  cost     {}", show(product.cost_price))?;
    writeln!(out, "  MRP      {}", show(product.mrp))?;
    match shop.engine().resolve(product) {
        Ok(resolved) => writeln!(out, "  price    {} ({:?})", resolved.price, resolved.source)?,
        Err(e) => writeln!(out, "  price    - ({})", e)?,
    }
    writeln!(out, "  stock    {}", product.stock_qty)?;
    if let Some(category) = &product.category {
        writeln!(out, "  category {}", category)?;
    }
    if let Some(barcode) = &product.barcode {
        writeln!(out, "  barcode  {}", barcode)?;
    }
    Ok(())
}

pub fn add(shop: &Shop, args: AddProductArgs, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;

    let product = loaded
        .catalog
        .add_product(NewProduct {
            name: args.name,
            cost_price: args.cost,
            mrp: args.mrp,
            stock_qty: args.qty,
            category: args.category,
            barcode: args.barcode,
            sell_price: args.price,
        })?
        .clone();
    file.save(&loaded.catalog, &loaded.layout)?;

    writeln!(out, "Added {}", product_row(&product, shop.engine()))?;
    Ok(())
}

pub fn remove(shop: &Shop, code: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;
    let id = loaded.catalog.scan(code)?.id.clone();

    let product = loaded.catalog.remove_product(&id)?;
    shop.store()
        .archive()
        .archive(&product, &loaded.layout, shop.now())?;
    file.save(&loaded.catalog, &loaded.layout)?;

    writeln!(
        out,
        "Removed {} (#{}); restore with: product restore \"{}\"",
        product.name, product.id, product.name
    )?;
    Ok(())
}

pub fn restore(shop: &Shop, name: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;

    let product = shop.store().archive().restore(name, &mut loaded)?;
    file.save(&loaded.catalog, &loaded.layout)?;

    writeln!(out, "Restored {}", product_row(&product, shop.engine()))?;
    Ok(())
}

pub fn deleted(shop: &Shop, out: &mut dyn Write) -> AppResult<()> {
    let entries = shop.store().archive().list()?;
    if entries.is_empty() {
        writeln!(out, "No deleted products")?;
        return Ok(());
    }
    for (name, entry) in &entries {
        writeln!(
            out,
            "{}  {:<32}  by {}",
            entry.deleted_at.format("%Y-%m-%d %H:%M"),
            truncate(name, 32),
            if entry.deleted_by.is_empty() { "-" } else { &entry.deleted_by }
        )?;
    }
    Ok(())
}
