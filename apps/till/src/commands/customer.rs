//! # Customer Commands
//!
//! Customers are addressed by their book key: the phone number, or the name
//! for customers registered without one.

use std::io::Write;

use kirana_core::customer::{Customer, CustomerBook};

use super::truncate;
use crate::error::AppResult;
use crate::state::Shop;

pub fn add(shop: &Shop, name: &str, phone: &str, email: &str, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().customers();
    let mut book = file.load()?;

    let key = CustomerBook::key_for(name, phone);
    book.register(name, phone, email, shop.today())?;
    file.save(&book)?;

    writeln!(out, "Registered {} ({})", name.trim(), key)?;
    Ok(())
}

pub fn list(shop: &Shop, query: &str, out: &mut dyn Write) -> AppResult<()> {
    let book = shop.store().customers().load()?;
    let mut found = book.search(query);
    found.sort_by(|a, b| b.total_purchases.cmp(&a.total_purchases));

    writeln!(
        out,
        "{:<24} {:<15} {:>12} {:>6} {:>10}",
        "NAME", "PHONE", "PURCHASES", "POINTS", "LAST VISIT"
    )?;
    for customer in &found {
        writeln!(out, "{}", customer_row(customer))?;
    }
    writeln!(out, "{} of {} customers", found.len(), book.len())?;
    Ok(())
}

fn customer_row(customer: &Customer) -> String {
    format!(
        "{:<24} {:<15} {:>12} {:>6} {:>10}",
        truncate(&customer.name, 24),
        customer.phone,
        customer.total_purchases.to_decimal_string(),
        customer.loyalty_points,
        customer
            .last_visit
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    )
}

pub fn add_points(shop: &Shop, key: &str, points: u64, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().customers();
    let mut book = file.load()?;

    let balance = book.add_points(key, points)?;
    file.save(&book)?;

    writeln!(out, "{}: {} points", key.trim(), balance)?;
    Ok(())
}

pub fn redeem(shop: &Shop, key: &str, points: u64, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().customers();
    let mut book = file.load()?;

    let value = book.redeem_points(key, points, shop.config().point_value())?;
    file.save(&book)?;

    let left = book.get(key)?.loyalty_points;
    writeln!(
        out,
        "Redeemed {} points worth {}; {} points left",
        points, value, left
    )?;
    Ok(())
}

/// Recomputes every customer's totals from the sales ledger.
pub fn rebuild(shop: &Shop, out: &mut dyn Write) -> AppResult<()> {
    let sales = shop.store().ledger().load_all()?;
    let file = shop.store().customers();
    let book = file.load()?.rebuild_from_sales(&sales);
    file.save(&book)?;

    writeln!(
        out,
        "Rebuilt {} customers from {} sales",
        book.len(),
        sales.len()
    )?;
    Ok(())
}
