//! # Sale Commands
//!
//! ## Sell Flow
//! ```text
//! sell 8906020730601:2 7@mrp --discount 5 --name Ramesh --phone 9876543210
//!
//!   load sheet ──► scan each item ──► Cart::add_item (stock checked per line)
//!              ──► Cart::checkout (stock decremented, Sale built)
//!              ──► save sheet                   new stock levels
//!              ──► ledger.append(sale)          one row per line
//!              ──► movements.append             one SALE row per line
//!              ──► customer book                total, visit, +1 point
//!              ──► receipt
//! ```
//!
//! Any failure before `checkout` leaves every file untouched. The sheet is
//! saved before anything is logged, so a failed save records no sale.

use std::io::Write;

use kirana_core::cart::{Cart, CheckoutRequest};
use kirana_core::movement::StockMovement;
use kirana_core::report::HistoryFilter;
use kirana_core::report::HistoryPeriod;
use kirana_core::validation::validate_phone;
use kirana_core::CustomerRef;
use tracing::info;

use super::truncate;
use crate::cli::SellArgs;
use crate::error::AppResult;
use crate::state::Shop;

pub fn sell(shop: &Shop, args: SellArgs, out: &mut dyn Write) -> AppResult<()> {
    let file = shop.store().catalog();
    let mut loaded = file.load()?;

    let mut cart = Cart::new();
    for item in &args.items {
        let id = loaded.catalog.scan(&item.code)?.id.clone();
        cart.add_item(
            &loaded.catalog,
            shop.engine(),
            &id,
            item.quantity,
            item.price,
        )?;
    }
    cart.set_discount_bps(args.discount)?;

    let customer = customer_ref(args.name.as_deref(), args.phone.as_deref())?;
    let sale = cart.checkout(
        &mut loaded.catalog,
        CheckoutRequest {
            customer,
            payment_method: args.payment,
            timestamp: shop.now(),
        },
    )?;

    file.save(&loaded.catalog, &loaded.layout)?;
    shop.store().ledger().append(&sale)?;
    shop.store().movements().append(&StockMovement::for_sale(&sale))?;

    if let Some(who) = &sale.customer {
        let customers = shop.store().customers();
        let mut book = customers.load()?;
        book.record_purchase(who, sale.total(), sale.timestamp.date());
        customers.save(&book)?;
    }
    info!(
        transaction = %sale.transaction_id,
        total = %sale.total(),
        lines = sale.lines.len(),
        "Sale recorded"
    );

    if args.no_receipt {
        writeln!(
            out,
            "{}  {} items  {}  {}",
            sale.transaction_id,
            sale.units(),
            sale.total(),
            sale.payment_method
        )?;
    } else {
        write!(out, "{}", shop.receipts().format(&sale))?;
    }
    Ok(())
}

/// A sale is attributed to a customer when a name or phone was given.
fn customer_ref(name: Option<&str>, phone: Option<&str>) -> AppResult<Option<CustomerRef>> {
    let name = name.map(str::trim).unwrap_or("");
    let phone = phone.map(str::trim).unwrap_or("");
    if name.is_empty() && phone.is_empty() {
        return Ok(None);
    }
    if !phone.is_empty() {
        validate_phone(phone)?;
    }
    Ok(Some(CustomerRef {
        name: name.to_string(),
        phone: phone.to_string(),
    }))
}

pub fn receipt(shop: &Shop, transaction_id: &str, out: &mut dyn Write) -> AppResult<()> {
    let sale = shop.store().ledger().find(transaction_id)?;
    write!(out, "{}", shop.receipts().format(&sale))?;
    Ok(())
}

pub fn history(
    shop: &Shop,
    period: HistoryPeriod,
    text: &str,
    out: &mut dyn Write,
) -> AppResult<()> {
    let sales = shop.store().ledger().load_all()?;
    let filter = HistoryFilter {
        period,
        text: text.to_string(),
    };
    let found = filter.apply(&sales, shop.today());

    for sale in &found {
        let customer = sale
            .customer
            .as_ref()
            .map(|c| if c.name.is_empty() { c.phone.as_str() } else { c.name.as_str() })
            .unwrap_or("-");
        writeln!(
            out,
            "{}  {}  {:<20} {:>4} items {:>12}  {}",
            sale.transaction_id,
            sale.timestamp.format("%Y-%m-%d %H:%M"),
            truncate(customer, 20),
            sale.units(),
            sale.total().to_string(),
            sale.payment_method
        )?;
    }
    let total: kirana_core::Money = found.iter().map(|s| s.total()).sum();
    writeln!(out, "{} sales ({}), {}", found.len(), period, total)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_ref() {
        assert_eq!(customer_ref(None, None).unwrap(), None);
        assert_eq!(customer_ref(Some("  "), Some("")).unwrap(), None);

        let who = customer_ref(Some(" Ramesh "), Some("9876543210"))
            .unwrap()
            .unwrap();
        assert_eq!(who.name, "Ramesh");
        assert_eq!(who.phone, "9876543210");

        assert!(customer_ref(Some("Ramesh"), Some("12ab")).is_err());
    }
}
