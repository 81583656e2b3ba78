//! # Till Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch, shared row formats)
//! ├── pricing.rs   ◄─── reprice, price set/clear/bulk/import
//! ├── product.rs   ◄─── search, scan, product add/remove/restore/deleted
//! ├── barcode.rs   ◄─── barcode assign/remove/list
//! ├── stock.rs     ◄─── stock adjust/low/value/movements
//! ├── sale.rs      ◄─── sell, receipt, history
//! ├── returns.rs   ◄─── return
//! ├── customer.rs  ◄─── customer book
//! ├── report.rs    ◄─── daily, profit, range, turnover
//! └── config.rs    ◄─── config show/init
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fn command(shop: &Shop, args..., out: &mut dyn Write) -> AppResult<()> │
//! │                                                                         │
//! │  1. load the files it needs through shop.store()                       │
//! │  2. apply kirana-core operations                                       │
//! │  3. save what changed (nothing is saved on error)                      │
//! │  4. write a human-readable result to `out`                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod barcode;
pub mod config;
pub mod customer;
pub mod pricing;
pub mod product;
pub mod report;
pub mod returns;
pub mod sale;
pub mod stock;

use std::io::Write;

use kirana_core::money::Money;
use kirana_core::movement::MovementFilter;
use kirana_core::pricing::PricingEngine;
use kirana_core::{BulkPriceChange, Product};

use crate::cli::{
    BarcodeCommand, Command, ConfigCommand, CustomerCommand, PriceCommand, ProductCommand,
    ReportCommand, StockCommand,
};
use crate::error::AppResult;
use crate::state::Shop;

/// Runs one command against an open shop.
pub fn dispatch(shop: &Shop, command: Command, out: &mut dyn Write) -> AppResult<()> {
    match command {
        Command::Reprice => pricing::reprice(shop, out),
        Command::Search { query, barcode } => product::search(shop, &query, barcode.into(), out),
        Command::Scan { code } => product::scan(shop, &code, out),

        Command::Price(PriceCommand::Set { product, price }) => {
            pricing::set_price(shop, &product, price, out)
        }
        Command::Price(PriceCommand::Clear { product }) => pricing::clear_price(shop, &product, out),
        Command::Price(PriceCommand::Bulk {
            percent,
            category,
            include_cost,
            dry_run,
        }) => pricing::bulk(
            shop,
            BulkPriceChange {
                percent_bps: percent,
                category,
                include_cost,
            },
            dry_run,
            out,
        ),
        Command::Price(PriceCommand::Import { file, dry_run }) => {
            pricing::import(shop, &file, dry_run, out)
        }

        Command::Stock(StockCommand::Adjust {
            product,
            delta,
            reason,
        }) => stock::adjust(shop, &product, delta, &reason, out),
        Command::Stock(StockCommand::Low { threshold }) => stock::low(shop, threshold, out),
        Command::Stock(StockCommand::Value) => stock::value(shop, out),
        Command::Stock(StockCommand::Movements {
            period,
            product,
            limit,
        }) => stock::movements(
            shop,
            MovementFilter {
                period,
                product,
                limit: Some(limit),
            },
            out,
        ),

        Command::Barcode(BarcodeCommand::Assign { product, code }) => {
            barcode::assign(shop, &product, &code, out)
        }
        Command::Barcode(BarcodeCommand::Remove { product }) => barcode::remove(shop, &product, out),
        Command::Barcode(BarcodeCommand::List { filter }) => barcode::list(shop, filter.into(), out),

        Command::Product(ProductCommand::Add(args)) => product::add(shop, args, out),
        Command::Product(ProductCommand::Remove { product }) => product::remove(shop, &product, out),
        Command::Product(ProductCommand::Restore { name }) => product::restore(shop, &name, out),
        Command::Product(ProductCommand::Deleted) => product::deleted(shop, out),

        Command::Sell(args) => sale::sell(shop, args, out),
        Command::Receipt { transaction_id } => sale::receipt(shop, &transaction_id, out),
        Command::History { period, text } => sale::history(shop, period, &text, out),
        Command::Return {
            transaction_id,
            item,
            quantity,
        } => returns::take_back(shop, &transaction_id, &item, quantity, out),

        Command::Customer(CustomerCommand::Add { name, phone, email }) => customer::add(
            shop,
            &name,
            phone.as_deref().unwrap_or(""),
            email.as_deref().unwrap_or(""),
            out,
        ),
        Command::Customer(CustomerCommand::List { query }) => customer::list(shop, &query, out),
        Command::Customer(CustomerCommand::Points { customer, points }) => {
            customer::add_points(shop, &customer, points, out)
        }
        Command::Customer(CustomerCommand::Redeem { customer, points }) => {
            customer::redeem(shop, &customer, points, out)
        }
        Command::Customer(CustomerCommand::Rebuild) => customer::rebuild(shop, out),

        Command::Report(ReportCommand::Daily { date }) => report::daily(shop, date, out),
        Command::Report(ReportCommand::Profit { period }) => report::profit(shop, period, out),
        Command::Report(ReportCommand::Range { from, to }) => report::range(shop, from, to, out),
        Command::Report(ReportCommand::Turnover { days }) => {
            report::stock_turnover(shop, days, out)
        }

        Command::Config(ConfigCommand::Show) => config::show(shop, out),
        Command::Config(ConfigCommand::Init { force }) => config::init(None, force, out),
    }
}

// =============================================================================
// Shared Row Formats
// =============================================================================

pub(crate) fn product_header() -> String {
    format!(
        "{:<6} {:<32} {:>5} {:>10}  {}",
        "ID", "NAME", "STOCK", "PRICE", "BARCODE"
    )
}

/// One product per line: id, name, stock, resolved price, barcode.
pub(crate) fn product_row(product: &Product, engine: &PricingEngine) -> String {
    let price = match engine.resolve(product) {
        Ok(resolved) => resolved.price.to_decimal_string(),
        Err(_) => "-".to_string(),
    };
    format!(
        "{:<6} {:<32} {:>5} {:>10}  {}",
        product.id,
        truncate(&product.name, 32),
        product.stock_qty,
        price,
        product.barcode.as_deref().unwrap_or("")
    )
}

/// Basis points as a percentage: 750 → "7.50%".
pub(crate) fn percent(bps: i64) -> String {
    format!("{}%", Money::from_paise(bps).to_decimal_string())
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row() {
        let mut p = Product::new("7", "Savour Mix 200g");
        p.cost_price = Some(Money::from_rupees(80));
        p.mrp = Some(Money::from_rupees(100));
        p.stock_qty = 24;
        p.barcode = Some("8906020730601".to_string());

        let row = product_row(&p, &PricingEngine::default());
        assert!(row.starts_with("7      Savour Mix 200g"));
        assert!(row.contains("88.00"));
        assert!(row.ends_with("8906020730601"));

        let bare = product_row(&Product::new("8", "Loose Rice"), &PricingEngine::default());
        assert!(bare.contains(" - "));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(750), "7.50%");
        assert_eq!(percent(-1000), "-10.00%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Tea", 5), "Tea");
        assert_eq!(truncate("Cherry Liquid", 6), "Cherr…");
    }
}
