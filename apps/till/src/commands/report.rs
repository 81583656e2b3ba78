//! # Reports
//!
//! Profit uses today's cost prices from the sheet; lines whose product has
//! no cost are counted in revenue but left out of the margin.

use std::io::Write;

use chrono::NaiveDate;
use kirana_core::report::{
    daily_summary, profit_report, range_summary, turnover, HistoryFilter, HistoryPeriod,
};

use super::{percent, truncate};
use crate::error::AppResult;
use crate::state::Shop;

pub fn daily(shop: &Shop, date: Option<NaiveDate>, out: &mut dyn Write) -> AppResult<()> {
    let date = date.unwrap_or_else(|| shop.today());
    let sales = shop.store().ledger().load_all()?;
    let summary = daily_summary(&sales, date);

    writeln!(out, "Daily report {}", summary.date.format("%d-%m-%Y"))?;
    writeln!(out, "  Transactions      {}", summary.transactions)?;
    writeln!(out, "  Items sold        {}", summary.units)?;
    writeln!(out, "  Revenue           {}", summary.revenue)?;
    writeln!(out, "  Average bill      {}", summary.average_ticket)?;
    writeln!(out, "  Customer savings  {}", summary.customer_savings)?;
    for (method, amount) in &summary.by_payment {
        writeln!(out, "  {:<17} {}", method, amount)?;
    }
    Ok(())
}

fn margin(bps: Option<i64>) -> String {
    bps.map(percent).unwrap_or_else(|| "-".to_string())
}

pub fn profit(shop: &Shop, period: HistoryPeriod, out: &mut dyn Write) -> AppResult<()> {
    let sales = shop.store().ledger().load_all()?;
    let catalog = shop.store().catalog().load()?.catalog;
    let filter = HistoryFilter {
        period,
        text: String::new(),
    };
    let report = profit_report(filter.apply(&sales, shop.today()), &catalog);

    writeln!(out, "Profit report ({})", period)?;
    writeln!(out, "  Revenue           {}", report.revenue)?;
    writeln!(out, "  Cost of goods     {}", report.costed.cost)?;
    writeln!(out, "  Gross profit      {}", report.costed.profit())?;
    writeln!(out, "  Margin            {}", margin(report.costed.margin_bps()))?;
    if report.uncosted_lines > 0 {
        writeln!(out, "  ({} lines without a cost price)", report.uncosted_lines)?;
    }

    writeln!(out, "By product")?;
    for p in &report.by_product {
        writeln!(
            out,
            "  {:<32} {:>5} {:>12} {:>12} {:>8}",
            truncate(&p.name, 32),
            p.units,
            p.revenue.to_string(),
            p.profit().map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
            margin(p.margin_bps())
        )?;
    }
    writeln!(out, "By month")?;
    for (month, totals) in &report.by_month {
        writeln!(
            out,
            "  {}  {:>12} {:>12} {:>8}",
            month,
            totals.revenue.to_string(),
            totals.profit().to_string(),
            margin(totals.margin_bps())
        )?;
    }
    Ok(())
}

pub fn range(shop: &Shop, from: NaiveDate, to: NaiveDate, out: &mut dyn Write) -> AppResult<()> {
    let sales = shop.store().ledger().load_all()?;
    let summary = range_summary(&sales, from, to)?;

    writeln!(
        out,
        "Sales {} to {} ({} days)",
        from.format("%d-%m-%Y"),
        to.format("%d-%m-%Y"),
        summary.days()
    )?;
    writeln!(out, "  Transactions      {}", summary.totals.transactions)?;
    writeln!(out, "  Items sold        {}", summary.totals.units)?;
    writeln!(out, "  Revenue           {}", summary.totals.revenue)?;
    writeln!(out, "  Average per day   {}", summary.average_daily())?;

    writeln!(out, "By day")?;
    for (day, totals) in &summary.by_day {
        writeln!(
            out,
            "  {}  {:>4} sales {:>5} items {:>12}",
            day.format("%d-%m-%Y"),
            totals.transactions,
            totals.units,
            totals.revenue.to_string()
        )?;
    }
    writeln!(out, "Top products")?;
    for p in summary.by_product.iter().take(10) {
        writeln!(
            out,
            "  {:<32} {:>5} {:>12}",
            truncate(&p.name, 32),
            p.units,
            p.revenue.to_string()
        )?;
    }
    Ok(())
}

pub fn stock_turnover(shop: &Shop, days: u64, out: &mut dyn Write) -> AppResult<()> {
    let sales = shop.store().ledger().load_all()?;
    let catalog = shop.store().catalog().load()?.catalog;
    let rows = turnover(&catalog, &sales, shop.today(), days);

    writeln!(
        out,
        "{:<6} {:<32} {:>5} {:>5} {:>8} {:>6}",
        "ID", "NAME", "STOCK", "SOLD", "TURNS", "DAYS"
    )?;
    for t in &rows {
        writeln!(
            out,
            "{:<6} {:<32} {:>5} {:>5} {:>8} {:>6}",
            t.product.id,
            truncate(&t.product.name, 32),
            t.product.stock_qty,
            t.sold,
            t.ratio_bps()
                .map(|bps| format!("{}.{:02}", bps / 10_000, bps % 10_000 / 100))
                .unwrap_or_else(|| "sold out".to_string()),
            t.days_of_stock(days)
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string())
        )?;
    }

    let dead = rows
        .iter()
        .filter(|t| t.sold == 0 && t.product.stock_qty > 0)
        .count();
    writeln!(out, "{} products with stock and no sales in {} days", dead, days)?;
    Ok(())
}
