//! # Reports
//!
//! Read-only views over the sales ledger and the catalog: the day's takings,
//! transaction history lookup, profit, date-range totals, turnover, low stock
//! and stock valuation.
//!
//! ## Profit
//! ```text
//! sale line ──► catalog cost (by Product_Id, else by name) × qty
//!           ──► profit = line final amount − cost
//! ```
//! Lines whose product has no cost in the catalog count toward revenue only.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};

use crate::catalog::Catalog;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Product, Sale};

/// Stock at or below this counts as low unless configured otherwise.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Daily Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub transactions: usize,
    pub units: i64,
    pub revenue: Money,
    /// Revenue / transactions, truncated to the paisa. Zero on a blank day.
    pub average_ticket: Money,
    /// Saved against MRP, bill discounts included.
    pub customer_savings: Money,
    /// Revenue per payment method, keyed by its display name.
    pub by_payment: BTreeMap<String, Money>,
}

pub fn daily_summary(sales: &[Sale], date: NaiveDate) -> DailySummary {
    let mut summary = DailySummary {
        date,
        transactions: 0,
        units: 0,
        revenue: Money::zero(),
        average_ticket: Money::zero(),
        customer_savings: Money::zero(),
        by_payment: BTreeMap::new(),
    };

    for sale in sales.iter().filter(|s| s.timestamp.date() == date) {
        let total = sale.total();
        summary.transactions += 1;
        summary.units += sale.units();
        summary.revenue += total;
        summary.customer_savings += sale.savings();
        *summary
            .by_payment
            .entry(sale.payment_method.to_string())
            .or_default() += total;
    }

    if summary.transactions > 0 {
        summary.average_ticket =
            Money::from_paise(summary.revenue.paise() / summary.transactions as i64);
    }
    summary
}

// =============================================================================
// Transaction History
// =============================================================================

/// Date window for the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPeriod {
    Today,
    Last7Days,
    Last30Days,
    #[default]
    All,
}

impl HistoryPeriod {
    /// Whether a sale on `date` falls in the window ending `today`.
    pub fn covers(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let since = |days: u64| today.checked_sub_days(Days::new(days)).map_or(true, |d| date >= d);
        match self {
            HistoryPeriod::Today => date == today,
            HistoryPeriod::Last7Days => since(7),
            HistoryPeriod::Last30Days => since(30),
            HistoryPeriod::All => true,
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPeriod::Today => write!(f, "today"),
            HistoryPeriod::Last7Days => write!(f, "7d"),
            HistoryPeriod::Last30Days => write!(f, "30d"),
            HistoryPeriod::All => write!(f, "all"),
        }
    }
}

impl FromStr for HistoryPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(HistoryPeriod::Today),
            "7d" | "week" | "last7" => Ok(HistoryPeriod::Last7Days),
            "30d" | "month" | "last30" => Ok(HistoryPeriod::Last30Days),
            "all" => Ok(HistoryPeriod::All),
            _ => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: "expected today, 7d, 30d or all".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub period: HistoryPeriod,
    /// Case-insensitive; matched against customer name and phone,
    /// transaction id and payment method.
    pub text: String,
}

impl HistoryFilter {
    /// Matching sales, newest first.
    pub fn apply<'a>(&self, sales: &'a [Sale], today: NaiveDate) -> Vec<&'a Sale> {
        let needle = self.text.trim().to_lowercase();
        let mut found: Vec<&Sale> = sales
            .iter()
            .filter(|s| self.period.covers(s.timestamp.date(), today))
            .filter(|s| needle.is_empty() || sale_matches(s, &needle))
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found
    }
}

fn sale_matches(sale: &Sale, needle: &str) -> bool {
    let customer = sale.customer.as_ref();
    customer.is_some_and(|c| c.name.to_lowercase().contains(needle) || c.phone.contains(needle))
        || sale.transaction_id.to_lowercase().contains(needle)
        || sale.payment_method.to_string().to_lowercase().contains(needle)
}

// =============================================================================
// Profit
// =============================================================================

/// Profit over `cost`, in basis points of `revenue`. `None` on zero revenue.
fn margin_bps(profit: Money, revenue: Money) -> Option<i64> {
    if revenue.is_zero() {
        return None;
    }
    Some((profit.paise() as i128 * 10_000 / revenue.paise() as i128) as i64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductProfit {
    pub name: String,
    pub units: i64,
    pub revenue: Money,
    /// `None` when some line of the product has no known cost.
    pub cost: Option<Money>,
}

impl ProductProfit {
    pub fn profit(&self) -> Option<Money> {
        self.cost.map(|c| self.revenue - c)
    }

    pub fn margin_bps(&self) -> Option<i64> {
        margin_bps(self.profit()?, self.revenue)
    }
}

/// Revenue and cost of lines with a known cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostedTotals {
    pub revenue: Money,
    pub cost: Money,
}

impl CostedTotals {
    pub fn profit(&self) -> Money {
        self.revenue - self.cost
    }

    pub fn margin_bps(&self) -> Option<i64> {
        margin_bps(self.profit(), self.revenue)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfitReport {
    /// Every line, costed or not.
    pub revenue: Money,
    pub costed: CostedTotals,
    pub uncosted_lines: usize,
    /// Most profitable first; products without a cost last.
    pub by_product: Vec<ProductProfit>,
    /// Keyed `YYYY-MM`.
    pub by_month: BTreeMap<String, CostedTotals>,
}

pub fn profit_report<'a>(
    sales: impl IntoIterator<Item = &'a Sale>,
    catalog: &Catalog,
) -> ProfitReport {
    let mut report = ProfitReport::default();
    let mut products: BTreeMap<String, ProductProfit> = BTreeMap::new();

    for sale in sales {
        let month = sale.timestamp.format("%Y-%m").to_string();
        for (line, paid) in sale.lines.iter().zip(sale.line_final_amounts()) {
            let unit_cost = line
                .product_id
                .as_deref()
                .and_then(|id| catalog.get(id).ok())
                .or_else(|| catalog.find_by_name(&line.product_name))
                .and_then(|p| p.cost_price);
            let cost = unit_cost.map(|c| c.saturating_multiply_quantity(line.quantity));

            report.revenue += paid;
            let entry = products
                .entry(line.product_name.clone())
                .or_insert_with(|| ProductProfit {
                    name: line.product_name.clone(),
                    units: 0,
                    revenue: Money::zero(),
                    cost: Some(Money::zero()),
                });
            entry.units += line.quantity;
            entry.revenue += paid;

            match cost {
                Some(cost) => {
                    entry.cost = entry.cost.map(|c| c + cost);
                    report.costed.revenue += paid;
                    report.costed.cost += cost;
                    let m = report.by_month.entry(month.clone()).or_default();
                    m.revenue += paid;
                    m.cost += cost;
                }
                None => {
                    entry.cost = None;
                    report.uncosted_lines += 1;
                }
            }
        }
    }

    let mut by_product: Vec<ProductProfit> = products.into_values().collect();
    by_product.sort_by_key(|p| (p.profit().is_none(), Reverse(p.profit())));
    report.by_product = by_product;
    report
}

// =============================================================================
// Date Range
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalesTotals {
    pub transactions: usize,
    pub units: i64,
    pub revenue: Money,
}

impl SalesTotals {
    fn add(&mut self, sale: &Sale) {
        self.transactions += 1;
        self.units += sale.units();
        self.revenue += sale.total();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub name: String,
    pub units: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub totals: SalesTotals,
    /// Only days with sales.
    pub by_day: BTreeMap<NaiveDate, SalesTotals>,
    /// Best sellers by revenue.
    pub by_product: Vec<ProductSales>,
}

impl RangeSummary {
    /// Calendar days in the range, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Revenue per calendar day, truncated to the paisa.
    pub fn average_daily(&self) -> Money {
        Money::from_paise(self.totals.revenue.paise() / self.days())
    }
}

/// Totals for sales dated `from..=to`.
pub fn range_summary(
    sales: &[Sale],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<RangeSummary, ValidationError> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "date range".to_string(),
            reason: format!("{from} is after {to}"),
        });
    }

    let mut totals = SalesTotals::default();
    let mut by_day: BTreeMap<NaiveDate, SalesTotals> = BTreeMap::new();
    let mut products: BTreeMap<String, ProductSales> = BTreeMap::new();
    for sale in sales {
        let date = sale.timestamp.date();
        if date < from || date > to {
            continue;
        }
        totals.add(sale);
        by_day.entry(date).or_default().add(sale);
        for (line, paid) in sale.lines.iter().zip(sale.line_final_amounts()) {
            let entry = products
                .entry(line.product_name.clone())
                .or_insert_with(|| ProductSales {
                    name: line.product_name.clone(),
                    units: 0,
                    revenue: Money::zero(),
                });
            entry.units += line.quantity;
            entry.revenue += paid;
        }
    }

    let mut by_product: Vec<ProductSales> = products.into_values().collect();
    by_product.sort_by_key(|p| Reverse(p.revenue));
    Ok(RangeSummary {
        from,
        to,
        totals,
        by_day,
        by_product,
    })
}

// =============================================================================
// Turnover
// =============================================================================

/// How fast one product sold over a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turnover<'a> {
    pub product: &'a Product,
    pub sold: i64,
}

impl Turnover<'_> {
    /// Units sold per unit on hand, in basis points. `None` when it sold
    /// but nothing is left (unbounded).
    pub fn ratio_bps(&self) -> Option<i64> {
        let stock = self.product.stock_qty;
        if stock > 0 {
            Some((self.sold as i128 * 10_000 / stock as i128) as i64)
        } else if self.sold > 0 {
            None
        } else {
            Some(0)
        }
    }

    /// Days the stock on hand lasts at the window's pace. `None` when
    /// nothing sold.
    pub fn days_of_stock(&self, window_days: u64) -> Option<i64> {
        if self.sold <= 0 {
            return None;
        }
        let stock = self.product.stock_qty.max(0) as i128;
        Some((stock * window_days as i128 / self.sold as i128) as i64)
    }
}

/// Units sold per product in the `window_days` up to `today`, fastest
/// movers first. Products that did not sell come last.
pub fn turnover<'a>(
    catalog: &'a Catalog,
    sales: &[Sale],
    today: NaiveDate,
    window_days: u64,
) -> Vec<Turnover<'a>> {
    let since = today.checked_sub_days(Days::new(window_days));
    let mut by_id: HashMap<&str, i64> = HashMap::new();
    let mut by_name: HashMap<&str, i64> = HashMap::new();
    for sale in sales {
        if since.is_some_and(|d| sale.timestamp.date() < d) {
            continue;
        }
        for line in &sale.lines {
            let slot = match line.product_id.as_deref() {
                Some(id) => by_id.entry(id),
                None => by_name.entry(line.product_name.as_str()),
            };
            *slot.or_default() += line.quantity;
        }
    }

    let mut rows: Vec<Turnover<'a>> = catalog
        .iter()
        .map(|p| Turnover {
            product: p,
            sold: by_id.get(p.id.as_str()).copied().unwrap_or(0)
                + by_name.get(p.name.as_str()).copied().unwrap_or(0),
        })
        .collect();
    rows.sort_by_key(|t| Reverse(t.ratio_bps().unwrap_or(i64::MAX)));
    rows
}

// =============================================================================
// Stock Reports
// =============================================================================

/// Products with stock at or below `threshold`, lowest first.
pub fn low_stock(catalog: &Catalog, threshold: i64) -> Vec<&Product> {
    let mut low: Vec<&Product> = catalog
        .iter()
        .filter(|p| p.stock_qty <= threshold)
        .collect();
    low.sort_by_key(|p| p.stock_qty);
    low
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockValuation {
    pub products: usize,
    pub units: i64,
    /// Σ stock × cost over products with a known cost.
    pub at_cost: Money,
    /// Σ stock × MRP over products with a known MRP.
    pub at_mrp: Money,
    /// Products with stock whose cost is unknown.
    pub missing_cost: usize,
}

impl StockValuation {
    /// Expected gross margin if all stock sold at MRP.
    pub fn potential_margin(&self) -> Money {
        self.at_mrp.saturating_sub(self.at_cost)
    }
}

/// Stock value at cost and at MRP. Totals clamp instead of overflowing.
pub fn stock_valuation(catalog: &Catalog) -> StockValuation {
    let mut v = StockValuation::default();
    for p in catalog.iter() {
        v.products += 1;
        let qty = p.stock_qty.max(0);
        v.units = v.units.saturating_add(qty);
        match p.cost_price {
            Some(cost) => v.at_cost = v.at_cost.saturating_add(cost.saturating_multiply_quantity(qty)),
            None if qty > 0 => v.missing_cost += 1,
            None => {}
        }
        if let Some(mrp) = p.mrp {
            v.at_mrp = v.at_mrp.saturating_add(mrp.saturating_multiply_quantity(qty));
        }
    }
    v
}

// =============================================================================
// Unit Tests
// =============================================================================
