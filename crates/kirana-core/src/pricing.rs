//! # Pricing Engine
//!
//! Decides the one authoritative sell price of every product.
//!
//! ## Resolution Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      resolve(product)                                   │
//! │                                                                         │
//! │  sell_price > 0 ? ──yes──► Stored(sell_price)      (no rounding)       │
//! │        │                                                                │
//! │        no (missing, zero, negative)                                     │
//! │        ▼                                                                │
//! │  cost present, ≥ 0 ?  ──no──► InvalidProductData { field: cost_price } │
//! │  mrp  present, ≥ 0 ?  ──no──► InvalidProductData { field: mrp }        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Computed( ceil_rupee( cost + 40% × (mrp − cost) ) )                   │
//! │                                                                         │
//! │  Computed = "freshly derived, the caller should persist it"            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A negative margin (MRP below cost) is not rejected. The formula is applied
//! as-is and yields a price below cost.
//!
//! ## Example
//! ```rust
//! use kirana_core::{Money, Product};
//! use kirana_core::pricing::{resolve_sell_price, PriceSource};
//!
//! let mut p = Product::new("1", "Savour Mix 200g");
//! p.cost_price = Some(Money::from_rupees(80));
//! p.mrp = Some(Money::from_rupees(100));
//!
//! let resolved = resolve_sell_price(&p).unwrap();
//! assert_eq!(resolved.price, Money::from_rupees(88));
//! assert_eq!(resolved.source, PriceSource::Computed);
//! ```

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{ceil_div, Money, PAISE_PER_RUPEE};
use crate::types::Product;
use crate::DEFAULT_MARGIN_SHARE_BPS;

const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Resolved Price
// =============================================================================

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// The product's own positive sell price.
    Stored,
    /// Derived from cost and MRP. Should be written back.
    Computed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub price: Money,
    pub source: PriceSource,
}

impl ResolvedPrice {
    pub fn needs_persist(&self) -> bool {
        self.source == PriceSource::Computed
    }
}

// =============================================================================
// Pricing Engine
// =============================================================================

/// Sell-price resolver with a configurable share of the margin.
///
/// `margin_share_bps` is the fraction of `mrp - cost` added on top of cost,
/// in basis points. The shop default is 4000 (40%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    margin_share_bps: u32,
}

impl Default for PricingEngine {
    fn default() -> Self {
        PricingEngine {
            margin_share_bps: DEFAULT_MARGIN_SHARE_BPS,
        }
    }
}

impl PricingEngine {
    /// Creates an engine with a custom margin share (0-10000 bps).
    pub fn new(margin_share_bps: u32) -> CoreResult<Self> {
        if margin_share_bps > BPS_SCALE as u32 {
            return Err(ValidationError::OutOfRange {
                field: "margin_share_bps".to_string(),
                min: 0,
                max: BPS_SCALE as i64,
            }
            .into());
        }
        Ok(PricingEngine { margin_share_bps })
    }

    pub fn margin_share_bps(&self) -> u32 {
        self.margin_share_bps
    }

    /// Resolves the sell price of one product. Never mutates it.
    pub fn resolve(&self, product: &Product) -> CoreResult<ResolvedPrice> {
        if let Some(stored) = product.sell_price.filter(Money::is_positive) {
            return Ok(ResolvedPrice {
                price: stored,
                source: PriceSource::Stored,
            });
        }

        let cost = required_price(product, "cost_price", product.cost_price)?;
        let mrp = required_price(product, "mrp", product.mrp)?;

        Ok(ResolvedPrice {
            price: self.compute(cost, mrp),
            source: PriceSource::Computed,
        })
    }

    /// `ceil(cost + share × (mrp − cost))` to the whole rupee, in integers.
    pub fn compute(&self, cost: Money, mrp: Money) -> Money {
        let cost = cost.paise() as i128;
        let margin = mrp.paise() as i128 - cost;
        let numerator = cost * BPS_SCALE + self.margin_share_bps as i128 * margin;
        let rupees = ceil_div(numerator, BPS_SCALE * PAISE_PER_RUPEE as i128);
        Money::from_rupees(rupees as i64)
    }

    /// Resolves every product in place.
    ///
    /// Computed prices are written into `sell_price`. Rows that cannot be
    /// priced are left untouched and reported in [`PricingReport::failures`].
    pub fn resolve_each<'a, I>(&self, products: I) -> PricingReport
    where
        I: IntoIterator<Item = &'a mut Product>,
    {
        let mut report = PricingReport::default();

        for product in products {
            report.total += 1;
            match self.resolve(product) {
                // a zero computed over a zero stored price changes nothing
                Ok(resolved)
                    if resolved.needs_persist() && product.sell_price != Some(resolved.price) =>
                {
                    debug!(
                        product_id = %product.id,
                        previous = ?product.sell_price,
                        price = %resolved.price,
                        "Computed sell price"
                    );
                    product.sell_price = Some(resolved.price);
                    report.recomputed += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "Cannot price product");
                    report.failures.push(e);
                }
            }
        }

        info!(
            total = report.total,
            recomputed = report.recomputed,
            failed = report.failures.len(),
            "Repriced catalog"
        );
        report
    }

    /// Owned batch variant of [`PricingEngine::resolve_each`].
    pub fn resolve_all(&self, mut products: Vec<Product>) -> (Vec<Product>, PricingReport) {
        let report = self.resolve_each(products.iter_mut());
        (products, report)
    }
}

fn required_price(product: &Product, field: &str, value: Option<Money>) -> CoreResult<Money> {
    match value {
        None => Err(CoreError::invalid_data(&product.id, field, "is missing")),
        Some(v) if v.is_negative() => Err(CoreError::invalid_data(
            &product.id,
            field,
            format!("is negative ({v})"),
        )),
        Some(v) => Ok(v),
    }
}

// =============================================================================
// Batch Report
// =============================================================================

/// Outcome of a batch repricing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingReport {
    pub total: usize,
    /// Products whose sell price was freshly computed and written.
    pub recomputed: usize,
    /// One `InvalidProductData` per product that could not be priced.
    pub failures: Vec<CoreError>,
}

impl PricingReport {
    /// Products that now carry a positive sell price.
    pub fn valid(&self) -> usize {
        self.total - self.failures.len()
    }

    /// Whether anything changed and the catalog should be saved.
    pub fn is_dirty(&self) -> bool {
        self.recomputed > 0
    }

    /// e.g. "504 of 504 products now have valid sell prices"
    pub fn status_line(&self) -> String {
        format!(
            "{} of {} products now have valid sell prices",
            self.valid(),
            self.total
        )
    }
}

// =============================================================================
// Free functions (default 40% share)
// =============================================================================

/// Resolves one product with the default engine.
pub fn resolve_sell_price(product: &Product) -> CoreResult<ResolvedPrice> {
    PricingEngine::default().resolve(product)
}

/// Batch-resolves with the default engine.
pub fn resolve_all(products: Vec<Product>) -> (Vec<Product>, PricingReport) {
    PricingEngine::default().resolve_all(products)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str, cost: Option<i64>, mrp: Option<i64>, sell: Option<i64>) -> Product {
        let mut p = Product::new(id, format!("Product {id}"));
        p.cost_price = cost.map(Money::from_paise);
        p.mrp = mrp.map(Money::from_paise);
        p.sell_price = sell.map(Money::from_paise);
        p
    }

    #[test]
    fn test_stored_price_returned_unchanged() {
        let p = product("1", Some(8000), Some(10000), Some(9550));
        let r = resolve_sell_price(&p).unwrap();
        assert_eq!(r.price, Money::from_paise(9550));
        assert_eq!(r.source, PriceSource::Stored);
    }

    #[test]
    fn test_stored_price_ignores_bad_cost() {
        let p = product("1", None, None, Some(1000));
        assert_eq!(resolve_sell_price(&p).unwrap().price, Money::from_rupees(10));
    }

    #[test]
    fn test_computed_examples() {
        let p = product("1", Some(8000), Some(10000), None);
        assert_eq!(resolve_sell_price(&p).unwrap().price, Money::from_rupees(88));

        let p = product("2", Some(5000), Some(9900), None);
        let r = resolve_sell_price(&p).unwrap();
        assert_eq!(r.price, Money::from_rupees(70));
        assert!(r.needs_persist());
    }

    #[test]
    fn test_zero_and_negative_stored_prices_are_recomputed() {
        for sell in [0, -500] {
            let p = product("1", Some(8000), Some(10000), Some(sell));
            let r = resolve_sell_price(&p).unwrap();
            assert_eq!(r.price, Money::from_rupees(88));
            assert_eq!(r.source, PriceSource::Computed);
        }
    }

    #[test]
    fn test_negative_margin_is_not_rejected() {
        // mrp below cost: 100 + 0.4 × (−20) = 92
        let p = product("1", Some(10000), Some(8000), None);
        assert_eq!(resolve_sell_price(&p).unwrap().price, Money::from_rupees(92));
    }

    #[test]
    fn test_rounds_up_even_on_tiny_fractions() {
        // 10 + 0.4 × 0.01 = 10.004 → 11
        let p = product("1", Some(1000), Some(1001), None);
        assert_eq!(resolve_sell_price(&p).unwrap().price, Money::from_rupees(11));
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let err = resolve_sell_price(&product("7", None, Some(10000), None)).unwrap_err();
        assert_eq!(err, CoreError::invalid_data("7", "cost_price", "is missing"));

        let err = resolve_sell_price(&product("8", Some(100), None, None)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidProductData { ref field, .. } if field == "mrp"
        ));

        let err = resolve_sell_price(&product("9", Some(-100), Some(100), None)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidProductData { ref field, .. } if field == "cost_price"
        ));
    }

    #[test]
    fn test_custom_margin_share() {
        let engine = PricingEngine::new(5000).unwrap();
        let p = product("1", Some(8000), Some(10000), None);
        assert_eq!(engine.resolve(&p).unwrap().price, Money::from_rupees(90));
        assert!(PricingEngine::new(10_001).is_err());
    }

    #[test]
    fn test_resolve_all_counts_recomputed_and_failures() {
        let products = vec![
            product("1", Some(8000), Some(10000), None),
            product("2", Some(8000), Some(10000), Some(9000)),
            product("3", Some(5000), Some(9900), Some(0)),
            product("4", None, Some(9900), None),
        ];

        let (updated, report) = resolve_all(products);
        assert_eq!(report.total, 4);
        assert_eq!(report.recomputed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.status_line(), "3 of 4 products now have valid sell prices");

        assert_eq!(updated[0].sell_price, Some(Money::from_rupees(88)));
        assert_eq!(updated[1].sell_price, Some(Money::from_rupees(90)));
        assert_eq!(updated[2].sell_price, Some(Money::from_rupees(70)));
        assert_eq!(updated[3].sell_price, None);
    }

    #[test]
    fn test_resolve_all_is_idempotent() {
        let products = vec![
            product("1", Some(8000), Some(10000), None),
            product("2", Some(5000), Some(9900), Some(-1)),
        ];
        let (first, report) = resolve_all(products);
        assert!(report.is_dirty());

        let (second, report) = resolve_all(first.clone());
        assert_eq!(report.recomputed, 0);
        assert!(!report.is_dirty());
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_positive_stored_price_passes_through(
            sell in 1i64..10_000_000,
            cost in proptest::option::of(-1000i64..1_000_000),
        ) {
            let p = product("p", cost, None, Some(sell));
            let r = resolve_sell_price(&p).unwrap();
            prop_assert_eq!(r.price, Money::from_paise(sell));
            prop_assert_eq!(r.source, PriceSource::Stored);
        }

        #[test]
        fn prop_computed_price_is_whole_rupee_ceiling(
            cost in 0i64..10_000_000,
            mrp in 0i64..10_000_000,
        ) {
            let p = product("p", Some(cost), Some(mrp), None);
            let price = resolve_sell_price(&p).unwrap().price;
            prop_assert_eq!(price.paise_part(), 0);

            // exact value in 1/1_000_000 rupee: 10000·cost + 4000·(mrp − cost)
            let exact = cost as i128 * 10_000 + 4_000 * (mrp as i128 - cost as i128);
            let price_scaled = price.rupees() as i128 * 1_000_000;
            prop_assert!(price_scaled >= exact);
            prop_assert!(price_scaled - exact < 1_000_000);
        }

        #[test]
        fn prop_resolve_all_idempotent(
            rows in proptest::collection::vec(
                (
                    proptest::option::of(-100i64..100_000),
                    proptest::option::of(-100i64..100_000),
                    proptest::option::of(-100i64..100_000),
                ),
                0..20,
            )
        ) {
            let products: Vec<Product> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (c, m, s))| product(&i.to_string(), c, m, s))
                .collect();
            let (once, _) = resolve_all(products);
            let (twice, report) = resolve_all(once.clone());
            prop_assert_eq!(report.recomputed, 0);
            prop_assert_eq!(once, twice);
        }
    }
}
