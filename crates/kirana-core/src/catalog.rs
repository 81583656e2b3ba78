//! # Catalog
//!
//! The in-memory product table for one load cycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One till command                                 │
//! │                                                                         │
//! │  store.load() ──► Catalog ──► resolve_prices() ──► search / edit / sell │
//! │                      │                                     │            │
//! │                      └──────────── &mut Catalog ◄──────────┘            │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                                    store.save()                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog is an owned value passed by `&mut`. Every mutation checks its
//! rule first and leaves the table untouched on error.

use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{PricingEngine, PricingReport, ResolvedPrice};
use crate::search::{self, normalize_barcode};
use crate::types::{NewProduct, Product};
use crate::validation::{
    validate_barcode, validate_price, validate_price_change_bps, validate_product_name,
    validate_selling_price, validate_stock,
};
use crate::MAX_STOCK_QTY;

/// A percentage change to list prices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkPriceChange {
    /// Signed basis points: 750 raises by 7.5%, -1000 lowers by 10%.
    pub percent_bps: i64,
    /// Only products in this category (case-insensitive). `None` = all.
    pub category: Option<String>,
    /// Move cost price by the same percentage.
    pub include_cost: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkPriceReport {
    pub changed: usize,
    /// Ids of changed products that could not be priced afterwards.
    pub unpriced: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn get(&self, id: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: &str) -> CoreResult<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Exact, case-sensitive name match.
    pub fn find_by_name(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn find_by_barcode(&self, code: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code))
    }

    /// See [`search::search`].
    pub fn search(&self, query: &str) -> Vec<&Product> {
        search::search(&self.products, query)
    }

    /// See [`search::find_by_scan`].
    pub fn scan(&self, code: &str) -> CoreResult<&Product> {
        search::find_by_scan(&self.products, code)
            .ok_or_else(|| CoreError::ProductNotFound(code.trim().to_string()))
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Back-fills every missing or non-positive sell price.
    pub fn resolve_prices(&mut self, engine: &PricingEngine) -> PricingReport {
        engine.resolve_each(self.products.iter_mut())
    }

    pub fn price_of(&self, id: &str, engine: &PricingEngine) -> CoreResult<ResolvedPrice> {
        engine.resolve(self.get(id)?)
    }

    /// Stores a manual sell price override.
    pub fn set_sell_price(&mut self, id: &str, price: Money) -> CoreResult<()> {
        validate_selling_price(price)?;
        let product = self.get_mut(id)?;
        debug!(product_id = %id, from = ?product.sell_price, to = %price, "Set sell price");
        product.sell_price = Some(price);
        Ok(())
    }

    /// Drops the override so the next repricing derives it again.
    pub fn clear_sell_price(&mut self, id: &str) -> CoreResult<()> {
        self.get_mut(id)?.sell_price = None;
        Ok(())
    }

    /// Raises or lowers list prices by a percentage across the catalog or
    /// one category.
    ///
    /// MRP always moves, cost only when asked. Every touched product gets its
    /// sell price derived again from the new figures; products that can no
    /// longer be priced are left without one and listed in the report.
    pub fn apply_price_change(
        &mut self,
        change: &BulkPriceChange,
        engine: &PricingEngine,
    ) -> CoreResult<BulkPriceReport> {
        validate_price_change_bps(change.percent_bps)?;
        let category = change.category.as_deref().map(str::trim);

        let mut report = BulkPriceReport::default();
        for product in self.products.iter_mut() {
            let in_scope = match category {
                Some(wanted) => product
                    .category
                    .as_deref()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(wanted)),
                None => true,
            };
            if !in_scope || product.mrp.is_none() {
                continue;
            }

            product.mrp = product.mrp.map(|m| m.scale_bps(change.percent_bps));
            if change.include_cost {
                product.cost_price = product.cost_price.map(|c| c.scale_bps(change.percent_bps));
            }
            report.changed += 1;
            if !rederive_sell_price(product, engine) {
                report.unpriced.push(product.id.clone());
            }
        }

        info!(
            percent_bps = change.percent_bps,
            category = ?category,
            changed = report.changed,
            "Applied bulk price change"
        );
        Ok(report)
    }

    /// Replaces a product's MRP (and cost, when given) from a price list and
    /// derives its sell price again.
    pub fn set_list_price(
        &mut self,
        id: &str,
        mrp: Money,
        cost: Option<Money>,
        engine: &PricingEngine,
    ) -> CoreResult<()> {
        validate_price("mrp", mrp)?;
        if let Some(cost) = cost {
            validate_price("cost price", cost)?;
        }
        let product = self.get_mut(id)?;
        debug!(product_id = %id, from = ?product.mrp, to = %mrp, "Set list price");
        product.mrp = Some(mrp);
        if cost.is_some() {
            product.cost_price = cost;
        }
        rederive_sell_price(product, engine);
        Ok(())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Applies a stock delta and returns the new quantity.
    ///
    /// Fails without changing anything if the result would be negative or
    /// above [`MAX_STOCK_QTY`].
    pub fn adjust_stock(&mut self, id: &str, delta: i64) -> CoreResult<i64> {
        let product = self.get_mut(id)?;
        let new_qty = product.stock_qty.checked_add(delta).ok_or_else(stock_range)?;
        if new_qty < 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_qty,
                requested: delta.saturating_neg(),
            });
        }
        if new_qty > MAX_STOCK_QTY {
            return Err(stock_range().into());
        }
        product.stock_qty = new_qty;
        debug!(product_id = %id, delta, stock = new_qty, "Adjusted stock");
        Ok(new_qty)
    }

    // =========================================================================
    // Barcodes
    // =========================================================================

    /// Assigns a barcode after normalising it. Returns the stored code.
    ///
    /// Re-assigning a product's own code is a no-op.
    pub fn assign_barcode(&mut self, id: &str, raw: &str) -> CoreResult<String> {
        let code = normalize_barcode(raw).ok_or_else(|| ValidationError::Required {
            field: "barcode".to_string(),
        })?;
        validate_barcode(&code)?;

        if let Some(owner) = self.find_by_barcode(&code) {
            if owner.id != id {
                return Err(CoreError::BarcodeInUse {
                    barcode: code,
                    owner: owner.name.clone(),
                });
            }
        }

        let product = self.get_mut(id)?;
        info!(product_id = %id, barcode = %code, "Assigned barcode");
        product.barcode = Some(code.clone());
        Ok(code)
    }

    /// Removes and returns a product's barcode.
    pub fn remove_barcode(&mut self, id: &str) -> CoreResult<Option<String>> {
        Ok(self.get_mut(id)?.barcode.take())
    }

    // =========================================================================
    // Add / Remove / Restore
    // =========================================================================

    /// Next free numeric id: one past the largest numeric `Sr_No`.
    pub fn next_id(&self) -> String {
        let max = self
            .products
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }

    /// Adds a product. The name must be unique.
    pub fn add_product(&mut self, new: NewProduct) -> CoreResult<&Product> {
        let name = new.name.trim().to_string();
        validate_product_name(&name)?;
        validate_price("cost price", new.cost_price)?;
        validate_price("mrp", new.mrp)?;
        validate_stock(new.stock_qty)?;
        if let Some(price) = new.sell_price {
            validate_selling_price(price)?;
        }
        if self.find_by_name(&name).is_some() {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: name,
            }
            .into());
        }

        let barcode = match new.barcode.as_deref().and_then(normalize_barcode) {
            Some(code) => {
                validate_barcode(&code)?;
                if let Some(owner) = self.find_by_barcode(&code) {
                    return Err(CoreError::BarcodeInUse {
                        barcode: code,
                        owner: owner.name.clone(),
                    });
                }
                Some(code)
            }
            None => None,
        };

        let product = Product {
            id: self.next_id(),
            name,
            barcode,
            cost_price: Some(new.cost_price),
            mrp: Some(new.mrp),
            sell_price: new.sell_price,
            stock_qty: new.stock_qty,
            category: new.category.filter(|c| !c.trim().is_empty()),
        };
        info!(product_id = %product.id, name = %product.name, "Added product");
        self.products.push(product);
        Ok(&self.products[self.products.len() - 1])
    }

    /// Removes a product and hands it back for archiving.
    pub fn remove_product(&mut self, id: &str) -> CoreResult<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        let product = self.products.remove(index);
        info!(product_id = %id, name = %product.name, "Removed product");
        Ok(product)
    }

    /// Puts an archived product back.
    ///
    /// Rejected when a product with the same name exists. A clashing id is
    /// replaced by a fresh one, and a barcode now owned by another product
    /// is dropped.
    pub fn restore_product(&mut self, mut product: Product) -> CoreResult<&Product> {
        if self.find_by_name(&product.name).is_some() {
            return Err(ValidationError::Duplicate {
                field: "name".to_string(),
                value: product.name,
            }
            .into());
        }
        if self.get(&product.id).is_ok() {
            product.id = self.next_id();
        }
        let owner = product
            .barcode
            .as_deref()
            .and_then(|code| self.find_by_barcode(code))
            .map(|owner| owner.name.clone());
        if let Some(owner) = owner {
            warn!(barcode = ?product.barcode, owner = %owner, "Dropping barcode of restored product");
            product.barcode = None;
        }

        info!(product_id = %product.id, name = %product.name, "Restored product");
        self.products.push(product);
        Ok(&self.products[self.products.len() - 1])
    }
}

/// Clears the stored sell price and stores a freshly computed one.
/// Returns false when the product cannot be priced.
fn rederive_sell_price(product: &mut Product, engine: &PricingEngine) -> bool {
    product.sell_price = None;
    match engine.resolve(product) {
        Ok(resolved) => {
            product.sell_price = Some(resolved.price);
            true
        }
        Err(e) => {
            warn!(product_id = %product.id, error = %e, "No sell price after price change");
            false
        }
    }
}

fn stock_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "stock".to_string(),
        min: 0,
        max: MAX_STOCK_QTY,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            cost_price: Money::from_rupees(80),
            mrp: Money::from_rupees(100),
            stock_qty: 10,
            category: None,
            barcode: None,
            sell_price: None,
        }
    }

    fn catalog() -> Catalog {
        let mut c = Catalog::default();
        c.add_product(new_product("Savour Mix 200g")).unwrap();
        c.add_product(new_product("Cherry Liquid 135ml")).unwrap();
        c
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let c = catalog();
        assert_eq!(c.products()[0].id, "1");
        assert_eq!(c.products()[1].id, "2");
        assert_eq!(c.next_id(), "3");
    }

    #[test]
    fn test_add_rejects_duplicate_name() {
        let mut c = catalog();
        let err = c.add_product(new_product("Savour Mix 200g")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_add_rejects_negative_values() {
        let mut c = catalog();
        let mut bad = new_product("Bad");
        bad.stock_qty = -1;
        assert!(c.add_product(bad).is_err());

        let mut bad = new_product("Bad");
        bad.cost_price = Money::from_paise(-1);
        assert!(c.add_product(bad).is_err());
    }

    #[test]
    fn test_adjust_stock_never_negative() {
        let mut c = catalog();
        assert_eq!(c.adjust_stock("1", -4).unwrap(), 6);
        assert_eq!(c.adjust_stock("1", 5).unwrap(), 11);

        let err = c.adjust_stock("1", -12).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 11, requested: 12, .. }));
        assert_eq!(c.get("1").unwrap().stock_qty, 11);
    }

    #[test]
    fn test_adjust_stock_extreme_deltas() {
        let mut c = catalog();

        let err = c.adjust_stock("1", i64::MAX).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { max: MAX_STOCK_QTY, .. })
        ));
        let err = c.adjust_stock("1", i64::MIN).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 10, requested: i64::MAX, .. }
        ));
        assert!(c.adjust_stock("1", MAX_STOCK_QTY).is_err());
        assert_eq!(c.get("1").unwrap().stock_qty, 10);

        assert_eq!(c.adjust_stock("1", MAX_STOCK_QTY - 10).unwrap(), MAX_STOCK_QTY);
    }

    #[test]
    fn test_barcode_uniqueness() {
        let mut c = catalog();
        assert_eq!(c.assign_barcode("1", "8906020730601.0").unwrap(), "8906020730601");
        // same product again is fine
        assert!(c.assign_barcode("1", "8906020730601").is_ok());

        let err = c.assign_barcode("2", "8906020730601").unwrap_err();
        assert!(matches!(err, CoreError::BarcodeInUse { .. }));
        assert_eq!(c.get("2").unwrap().barcode, None);

        assert!(c.assign_barcode("2", "nan").is_err());
        assert_eq!(c.remove_barcode("1").unwrap().as_deref(), Some("8906020730601"));
        assert!(c.assign_barcode("2", "8906020730601").is_ok());
    }

    #[test]
    fn test_sell_price_override() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        assert_eq!(c.price_of("1", &engine).unwrap().price, Money::from_rupees(88));

        c.set_sell_price("1", Money::from_rupees(95)).unwrap();
        assert_eq!(c.price_of("1", &engine).unwrap().price, Money::from_rupees(95));
        assert!(c.set_sell_price("1", Money::zero()).is_err());

        c.clear_sell_price("1").unwrap();
        assert_eq!(c.get("1").unwrap().sell_price, None);
    }

    #[test]
    fn test_bulk_price_change_by_category() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        c.products[0].category = Some("Snacks".to_string());
        c.set_sell_price("2", Money::from_rupees(95)).unwrap();

        let change = BulkPriceChange {
            percent_bps: 1000,
            category: Some(" snacks ".to_string()),
            include_cost: false,
        };
        let report = c.apply_price_change(&change, &engine).unwrap();
        assert_eq!(report.changed, 1);
        assert!(report.unpriced.is_empty());

        let savour = c.get("1").unwrap();
        assert_eq!(savour.mrp, Some(Money::from_rupees(110)));
        assert_eq!(savour.cost_price, Some(Money::from_rupees(80)));
        // 80 + 40% × 30
        assert_eq!(savour.sell_price, Some(Money::from_rupees(92)));

        let cherry = c.get("2").unwrap();
        assert_eq!(cherry.mrp, Some(Money::from_rupees(100)));
        assert_eq!(cherry.sell_price, Some(Money::from_rupees(95)));
    }

    #[test]
    fn test_bulk_price_change_everything_with_cost() {
        let mut c = catalog();
        c.products.push(Product::new("3", "Loose Rice"));
        let change = BulkPriceChange {
            percent_bps: -1000,
            category: None,
            include_cost: true,
        };
        let report = c.apply_price_change(&change, &PricingEngine::default()).unwrap();
        assert_eq!(report.changed, 2);
        let p = c.get("2").unwrap();
        assert_eq!(p.mrp, Some(Money::from_rupees(90)));
        assert_eq!(p.cost_price, Some(Money::from_rupees(72)));
        // 72 + 40% × 18 = 79.20, rounded up
        assert_eq!(p.sell_price, Some(Money::from_rupees(80)));
        assert_eq!(c.get("3").unwrap().sell_price, None);

        let wipe = BulkPriceChange {
            percent_bps: -10_000,
            ..BulkPriceChange::default()
        };
        assert!(c.apply_price_change(&wipe, &PricingEngine::default()).is_err());
        assert_eq!(c.get("2").unwrap().mrp, Some(Money::from_rupees(90)));
    }

    #[test]
    fn test_bulk_price_change_reports_unpriced() {
        let mut c = catalog();
        c.products[1].cost_price = None;
        let change = BulkPriceChange {
            percent_bps: 500,
            ..BulkPriceChange::default()
        };
        let report = c.apply_price_change(&change, &PricingEngine::default()).unwrap();
        assert_eq!(report.changed, 2);
        assert_eq!(report.unpriced, vec!["2".to_string()]);
        assert_eq!(c.get("2").unwrap().sell_price, None);
    }

    #[test]
    fn test_set_list_price() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        c.set_list_price("1", Money::from_rupees(120), None, &engine).unwrap();
        let p = c.get("1").unwrap();
        assert_eq!(p.mrp, Some(Money::from_rupees(120)));
        assert_eq!(p.sell_price, Some(Money::from_rupees(96)));

        assert!(c
            .set_list_price("1", Money::from_paise(-1), None, &engine)
            .is_err());
        assert!(c.set_list_price("9", Money::from_rupees(1), None, &engine).is_err());
    }

    #[test]
    fn test_resolve_prices_fills_catalog() {
        let mut c = catalog();
        let report = c.resolve_prices(&PricingEngine::default());
        assert_eq!(report.recomputed, 2);
        assert!(c.iter().all(|p| p.sell_price == Some(Money::from_rupees(88))));
    }

    #[test]
    fn test_remove_and_restore() {
        let mut c = catalog();
        c.assign_barcode("1", "111").unwrap();
        let removed = c.remove_product("1").unwrap();
        assert!(c.get("1").is_err());

        // someone took the barcode meanwhile
        c.assign_barcode("2", "111").unwrap();
        let restored = c.restore_product(removed.clone()).unwrap();
        assert_eq!(restored.name, "Savour Mix 200g");
        assert_eq!(restored.barcode, None);

        let err = c.restore_product(removed).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
    }

    #[test]
    fn test_restore_reassigns_clashing_id() {
        let mut c = catalog();
        let mut ghost = Product::new("2", "Old Toffee");
        ghost.stock_qty = 4;
        let restored = c.restore_product(ghost).unwrap();
        assert_eq!(restored.id, "3");
    }

    #[test]
    fn test_scan() {
        let mut c = catalog();
        c.assign_barcode("2", "8901234").unwrap();
        assert_eq!(c.scan("8901234").unwrap().id, "2");
        assert_eq!(c.scan("1").unwrap().id, "1");
        assert!(matches!(c.scan("zzz"), Err(CoreError::ProductNotFound(_))));
    }
}
