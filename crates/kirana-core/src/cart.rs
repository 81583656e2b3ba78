//! # Cart & Checkout
//!
//! The bill being rung up, and its conversion into a [`Sale`].
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Cart Method             Effect                │
//! │  ──────────────           ───────────             ──────                │
//! │  Scan / pick product ───► add_item() ──────────► line added or merged  │
//! │  Change quantity ───────► update_quantity() ───► qty = n (0 removes)   │
//! │  Remove line ───────────► remove_item()                                 │
//! │  Bill discount ─────────► set_discount_bps()                            │
//! │  Save ──────────────────► checkout() ──────────► stock −= qty, Sale    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are frozen when a line is added. Stock is only checked on add and
//! re-checked at checkout; it is decremented at checkout only.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PricingEngine;
use crate::types::{CustomerRef, PaymentMethod, Product, Sale, SaleLine};
use crate::validation::{validate_discount_bps, validate_quantity, validate_selling_price};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Price Choice
// =============================================================================

/// Which price a line is charged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceChoice {
    /// The resolved sell price.
    #[default]
    SellPrice,
    /// Full MRP.
    Mrp,
    /// A price typed in by the cashier.
    Custom(Money),
}

impl PriceChoice {
    fn price_for(&self, product: &Product, engine: &PricingEngine) -> CoreResult<Money> {
        match *self {
            PriceChoice::SellPrice => Ok(engine.resolve(product)?.price),
            PriceChoice::Mrp => product
                .mrp
                .filter(Money::is_positive)
                .ok_or_else(|| CoreError::invalid_data(&product.id, "mrp", "is missing")),
            PriceChoice::Custom(price) => {
                validate_selling_price(price)?;
                Ok(price)
            }
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    /// Frozen at add time.
    pub unit_price: Money,
    pub mrp: Option<Money>,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Figures shown under the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub line_count: usize,
    pub units: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Everything checkout needs besides the cart itself.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer: Option<CustomerRef>,
    pub payment_method: PaymentMethod,
    /// Local time of the sale. Passed in so the core stays clock-free.
    pub timestamp: NaiveDateTime,
}

// =============================================================================
// Cart
// =============================================================================

/// ## Invariants
/// - Lines are unique by `product_id` (adding again merges quantity)
/// - Each quantity is within `1..=MAX_ITEM_QUANTITY` and ≤ stock at add time
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount_bps: u32,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn discount_bps(&self) -> u32 {
        self.discount_bps
    }

    /// Adds a product or increases the quantity of its line.
    ///
    /// A merged line takes the newly chosen price.
    pub fn add_item(
        &mut self,
        catalog: &Catalog,
        engine: &PricingEngine,
        product_id: &str,
        quantity: i64,
        choice: PriceChoice,
    ) -> CoreResult<&CartLine> {
        validate_quantity(quantity)?;
        let product = catalog.get(product_id)?;
        let unit_price = choice.price_for(product, engine)?;

        let position = self.lines.iter().position(|l| l.product_id == product_id);
        let in_cart = position.map_or(0, |i| self.lines[i].quantity);
        let wanted = in_cart + quantity;
        validate_quantity(wanted)?;
        if !product.can_sell(wanted) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_qty,
                requested: wanted,
            });
        }

        let index = match position {
            Some(i) => {
                let line = &mut self.lines[i];
                line.quantity = wanted;
                line.unit_price = unit_price;
                i
            }
            None => {
                if self.lines.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.lines.push(CartLine {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    quantity,
                    unit_price,
                    mrp: product.mrp,
                });
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[index])
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(
        &mut self,
        catalog: &Catalog,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity == 0 {
            self.remove_item(product_id)?;
            return Ok(());
        }
        validate_quantity(quantity)?;
        let product = catalog.get(product_id)?;
        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock_qty,
                requested: quantity,
            });
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<CartLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        Ok(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount_bps = 0;
    }

    /// Sets the bill discount (basis points, 0-10000).
    pub fn set_discount_bps(&mut self, bps: u32) -> CoreResult<()> {
        validate_discount_bps(bps)?;
        self.discount_bps = bps;
        Ok(())
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn totals(&self) -> CartTotals {
        let subtotal = self.subtotal();
        let discount = subtotal.percentage(self.discount_bps);
        CartTotals {
            line_count: self.lines.len(),
            units: self.lines.iter().map(|l| l.quantity).sum(),
            subtotal,
            discount,
            total: subtotal - discount,
        }
    }

    /// Turns the cart into a sale and takes the sold quantities out of stock.
    ///
    /// Every line is checked against current stock before anything is
    /// decremented, so a failure leaves both cart and catalog unchanged.
    /// On success the cart is emptied.
    pub fn checkout(&mut self, catalog: &mut Catalog, request: CheckoutRequest) -> CoreResult<Sale> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        for line in &self.lines {
            let product = catalog.get(&line.product_id)?;
            if !product.can_sell(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock_qty,
                    requested: line.quantity,
                });
            }
        }
        for line in &self.lines {
            catalog.adjust_stock(&line.product_id, -line.quantity)?;
        }

        let customer = request
            .customer
            .filter(|c| !c.name.trim().is_empty() || !c.phone.trim().is_empty());
        let sale = Sale {
            id: Uuid::new_v4(),
            transaction_id: Sale::transaction_id_for(request.timestamp),
            timestamp: request.timestamp,
            customer,
            payment_method: request.payment_method,
            lines: self
                .lines
                .drain(..)
                .map(|l| SaleLine {
                    product_id: Some(l.product_id),
                    product_name: l.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    mrp: l.mrp,
                })
                .collect(),
            discount_bps: self.discount_bps,
        };
        self.discount_bps = 0;

        info!(
            transaction_id = %sale.transaction_id,
            lines = sale.lines.len(),
            total = %sale.total(),
            "Sale completed"
        );
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn catalog() -> Catalog {
        let mut savour = Product::new("1", "Savour Mix 200g");
        savour.cost_price = Some(Money::from_rupees(80));
        savour.mrp = Some(Money::from_rupees(100));
        savour.stock_qty = 5;

        let mut cherry = Product::new("2", "Cherry Liquid 135ml");
        cherry.cost_price = Some(Money::from_rupees(50));
        cherry.mrp = Some(Money::from_rupees(99));
        cherry.sell_price = Some(Money::from_rupees(75));
        cherry.stock_qty = 2;

        Catalog::new(vec![savour, cherry])
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer: Some(CustomerRef {
                name: "Ramesh".to_string(),
                phone: "9911148114".to_string(),
            }),
            payment_method: PaymentMethod::Upi,
            timestamp: NaiveDate::from_ymd_opt(2025, 8, 14)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_add_item_uses_price_choice() {
        let c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();

        let line = cart.add_item(&c, &engine, "1", 1, PriceChoice::SellPrice).unwrap();
        assert_eq!(line.unit_price, Money::from_rupees(88));

        let line = cart.add_item(&c, &engine, "2", 1, PriceChoice::Mrp).unwrap();
        assert_eq!(line.unit_price, Money::from_rupees(99));

        let line = cart
            .add_item(&c, &engine, "2", 1, PriceChoice::Custom(Money::from_rupees(70)))
            .unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Money::from_rupees(70));

        assert!(cart
            .add_item(&c, &engine, "1", 1, PriceChoice::Custom(Money::zero()))
            .is_err());
    }

    #[test]
    fn test_add_item_respects_cumulative_stock() {
        let c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();

        cart.add_item(&c, &engine, "2", 2, PriceChoice::SellPrice).unwrap();
        let err = cart
            .add_item(&c, &engine, "2", 1, PriceChoice::SellPrice)
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 3, .. }));
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_update_and_remove() {
        let c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();
        cart.add_item(&c, &engine, "1", 1, PriceChoice::SellPrice).unwrap();

        cart.update_quantity(&c, "1", 4).unwrap();
        assert_eq!(cart.lines()[0].quantity, 4);
        assert!(cart.update_quantity(&c, "1", 6).is_err());

        cart.update_quantity(&c, "1", 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove_item("1").is_err());
    }

    #[test]
    fn test_totals_with_discount() {
        let c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();
        cart.add_item(&c, &engine, "1", 2, PriceChoice::SellPrice).unwrap();
        cart.add_item(&c, &engine, "2", 1, PriceChoice::SellPrice).unwrap();
        cart.set_discount_bps(1000).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.line_count, 2);
        assert_eq!(totals.units, 3);
        assert_eq!(totals.subtotal, Money::from_rupees(251));
        assert_eq!(totals.discount, Money::from_paise(2510));
        assert_eq!(totals.total, Money::from_paise(22590));
        assert!(cart.set_discount_bps(20_000).is_err());
    }

    #[test]
    fn test_checkout_decrements_stock_and_builds_sale() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();
        cart.add_item(&c, &engine, "1", 2, PriceChoice::SellPrice).unwrap();
        cart.set_discount_bps(500).unwrap();

        let sale = cart.checkout(&mut c, request()).unwrap();
        assert_eq!(sale.transaction_id, "TXN20250814090500");
        assert_eq!(sale.payment_method, PaymentMethod::Upi);
        assert_eq!(sale.lines[0].mrp, Some(Money::from_rupees(100)));
        assert_eq!(sale.total(), Money::from_paise(16720));
        assert_eq!(c.get("1").unwrap().stock_qty, 3);
        assert!(cart.is_empty());
        assert_eq!(cart.discount_bps(), 0);
    }

    #[test]
    fn test_checkout_is_all_or_nothing() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();
        cart.add_item(&c, &engine, "1", 1, PriceChoice::SellPrice).unwrap();
        cart.add_item(&c, &engine, "2", 2, PriceChoice::SellPrice).unwrap();

        // stock dropped after the line was added
        c.adjust_stock("2", -1).unwrap();

        let err = cart.checkout(&mut c, request()).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(c.get("1").unwrap().stock_qty, 5);
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_checkout_empty_cart() {
        let mut c = catalog();
        let mut cart = Cart::new();
        assert_eq!(cart.checkout(&mut c, request()).unwrap_err(), CoreError::EmptyCart);
    }

    #[test]
    fn test_blank_customer_is_walk_in() {
        let mut c = catalog();
        let engine = PricingEngine::default();
        let mut cart = Cart::new();
        cart.add_item(&c, &engine, "1", 1, PriceChoice::SellPrice).unwrap();

        let mut req = request();
        req.customer = Some(CustomerRef {
            name: " ".to_string(),
            phone: String::new(),
        });
        assert_eq!(cart.checkout(&mut c, req).unwrap().customer, None);
    }
}
