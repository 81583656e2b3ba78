//! # kirana-core: Pure Business Logic for Kirana POS
//!
//! Everything the till decides, as pure functions over owned data. No file,
//! printer or clock access happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kirana POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 kirana-till (CLI commands)                      │   │
//! │  │    reprice, search, sell, receipt, customer, report ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kirana-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ pricing  │ │  search  │ │ catalog  │ │   cart   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ customer │ │ receipt  │ │  report  │ │  money   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO CLOCK • PURE FUNCTIONS                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kirana-store (flat files)                       │   │
//! │  │   inventory CSV, sales ledger CSV, customers.json, archive      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pricing`] - Sell price resolution (stored override or cost/MRP formula)
//! - [`search`] - Name/barcode substring search and scanner lookup
//! - [`catalog`] - Owned product table and its maintenance rules
//! - [`cart`] - Bill building and checkout
//! - [`customer`] - Customer book and loyalty points
//! - [`receipt`] - Thermal receipt text
//! - [`movement`] - Stock movement log entries
//! - [`returns`] - Refunds against past sales
//! - [`report`] - Daily summary, history, profit, date range, stock reports
//! - [`money`] - Integer paise
//! - [`types`] - Product, Sale and friends
//! - [`error`] / [`validation`]
//!
//! ## Example Usage
//!
//! ```rust
//! use kirana_core::{Catalog, Money, Product};
//! use kirana_core::pricing::PricingEngine;
//!
//! let mut p = Product::new("1", "Savour Mix 200g");
//! p.cost_price = Some(Money::from_rupees(50));
//! p.mrp = Some(Money::from_rupees(99));
//!
//! let mut catalog = Catalog::new(vec![p]);
//! let report = catalog.resolve_prices(&PricingEngine::default());
//!
//! assert_eq!(report.status_line(), "1 of 1 products now have valid sell prices");
//! assert_eq!(catalog.get("1").unwrap().sell_price, Some(Money::from_rupees(70)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod money;
pub mod movement;
pub mod pricing;
pub mod receipt;
pub mod report;
pub mod returns;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{BulkPriceChange, BulkPriceReport, Catalog};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Share of the margin (MRP − cost) added on top of cost, in basis points.
pub const DEFAULT_MARGIN_SHARE_BPS: u32 = 4000;

/// Maximum lines in a single bill.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of one product on a bill (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest stock count a product may hold.
pub const MAX_STOCK_QTY: i64 = 10_000_000;
