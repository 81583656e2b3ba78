//! # kirana-store: Flat-File Persistence for Kirana POS
//!
//! Everything the shop keeps on disk is a plain file it can also open in a
//! spreadsheet or text editor. This crate reads and writes those files; the
//! rules about what the data means live in `kirana-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kirana POS Data Flow                             │
//! │                                                                         │
//! │  till command (reprice, sell, ...)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   kirana-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   Store ──► CatalogFile   inventory_master.csv                  │   │
//! │  │         ──► LedgerFile    sales_transactions.csv (append-only)  │   │
//! │  │         ──► MovementFile  stock_movements.csv (append-only)     │   │
//! │  │         ──► CustomerFile  customers.json                        │   │
//! │  │         ──► ArchiveFile   deleted_products.json                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kirana-core types (Catalog, Sale, CustomerBook)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Data directory and file locations
//! - [`catalog`] - Inventory sheet, including unknown-column round trip
//! - [`ledger`] - Sales ledger
//! - [`movements`] - Stock movement log
//! - [`pricelist`] - Supplier price lists
//! - [`customers`] - Customer book
//! - [`archive`] - Deleted products
//! - [`fsio`] - Backup-then-replace writes
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kirana_store::{Store, StoreConfig};
//!
//! let store = Store::new(StoreConfig::new("./shop_data"));
//! let mut loaded = store.catalog().load()?;
//! let report = loaded.catalog.resolve_prices(&engine);
//! store.catalog().save(&loaded.catalog, &loaded.layout)?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod archive;
pub mod catalog;
pub mod customers;
pub mod error;
pub mod fsio;
pub mod ledger;
pub mod movements;
pub mod pricelist;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use archive::{ArchiveFile, ArchivedProduct};
pub use catalog::{CatalogFile, CatalogLayout, LoadedCatalog};
pub use customers::CustomerFile;
pub use error::{StoreError, StoreResult};
pub use ledger::LedgerFile;
pub use movements::MovementFile;
pub use pricelist::{read_price_list, PriceListEntry};
pub use store::{Store, StoreConfig};
