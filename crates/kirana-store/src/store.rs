//! # Shop Data Directory
//!
//! Where the shop's files live and a handle to each of their repositories.
//!
//! ```text
//! data_dir/
//! ├── inventory_master.csv      CatalogFile
//! ├── sales_transactions.csv    LedgerFile
//! ├── stock_movements.csv       MovementFile
//! ├── customers.json            CustomerFile
//! └── deleted_products.json     ArchiveFile
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::ArchiveFile;
use crate::catalog::CatalogFile;
use crate::customers::CustomerFile;
use crate::ledger::LedgerFile;
use crate::movements::MovementFile;

pub const DEFAULT_INVENTORY_FILE: &str = "inventory_master.csv";
pub const DEFAULT_LEDGER_FILE: &str = "sales_transactions.csv";
pub const DEFAULT_MOVEMENTS_FILE: &str = "stock_movements.csv";
pub const DEFAULT_CUSTOMERS_FILE: &str = "customers.json";
pub const DEFAULT_ARCHIVE_FILE: &str = "deleted_products.json";

// =============================================================================
// Configuration
// =============================================================================

/// File locations.
///
/// ## Example
/// ```rust,ignore
/// let config = StoreConfig::new("./shop_data")
///     .inventory_file("stock_sheet.csv")
///     .backup(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub inventory_file: String,
    pub ledger_file: String,
    pub movements_file: String,
    pub customers_file: String,
    pub archive_file: String,

    /// Copy the inventory sheet and customer book to `*.bak` before each save.
    /// Default: true
    pub backup: bool,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            inventory_file: DEFAULT_INVENTORY_FILE.to_string(),
            ledger_file: DEFAULT_LEDGER_FILE.to_string(),
            movements_file: DEFAULT_MOVEMENTS_FILE.to_string(),
            customers_file: DEFAULT_CUSTOMERS_FILE.to_string(),
            archive_file: DEFAULT_ARCHIVE_FILE.to_string(),
            backup: true,
        }
    }

    pub fn inventory_file(mut self, name: impl Into<String>) -> Self {
        self.inventory_file = name.into();
        self
    }

    pub fn ledger_file(mut self, name: impl Into<String>) -> Self {
        self.ledger_file = name.into();
        self
    }

    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}

// =============================================================================
// Store
// =============================================================================

/// Handle to the shop's files.
///
/// Holds no data itself; every repository reads the file when asked, so the
/// sheets can be edited in a spreadsheet between commands.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        info!(data_dir = %config.data_dir.display(), "Opening shop data");
        Store { config }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn file(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(name)
    }

    pub fn catalog(&self) -> CatalogFile {
        CatalogFile::new(self.file(&self.config.inventory_file), self.config.backup)
    }

    pub fn ledger(&self) -> LedgerFile {
        LedgerFile::new(self.file(&self.config.ledger_file))
    }

    pub fn movements(&self) -> MovementFile {
        MovementFile::new(self.file(&self.config.movements_file))
    }

    pub fn customers(&self) -> CustomerFile {
        CustomerFile::new(self.file(&self.config.customers_file), self.config.backup)
    }

    pub fn archive(&self) -> ArchiveFile {
        ArchiveFile::new(self.file(&self.config.archive_file))
    }
}
