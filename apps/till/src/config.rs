//! # Till Configuration
//!
//! Shop details, file locations and the few business knobs the till exposes.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KIRANA_DATA_DIR=/srv/shop                                          │
//! │     KIRANA_INVENTORY=stock_sheet.csv                                   │
//! │     KIRANA_SHOP_NAME="SHARMA GENERAL STORE"                            │
//! │     KIRANA_MARGIN_SHARE_BPS=3500                                       │
//! │                                                                         │
//! │  2. TOML Config File (--config, or the platform default)               │
//! │     ~/.config/till/till.toml (Linux)                                   │
//! │     ~/Library/Application Support/in.kirana.till/till.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [shop]
//! name = "BAUJI TRADERS"
//! tagline = "CONFECTIONERY STORE"
//! address_lines = ["1690 30FT ROAD,", "JAWAHAR COLONY"]
//! phones = ["9911148114"]
//!
//! [files]
//! data_dir = "/home/shop/shop_data"
//! inventory = "inventory_master.csv"
//! backup = true
//!
//! [pricing]
//! margin_share_bps = 4000   # 40% of (MRP - cost) on top of cost
//!
//! [receipt]
//! width = 42
//!
//! [loyalty]
//! point_value_paise = 10
//!
//! [stock]
//! low_stock_threshold = 10
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use kirana_core::customer::DEFAULT_POINT_VALUE_PAISE;
use kirana_core::money::Money;
use kirana_core::receipt::{ShopHeader, DEFAULT_RECEIPT_WIDTH, MIN_RECEIPT_WIDTH};
use kirana_core::report::DEFAULT_LOW_STOCK_THRESHOLD;
use kirana_core::DEFAULT_MARGIN_SHARE_BPS;
use kirana_store::store::DEFAULT_INVENTORY_FILE;
use kirana_store::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "till.toml";

/// Widest receipt the formatter is asked for.
pub const MAX_RECEIPT_WIDTH: usize = 64;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Folder holding the inventory sheet, ledger and JSON files.
    /// Default: the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_inventory")]
    pub inventory: String,

    /// Keep a `.bak` copy of the sheet and customer book on every save.
    #[serde(default = "default_true")]
    pub backup: bool,
}

fn default_inventory() -> String {
    DEFAULT_INVENTORY_FILE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            data_dir: None,
            inventory: default_inventory(),
            backup: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Share of the MRP-cost gap added to cost, in basis points.
    #[serde(default = "default_margin_share")]
    pub margin_share_bps: u32,
}

fn default_margin_share() -> u32 {
    DEFAULT_MARGIN_SHARE_BPS
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            margin_share_bps: default_margin_share(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptConfig {
    #[serde(default = "default_width")]
    pub width: usize,
}

fn default_width() -> usize {
    DEFAULT_RECEIPT_WIDTH
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        ReceiptConfig {
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    #[serde(default = "default_point_value")]
    pub point_value_paise: i64,
}

fn default_point_value() -> i64 {
    DEFAULT_POINT_VALUE_PAISE
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        LoyaltyConfig {
            point_value_paise: default_point_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Products at or below this quantity are listed as low stock.
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StockConfig {
    fn default() -> Self {
        StockConfig {
            low_stock_threshold: default_threshold(),
        }
    }
}

// =============================================================================
// Shop Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub shop: ShopHeader,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub receipt: ReceiptConfig,
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
    #[serde(default)]
    pub stock: StockConfig,
}

impl ShopConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`till.toml`), if present
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading till config");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the configuration as TOML, creating the folder if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(write_err)?;
        info!(path = %path.display(), "Till config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop name must not be empty".into()));
        }
        if self.pricing.margin_share_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "margin_share_bps must be at most 10000, got {}",
                self.pricing.margin_share_bps
            )));
        }
        if !(MIN_RECEIPT_WIDTH..=MAX_RECEIPT_WIDTH).contains(&self.receipt.width) {
            return Err(ConfigError::Invalid(format!(
                "receipt width must be between {} and {}, got {}",
                MIN_RECEIPT_WIDTH, MAX_RECEIPT_WIDTH, self.receipt.width
            )));
        }
        if self.loyalty.point_value_paise < 0 {
            return Err(ConfigError::Invalid(
                "point_value_paise must not be negative".into(),
            ));
        }
        if self.files.inventory.trim().is_empty() {
            return Err(ConfigError::Invalid("inventory file name must not be empty".into()));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `KIRANA_*` overrides from any variable source.
    pub(crate) fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("KIRANA_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.files.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(file) = var("KIRANA_INVENTORY") {
            self.files.inventory = file;
        }

        if let Some(name) = var("KIRANA_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Some(bps) = var("KIRANA_MARGIN_SHARE_BPS") {
            match bps.trim().parse::<u32>() {
                Ok(b) => {
                    debug!(margin_share_bps = b, "Overriding margin share from environment");
                    self.pricing.margin_share_bps = b;
                }
                Err(_) => warn!(value = %bps, "Ignoring unreadable KIRANA_MARGIN_SHARE_BPS"),
            }
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("in", "kirana", "till")
    }

    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Data folder: configured, else the platform data directory, else
    /// `./shop_data`.
    pub fn data_dir(&self) -> PathBuf {
        self.files
            .data_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|d| d.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("shop_data"))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.data_dir())
            .inventory_file(self.files.inventory.trim())
            .backup(self.files.backup)
    }

    pub fn point_value(&self) -> Money {
        Money::from_paise(self.loyalty.point_value_paise)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing.margin_share_bps, 4000);
        assert_eq!(config.receipt.width, 42);
        assert_eq!(config.files.inventory, "inventory_master.csv");
        assert_eq!(config.point_value(), Money::from_paise(10));
    }

    #[test]
    fn test_validation() {
        let mut config = ShopConfig::default();
        config.pricing.margin_share_bps = 10_001;
        assert!(config.validate().is_err());

        let mut config = ShopConfig::default();
        config.receipt.width = 31;
        assert!(config.validate().is_err());
        config.receipt.width = 64;
        assert!(config.validate().is_ok());

        let mut config = ShopConfig::default();
        config.shop.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ShopConfig = toml::from_str(
            r#"
            [pricing]
            margin_share_bps = 3500

            [files]
            data_dir = "/srv/shop"
            "#,
        )
        .unwrap();
        assert_eq!(config.pricing.margin_share_bps, 3500);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/shop"));
        assert_eq!(config.files.inventory, "inventory_master.csv");
        assert!(config.files.backup);
        assert_eq!(config.shop.name, "BAUJI TRADERS");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("KIRANA_DATA_DIR", "/tmp/shop"),
            ("KIRANA_SHOP_NAME", "SHARMA STORE"),
            ("KIRANA_MARGIN_SHARE_BPS", "2500"),
        ]
        .into_iter()
        .collect();

        let mut config = ShopConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.files.data_dir, Some(PathBuf::from("/tmp/shop")));
        assert_eq!(config.shop.name, "SHARMA STORE");
        assert_eq!(config.pricing.margin_share_bps, 2500);
        assert_eq!(config.files.inventory, "inventory_master.csv");

        config.apply_overrides(|k| (k == "KIRANA_MARGIN_SHARE_BPS").then(|| "lots".to_string()));
        assert_eq!(config.pricing.margin_share_bps, 2500);
    }

    #[test]
    fn test_save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("till.toml");

        let mut config = ShopConfig::default();
        config.receipt.width = 48;
        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[shop]"));
        assert!(text.contains("[pricing]"));
        assert_eq!(ShopConfig::from_file(&path).unwrap(), config);
    }
}
