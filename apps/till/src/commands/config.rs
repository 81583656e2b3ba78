//! # Config Commands

use std::io::Write;
use std::path::PathBuf;

use crate::config::ShopConfig;
use crate::error::{AppResult, ConfigError};
use crate::state::Shop;

/// Prints the effective configuration (file, environment and flags applied).
pub fn show(shop: &Shop, out: &mut dyn Write) -> AppResult<()> {
    let text = toml::to_string_pretty(shop.config()).map_err(ConfigError::from)?;
    writeln!(out, "# data dir: {}", shop.store().data_dir().display())?;
    write!(out, "{}", text)?;
    Ok(())
}

/// Writes the default configuration to `path` or the platform config dir.
pub fn init(path: Option<PathBuf>, force: bool, out: &mut dyn Write) -> AppResult<()> {
    let path = path
        .or_else(ShopConfig::default_config_path)
        .ok_or(ConfigError::NoConfigDir)?;
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path).into());
    }
    ShopConfig::default().save(&path)?;
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}
