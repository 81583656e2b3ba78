//! # Shop Session
//!
//! What every command needs: the configuration, the pricing engine built from
//! it, the shop's files, and the clock.
//!
//! ```text
//! ShopConfig ──► PricingEngine (margin share)
//!            ──► Store (data dir, file names, backups)
//!            ──► ReceiptFormatter (header, width)
//! ```
//!
//! Nothing is cached between commands. Each command loads the files it needs
//! and saves what it changed.

use chrono::{Local, NaiveDate, NaiveDateTime};
use kirana_core::pricing::PricingEngine;
use kirana_core::receipt::ReceiptFormatter;
use kirana_store::Store;

use crate::config::ShopConfig;
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct Shop {
    config: ShopConfig,
    engine: PricingEngine,
    store: Store,
    now: Option<NaiveDateTime>,
}

impl Shop {
    pub fn open(config: ShopConfig) -> AppResult<Self> {
        let engine = PricingEngine::new(config.pricing.margin_share_bps)?;
        let store = Store::new(config.store_config());
        Ok(Shop {
            config,
            engine,
            store,
            now: None,
        })
    }

    /// Pins the clock (tests, replaying a day's sales).
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn receipts(&self) -> ReceiptFormatter {
        ReceiptFormatter::new(self.config.shop.clone(), self.config.receipt.width)
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}
