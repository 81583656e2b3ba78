//! # Command Line
//!
//! ```text
//! kirana-till [--config FILE] [--data-dir DIR] <command>
//!
//!   reprice                          fill in sell prices, save the sheet
//!   search [QUERY] [--barcode with]  list matching products
//!   scan CODE                        barcode / id / name lookup
//!   price set|clear                  manual sell price
//!   price bulk --percent 5 [--category Snacks]
//!   price import FILE                MRP/cost from a supplier price list
//!   stock adjust|low|value|movements
//!   barcode assign|remove|list
//!   product add|remove|restore|deleted
//!   sell ITEM... [--discount 5] [--name N --phone P] [--payment upi]
//!   receipt TXN
//!   return TXN ITEM QTY              refund and restock part of a sale
//!   history [--period 7d] [--text ramesh]
//!   customer add|list|points|redeem|rebuild
//!   report daily|profit|range|turnover
//!   config show|init
//! ```
//!
//! Products are named by anything [`kirana_core::Catalog::scan`] accepts:
//! barcode, `Sr_No`, or part of the name.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kirana_core::cart::PriceChoice;
use kirana_core::money::Money;
use kirana_core::report::HistoryPeriod;
use kirana_core::search::BarcodeFilter;
use kirana_core::PaymentMethod;

#[derive(Debug, Parser)]
#[command(
    name = "kirana-till",
    about = "Point of sale and stock keeping for a neighbourhood shop",
    version
)]
pub struct Cli {
    /// Config file (default: platform config dir / till.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Folder with the inventory sheet and other shop files
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fill in missing or invalid sell prices and save the sheet
    Reprice,

    /// Search products by name or barcode
    Search {
        /// Case-insensitive text; empty lists everything
        #[arg(default_value = "")]
        query: String,
        #[arg(long, value_enum, default_value_t = BarcodeArg::All)]
        barcode: BarcodeArg,
    },

    /// Look a product up the way the scanner does
    Scan { code: String },

    #[command(subcommand)]
    Price(PriceCommand),

    #[command(subcommand)]
    Stock(StockCommand),

    #[command(subcommand)]
    Barcode(BarcodeCommand),

    #[command(subcommand)]
    Product(ProductCommand),

    /// Ring up a sale
    Sell(SellArgs),

    /// Print the receipt of a past sale
    Receipt { transaction_id: String },

    /// Take goods back against a past sale
    Return {
        transaction_id: String,
        /// Line number on the receipt or part of the product name
        item: String,
        quantity: i64,
    },

    /// List past sales, newest first
    History {
        /// today, 7d, 30d or all
        #[arg(long, default_value = "all")]
        period: HistoryPeriod,
        /// Customer name/phone, transaction id or payment method
        #[arg(long, default_value = "")]
        text: String,
    },

    #[command(subcommand)]
    Customer(CustomerCommand),

    #[command(subcommand)]
    Report(ReportCommand),

    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BarcodeArg {
    All,
    With,
    Without,
}

impl From<BarcodeArg> for BarcodeFilter {
    fn from(arg: BarcodeArg) -> Self {
        match arg {
            BarcodeArg::All => BarcodeFilter::All,
            BarcodeArg::With => BarcodeFilter::WithBarcode,
            BarcodeArg::Without => BarcodeFilter::WithoutBarcode,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum PriceCommand {
    /// Fix a product's sell price
    Set { product: String, price: Money },
    /// Drop the stored price so it is computed again
    Clear { product: String },
    /// Raise or lower MRPs by a percentage
    Bulk {
        /// Signed percent, e.g. 7.5 or -10
        #[arg(long, allow_negative_numbers = true, value_parser = parse_signed_percent_bps)]
        percent: i64,
        /// Only this category (default: every product)
        #[arg(long)]
        category: Option<String>,
        /// Move cost prices too
        #[arg(long)]
        include_cost: bool,
        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Take MRP and cost from a CSV with Product_Name and MRP columns
    Import {
        file: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Add (or with a negative number, remove) units
    Adjust {
        product: String,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
        /// Note for the movement log
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Products at or below the threshold
    Low {
        #[arg(long)]
        threshold: Option<i64>,
    },
    /// Value of stock on hand at cost and at MRP
    Value,
    /// Stock movement log, oldest first
    Movements {
        /// today, 7d, 30d or all
        #[arg(long, default_value = "all")]
        period: HistoryPeriod,
        /// Part of the product name
        #[arg(long, default_value = "")]
        product: String,
        /// Show only the most recent N
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
pub enum BarcodeCommand {
    Assign { product: String, code: String },
    Remove { product: String },
    List {
        #[arg(long, value_enum, default_value_t = BarcodeArg::All)]
        filter: BarcodeArg,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    Add(AddProductArgs),
    /// Remove a product, keeping it in the deleted-products archive
    Remove { product: String },
    /// Bring back an archived product by exact name
    Restore { name: String },
    /// List archived products
    Deleted,
}

#[derive(Debug, Args)]
pub struct AddProductArgs {
    pub name: String,
    #[arg(long)]
    pub cost: Money,
    #[arg(long)]
    pub mrp: Money,
    #[arg(long, default_value_t = 0)]
    pub qty: i64,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub barcode: Option<String>,
    /// Fixed sell price (default: computed from cost and MRP)
    #[arg(long)]
    pub price: Option<Money>,
}

#[derive(Debug, Args)]
pub struct SellArgs {
    /// CODE[:QTY][@PRICE], PRICE being `mrp` or an amount.
    /// e.g. `8906020730601:2`, `7@mrp`, `rice:5@42.50`
    #[arg(required = true)]
    pub items: Vec<ItemSpec>,

    /// Bill discount in percent (up to two decimals)
    #[arg(long, default_value = "0", value_parser = parse_percent_bps)]
    pub discount: u32,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// cash, card, upi, credit
    #[arg(long, default_value = "cash")]
    pub payment: PaymentMethod,

    /// Print a one-line summary instead of the receipt
    #[arg(long)]
    pub no_receipt: bool,
}

/// One `sell` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub code: String,
    pub quantity: i64,
    pub price: PriceChoice,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, price) = match s.rsplit_once('@') {
            Some((rest, p)) if p.trim().eq_ignore_ascii_case("mrp") => (rest, PriceChoice::Mrp),
            Some((rest, p)) => {
                let amount = p
                    .parse::<Money>()
                    .map_err(|e| format!("bad price in '{s}': {e}"))?;
                (rest, PriceChoice::Custom(amount))
            }
            None => (s, PriceChoice::SellPrice),
        };

        let (code, quantity) = match rest.rsplit_once(':') {
            Some((code, q)) => {
                let quantity = q
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("bad quantity in '{s}'"))?;
                (code, quantity)
            }
            None => (rest, 1),
        };

        let code = code.trim();
        if code.is_empty() {
            return Err(format!("no product in '{s}'"));
        }
        Ok(ItemSpec {
            code: code.to_string(),
            quantity,
            price,
        })
    }
}

/// "5" → 500, "2.5" → 250. Percent takes the same two-decimal fixed point
/// as rupee amounts.
fn parse_percent_bps(s: &str) -> Result<u32, String> {
    let fixed = s
        .parse::<Money>()
        .map_err(|_| format!("'{s}' is not a percentage"))?;
    if fixed.is_negative() || fixed.paise() > 10_000 {
        return Err(format!("discount must be between 0 and 100, got {s}"));
    }
    Ok(fixed.paise() as u32)
}

/// "7.5" → 750, "-10" → -1000.
fn parse_signed_percent_bps(s: &str) -> Result<i64, String> {
    s.parse::<Money>()
        .map(|fixed| fixed.paise())
        .map_err(|_| format!("'{s}' is not a percentage"))
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    List {
        #[arg(default_value = "")]
        query: String,
    },
    /// Award extra loyalty points
    Points { customer: String, points: u64 },
    /// Trade points for their rupee value
    Redeem { customer: String, points: u64 },
    /// Recompute totals and visits from the sales ledger
    Rebuild,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Sales summary for one day (default today)
    Daily {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Gross profit by product and month, at current cost prices
    Profit {
        /// today, 7d, 30d or all
        #[arg(long, default_value = "all")]
        period: HistoryPeriod,
    },
    /// Sales between two dates, both included
    Range { from: NaiveDate, to: NaiveDate },
    /// Sell-through and days of stock left per product
    Turnover {
        #[arg(long, default_value_t = 30)]
        days: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_item_spec_forms() {
        let item: ItemSpec = "8906020730601".parse().unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, PriceChoice::SellPrice);

        let item: ItemSpec = "7:3@mrp".parse().unwrap();
        assert_eq!(item.code, "7");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price, PriceChoice::Mrp);

        let item: ItemSpec = "loose rice:5@42.50".parse().unwrap();
        assert_eq!(item.code, "loose rice");
        assert_eq!(item.price, PriceChoice::Custom(Money::from_paise(4250)));

        assert!("7:two".parse::<ItemSpec>().is_err());
        assert!(":2".parse::<ItemSpec>().is_err());
        assert!("7@cheap".parse::<ItemSpec>().is_err());
    }

    #[test]
    fn test_percent_parsing() {
        assert_eq!(parse_percent_bps("5"), Ok(500));
        assert_eq!(parse_percent_bps("2.5"), Ok(250));
        assert!(parse_percent_bps("101").is_err());
        assert!(parse_percent_bps("-1").is_err());

        assert_eq!(parse_signed_percent_bps("-10"), Ok(-1000));
        assert_eq!(parse_signed_percent_bps("7.5"), Ok(750));
        assert!(parse_signed_percent_bps("ten").is_err());
    }

    #[test]
    fn test_parse_sell_command() {
        let cli = Cli::try_parse_from([
            "kirana-till",
            "--data-dir",
            "/srv/shop",
            "sell",
            "1:2",
            "2@mrp",
            "--discount",
            "5",
            "--payment",
            "upi",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/shop")));
        match cli.command {
            Command::Sell(args) => {
                assert_eq!(args.items.len(), 2);
                assert_eq!(args.discount, 500);
                assert_eq!(args.payment, PaymentMethod::Upi);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_negative_stock_adjustment() {
        let cli = Cli::try_parse_from(["kirana-till", "stock", "adjust", "7", "-3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Stock(StockCommand::Adjust { delta: -3, .. })
        ));

        let cli = Cli::try_parse_from(["kirana-till", "price", "bulk", "--percent", "-10"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Price(PriceCommand::Bulk { percent: -1000, include_cost: false, .. })
        ));
    }
}
