//! # Receipt Formatter
//!
//! Fixed-width text receipts for 3-inch thermal printers.
//!
//! ```text
//!              BAUJI TRADERS
//!           CONFECTIONERY STORE
//! ------------------------------------------
//! TXN ID: TXN20250814123456
//! Date: 2025-08-14          Time: 12:34:56
//! Customer: Ramesh (9911148114)
//! Payment: UPI
//! ------------------------------------------
//! Item             Q    MRP  D%    Rate      Tot
//! Savour Mix 200g
//!                  2 100.00  12   88.00   176.00
//! ------------------------------------------
//! TOTAL:                           Rs.176.00
//! You saved Rs.24.00 today!
//! ```
//!
//! Text only; sending it to a printer is the caller's business. Amounts use
//! "Rs." because most thermal fonts lack the rupee sign.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Sale, SaleLine};

/// Narrowest supported paper, in characters.
pub const MIN_RECEIPT_WIDTH: usize = 32;
pub const DEFAULT_RECEIPT_WIDTH: usize = 42;

/// Width of the numeric columns: Q(4) MRP(7) D%(4) Rate(8) Tot(9).
const NUMERIC_COLUMNS: usize = 32;

/// Shop details printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopHeader {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
}

impl Default for ShopHeader {
    fn default() -> Self {
        ShopHeader {
            name: "BAUJI TRADERS".to_string(),
            tagline: "CONFECTIONERY STORE".to_string(),
            address_lines: vec!["1690 30FT ROAD,".to_string(), "JAWAHAR COLONY".to_string()],
            phones: vec!["9911148114".to_string(), "9555269666".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFormatter {
    header: ShopHeader,
    width: usize,
}

impl Default for ReceiptFormatter {
    fn default() -> Self {
        ReceiptFormatter::new(ShopHeader::default(), DEFAULT_RECEIPT_WIDTH)
    }
}

impl ReceiptFormatter {
    /// Widths below [`MIN_RECEIPT_WIDTH`] are raised to it.
    pub fn new(header: ShopHeader, width: usize) -> Self {
        ReceiptFormatter {
            header,
            width: width.max(MIN_RECEIPT_WIDTH),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn format(&self, sale: &Sale) -> String {
        let mut out: Vec<String> = Vec::new();
        let rule = "-".repeat(self.width);

        // header
        out.push(self.center(&self.header.name));
        if !self.header.tagline.is_empty() {
            out.push(self.center(&self.header.tagline));
        }
        out.push(rule.clone());
        for (i, line) in self.header.address_lines.iter().enumerate() {
            let label = if i == 0 { "Address: " } else { "         " };
            out.push(self.clip(&format!("{label}{line}")));
        }
        if !self.header.phones.is_empty() {
            out.push(self.clip(&format!("Phone: {}", self.header.phones.join(", "))));
        }
        out.push(String::new());

        // transaction block
        out.push(format!("TXN ID: {}", sale.transaction_id));
        out.push(self.spread(
            &format!("Date: {}", sale.timestamp.format("%Y-%m-%d")),
            &format!("Time: {}", sale.timestamp.format("%H:%M:%S")),
        ));
        if let Some(customer) = &sale.customer {
            if !customer.name.trim().is_empty() {
                out.push(self.clip(&format!("Customer: {}", customer.name.trim())));
            }
            if !customer.phone.trim().is_empty() {
                out.push(format!("Phone: {}", customer.phone.trim()));
            }
        }
        out.push(format!("Payment: {}", sale.payment_method));
        out.push(rule.clone());

        // items
        let name_width = self.width - NUMERIC_COLUMNS;
        let item_label = if name_width < 4 {
            out.push("Item".to_string());
            ""
        } else {
            "Item"
        };
        out.push(format!(
            "{:<name_width$}{:>4}{:>7}{:>4}{:>8}{:>9}",
            item_label, "Q", "MRP", "D%", "Rate", "Tot",
        ));
        out.push(rule.clone());
        for line in &sale.lines {
            out.push(self.clip(&line.product_name));
            out.push(self.item_row(line));
        }
        out.push(rule.clone());

        // totals
        if sale.discount_bps > 0 {
            out.push(self.spread("SUBTOTAL:", &rs(sale.subtotal())));
            out.push(self.spread(
                &format!("DISCOUNT ({}):", percent(sale.discount_bps)),
                &format!("-{}", rs(sale.discount_amount())),
            ));
        }
        out.push(self.spread("TOTAL:", &rs(sale.total())));
        out.push(rule.clone());

        let savings = sale.savings();
        if savings.is_positive() {
            out.push(self.center(&format!("You saved {} today!", rs(savings))));
            out.push(rule);
        }

        out.push(String::new());
        out.push(self.center("Thank you for shopping!"));
        out.push(self.center("Visit again soon!"));

        let mut text = out.join("\n");
        // paper feed before the cut
        text.push_str("\n\n\n\n");
        text
    }

    fn item_row(&self, line: &SaleLine) -> String {
        let mrp = line.mrp.filter(Money::is_positive).unwrap_or(line.unit_price);
        format!(
            "{:>indent$}{:>4}{:>7}{:>4}{:>8}{:>9}",
            "",
            line.quantity,
            mrp.to_decimal_string(),
            discount_percent(mrp, line.unit_price),
            line.unit_price.to_decimal_string(),
            line.line_total().to_decimal_string(),
            indent = self.width - NUMERIC_COLUMNS
        )
    }

    fn center(&self, text: &str) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return self.clip(text);
        }
        format!("{}{}", " ".repeat((self.width - len) / 2), text)
    }

    /// Left text, right text, padded to the full width.
    fn spread(&self, left: &str, right: &str) -> String {
        let used = left.chars().count() + right.chars().count();
        let gap = self.width.saturating_sub(used).max(1);
        format!("{left}{}{right}", " ".repeat(gap))
    }

    fn clip(&self, text: &str) -> String {
        text.chars().take(self.width).collect()
    }
}

fn rs(amount: Money) -> String {
    format!("Rs.{}", amount.to_decimal_string())
}

/// Whole-percent discount off MRP, truncated. Zero when sold at or above MRP.
fn discount_percent(mrp: Money, rate: Money) -> i64 {
    if !mrp.is_positive() || rate >= mrp {
        return 0;
    }
    (mrp - rate).paise() * 100 / mrp.paise()
}

fn percent(bps: u32) -> String {
    if bps % 100 == 0 {
        format!("{}%", bps / 100)
    } else {
        format!("{}.{:02}%", bps / 100, bps % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
