//! # Search Filter
//!
//! Case-insensitive substring search over product name and barcode, plus the
//! scanner lookup used at the till.
//!
//! ```text
//!   query ──► lowercase ──► for each product (in catalog order):
//!                             lowercase(name)    contains query? ──┐
//!                             lowercase(barcode) contains query? ──┴─► keep
//! ```
//!
//! The query is not trimmed: `" mix"` only matches names with a space before
//! "mix". An empty query keeps everything.

use crate::types::Product;

// =============================================================================
// Substring Search
// =============================================================================

/// Returns the products whose name or barcode contains `query`, ignoring
/// case, in their original order.
///
/// ```rust
/// use kirana_core::Product;
/// use kirana_core::search::search;
///
/// let mut savour = Product::new("1", "Savour Mix 200g");
/// savour.barcode = Some("8906020730601".to_string());
/// let catalog = vec![savour, Product::new("2", "Cherry Liquid")];
///
/// assert_eq!(search(&catalog, "SAVOUR").len(), 1);
/// assert_eq!(search(&catalog, "89060207")[0].id, "1");
/// assert_eq!(search(&catalog, "").len(), 2);
/// ```
pub fn search<'a>(catalog: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|p| matches_folded(p, &needle))
        .collect()
}

/// Whether one product matches `query` under the search rule.
pub fn matches(product: &Product, query: &str) -> bool {
    matches_folded(product, &query.to_lowercase())
}

fn matches_folded(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    product.name.to_lowercase().contains(needle)
        || product
            .barcode
            .as_deref()
            .is_some_and(|code| code.to_lowercase().contains(needle))
}

// =============================================================================
// Scanner Lookup
// =============================================================================

/// Finds the product for a scanned or typed code.
///
/// Order: exact barcode, then exact id (`Sr_No`), then the first product
/// whose name contains the code (case-insensitive).
pub fn find_by_scan<'a>(catalog: &'a [Product], code: &str) -> Option<&'a Product> {
    let code = normalize_barcode(code)?;

    catalog
        .iter()
        .find(|p| p.barcode.as_deref() == Some(code.as_str()))
        .or_else(|| catalog.iter().find(|p| p.id == code))
        .or_else(|| {
            let needle = code.to_lowercase();
            catalog
                .iter()
                .find(|p| p.name.to_lowercase().contains(&needle))
        })
}

/// Cleans a barcode cell or scanner input.
///
/// Spreadsheets turn long numeric codes into floats, so `"8906020730601.0"`
/// becomes `"8906020730601"`. Empty cells and `nan`/`none`/`null` give `None`.
///
/// ```rust
/// use kirana_core::search::normalize_barcode;
///
/// assert_eq!(normalize_barcode(" 8906020730601.0 ").as_deref(), Some("8906020730601"));
/// assert_eq!(normalize_barcode("nan"), None);
/// ```
pub fn normalize_barcode(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "nan" | "none" | "null"
    ) {
        return None;
    }

    let cleaned = match trimmed.strip_suffix(".0") {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => digits,
        _ => trimmed,
    };
    Some(cleaned.to_string())
}

// =============================================================================
// Barcode Filter
// =============================================================================

/// Narrows a listing by barcode presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarcodeFilter {
    #[default]
    All,
    WithBarcode,
    WithoutBarcode,
}

impl BarcodeFilter {
    pub fn accepts(&self, product: &Product) -> bool {
        match self {
            BarcodeFilter::All => true,
            BarcodeFilter::WithBarcode => product.has_barcode(),
            BarcodeFilter::WithoutBarcode => !product.has_barcode(),
        }
    }

    /// Applies the filter, keeping order.
    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
        products.into_iter().filter(|p| self.accepts(p)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Vec<Product> {
        let mut savour = Product::new("1", "Savour Mix 200g");
        savour.barcode = Some("8906020730601".to_string());
        let cherry = Product::new("2", "Cherry Liquid 135ml");
        let mut savoury = Product::new("3", "Bikaji SAVOURY Bhujia");
        savoury.barcode = Some("ABC-77".to_string());
        vec![savour, cherry, savoury]
    }

    fn ids(found: &[&Product]) -> Vec<String> {
        found.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let c = catalog();
        assert_eq!(ids(&search(&c, "")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_case_insensitive() {
        let c = catalog();
        assert_eq!(ids(&search(&c, "savour")), vec!["1", "3"]);
        assert_eq!(search(&c, "savour"), search(&c, "SAVOUR"));
    }

    #[test]
    fn test_barcode_substring() {
        let c = catalog();
        assert_eq!(ids(&search(&c, "89060207")), vec!["1"]);
        assert_eq!(ids(&search(&c, "abc-7")), vec!["3"]);
    }

    #[test]
    fn test_product_without_barcode_only_matches_by_name() {
        let c = catalog();
        assert!(search(&c, "890").iter().all(|p| p.id != "2"));
        assert_eq!(ids(&search(&c, "liquid")), vec!["2"]);
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let c = catalog();
        assert_eq!(ids(&search(&c, " mix")), vec!["1"]);
        assert!(search(&c, "mix ").is_empty());
    }

    #[test]
    fn test_find_by_scan_priority() {
        let mut c = catalog();
        // a product whose id collides with another's barcode text
        c.push(Product::new("8906020730601", "Odd Row"));

        assert_eq!(find_by_scan(&c, "8906020730601").unwrap().id, "1");
        assert_eq!(find_by_scan(&c, "2").unwrap().id, "2");
        assert_eq!(find_by_scan(&c, "bhujia").unwrap().id, "3");
        assert_eq!(find_by_scan(&c, " 8906020730601.0 ").unwrap().id, "1");
        assert!(find_by_scan(&c, "nothing-like-this").is_none());
        assert!(find_by_scan(&c, "   ").is_none());
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("8906020730601.0").as_deref(), Some("8906020730601"));
        assert_eq!(normalize_barcode("ABC.0").as_deref(), Some("ABC.0"));
        assert_eq!(normalize_barcode(""), None);
        assert_eq!(normalize_barcode("NaN"), None);
        assert_eq!(normalize_barcode("None"), None);
    }

    #[test]
    fn test_barcode_filter() {
        let c = catalog();
        assert_eq!(ids(&BarcodeFilter::WithBarcode.apply(&c)), vec!["1", "3"]);
        assert_eq!(ids(&BarcodeFilter::WithoutBarcode.apply(&c)), vec!["2"]);
        assert_eq!(BarcodeFilter::All.apply(&c).len(), 3);
    }

    proptest! {
        #[test]
        fn prop_case_folding_is_irrelevant(query in "[a-zA-Z0-9 ]{0,6}") {
            let c = catalog();
            prop_assert_eq!(
                search(&c, &query.to_uppercase()),
                search(&c, &query.to_lowercase())
            );
        }

        #[test]
        fn prop_results_are_an_ordered_subsequence(query in "[a-z0-9]{0,3}") {
            let c = catalog();
            let found = search(&c, &query);
            let positions: Vec<usize> = found
                .iter()
                .map(|f| c.iter().position(|p| p.id == f.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(found.iter().all(|p| matches(p, &query)));
        }
    }
}
