//! File round trips against a temporary data directory.

use std::fs;

use chrono::NaiveDate;
use kirana_core::cart::{Cart, CheckoutRequest, PriceChoice};
use kirana_core::money::Money;
use kirana_core::pricing::PricingEngine;
use kirana_core::{CustomerRef, PaymentMethod};
use kirana_store::{Store, StoreConfig, StoreError};

const SHEET: &str = "\
Sr_No,Product_Name,Cost_Price,MRP,SP_5_Percent,Quantity,Supplier
1,Savour Mix 200g,80,100,95,24,Haldiram
2,Cherry Liquid 135ml,50,99,94.05,6,Cherry Blossom
3,Loose Rice,,,,40,
";

fn store_with_sheet(sheet: &str) -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("inventory_master.csv"), sheet).unwrap();
    let store = Store::new(StoreConfig::new(dir.path()));
    (dir, store)
}

fn read_sheet(store: &Store) -> String {
    fs::read_to_string(store.catalog().path()).unwrap()
}

#[test]
fn test_reprice_keeps_unknown_columns_and_appends_sell_price() {
    let (_dir, store) = store_with_sheet(SHEET);
    let file = store.catalog();

    let mut loaded = file.load().unwrap();
    let report = loaded.catalog.resolve_prices(&PricingEngine::default());
    assert_eq!(report.total, 3);
    assert_eq!(report.recomputed, 2);
    assert_eq!(report.failures.len(), 1);
    file.save(&loaded.catalog, &loaded.layout).unwrap();

    let text = read_sheet(&store);
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Sr_No,Product_Name,Cost_Price,MRP,SP_5_Percent,Quantity,Supplier,Sell_Price")
    );
    assert_eq!(
        lines.next(),
        Some("1,Savour Mix 200g,80.00,100.00,95,24,Haldiram,88.00")
    );
    assert_eq!(
        lines.next(),
        Some("2,Cherry Liquid 135ml,50.00,99.00,94.05,6,Cherry Blossom,70.00")
    );
    assert_eq!(lines.next(), Some("3,Loose Rice,,,,40,,"));

    // The previous sheet is kept as a backup.
    let bak = fs::read_to_string(file.path().with_file_name("inventory_master.csv.bak")).unwrap();
    assert_eq!(bak, SHEET);
}

#[test]
fn test_second_reprice_changes_nothing() {
    let (_dir, store) = store_with_sheet(SHEET);
    let file = store.catalog();
    let engine = PricingEngine::default();

    let mut loaded = file.load().unwrap();
    loaded.catalog.resolve_prices(&engine);
    file.save(&loaded.catalog, &loaded.layout).unwrap();
    let first = read_sheet(&store);

    let mut loaded = file.load().unwrap();
    let report = loaded.catalog.resolve_prices(&engine);
    assert_eq!(report.recomputed, 0);
    assert!(!report.is_dirty());
    file.save(&loaded.catalog, &loaded.layout).unwrap();
    assert_eq!(read_sheet(&store), first);
}

#[test]
fn test_sheet_without_id_column_gets_row_numbers() {
    let (_dir, store) = store_with_sheet("Product_Name,Quantity\nTea,5\nSugar,3\n");
    let loaded = store.catalog().load().unwrap();
    let ids: Vec<&str> = loaded.catalog.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn test_repeated_id_renumbered_above_whole_sheet() {
    let (_dir, store) =
        store_with_sheet("Sr_No,Product_Name,Quantity\n5,Tea,1\n5,Sugar,2\n6,Salt,3\n");
    let loaded = store.catalog().load().unwrap();
    let ids: Vec<(&str, &str)> = loaded
        .catalog
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();
    assert_eq!(ids, vec![("5", "Tea"), ("7", "Sugar"), ("6", "Salt")]);
}

#[test]
fn test_sheet_without_name_column_is_rejected() {
    let (_dir, store) = store_with_sheet("Sr_No,Quantity\n1,5\n");
    let err = store.catalog().load().unwrap_err();
    assert!(matches!(err, StoreError::MissingColumn { ref column, .. } if column == "Product_Name"));
}

#[test]
fn test_missing_sheet_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(StoreConfig::new(dir.path()));
    assert!(store.catalog().load().unwrap().catalog.is_empty());
    assert!(store.ledger().load_all().unwrap().is_empty());
}

#[test]
fn test_checkout_appends_to_ledger() {
    let (_dir, store) = store_with_sheet(SHEET);
    let engine = PricingEngine::default();
    let mut loaded = store.catalog().load().unwrap();

    let mut cart = Cart::new();
    cart.add_item(&loaded.catalog, &engine, "1", 2, PriceChoice::SellPrice)
        .unwrap();
    cart.add_item(&loaded.catalog, &engine, "2", 1, PriceChoice::Mrp)
        .unwrap();
    cart.set_discount_bps(500).unwrap();

    let timestamp = NaiveDate::from_ymd_opt(2025, 8, 14)
        .unwrap()
        .and_hms_opt(12, 34, 56)
        .unwrap();
    let sale = cart
        .checkout(
            &mut loaded.catalog,
            CheckoutRequest {
                customer: Some(CustomerRef {
                    name: "Ramesh".to_string(),
                    phone: "9876543210".to_string(),
                }),
                payment_method: PaymentMethod::Upi,
                timestamp,
            },
        )
        .unwrap();
    assert_eq!(sale.transaction_id, "TXN20250814123456");

    let ledger = store.ledger();
    ledger.append(&sale).unwrap();
    store
        .catalog()
        .save(&loaded.catalog, &loaded.layout)
        .unwrap();

    let reloaded = store.catalog().load().unwrap();
    assert_eq!(reloaded.catalog.get("1").unwrap().stock_qty, 22);
    assert_eq!(reloaded.catalog.get("2").unwrap().stock_qty, 5);

    let read_back = ledger.find("TXN20250814123456").unwrap();
    assert_eq!(read_back, sale);
    // 2 × 88 + 99 = 275, less 5%
    assert_eq!(read_back.total(), Money::from_paise(26125));
}

#[test]
fn test_old_ledger_without_snapshot_columns() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("sales_transactions.csv");
    fs::write(
        &ledger_path,
        "Transaction_ID,Date,Time,Customer_Name,Customer_Phone,Product_Name,Quantity_Sold,Unit_Price,Total_Amount,Payment_Method,Discount,Final_Amount\n\
         TXN20250801100000,2025-08-01,10:00:00,None,,Tea,2,40.0,80.0,Cash,0,80.0\n\
         TXN20250801100000,2025-08-01,10:00:00,None,,Sugar,1,45.0,45.0,Cash,0,45.0",
    )
    .unwrap();
    let store = Store::new(StoreConfig::new(dir.path()));
    let ledger = store.ledger();

    let sales = ledger.load_all().unwrap();
    assert_eq!(sales.len(), 1);
    let sale = &sales[0];
    assert!(sale.id.is_nil());
    assert!(sale.customer.is_none());
    assert_eq!(sale.lines.len(), 2);
    assert_eq!(sale.lines[0].mrp, None);
    assert_eq!(sale.total(), Money::from_rupees(125));

    // Appending keeps the file's own columns.
    let mut next = sale.clone();
    next.transaction_id = "TXN20250802100000".to_string();
    ledger.append(&next).unwrap();
    let text = fs::read_to_string(&ledger_path).unwrap();
    assert!(text.starts_with("Transaction_ID,Date,Time,"));
    assert!(!text.contains("Sale_Id"));
    assert_eq!(ledger.load_all().unwrap().len(), 2);
}

#[test]
fn test_remove_and_restore_through_archive() {
    let (_dir, store) = store_with_sheet(SHEET);
    let mut loaded = store.catalog().load().unwrap();
    let removed = loaded.catalog.remove_product("2").unwrap();

    let when = NaiveDate::from_ymd_opt(2025, 8, 14)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    store
        .archive()
        .archive(&removed, &loaded.layout, when)
        .unwrap();
    store
        .catalog()
        .save(&loaded.catalog, &loaded.layout)
        .unwrap();
    assert!(!read_sheet(&store).contains("Cherry Liquid"));

    let listed = store.archive().list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.product_data["Supplier"], "Cherry Blossom");

    let mut loaded = store.catalog().load().unwrap();
    let restored = store
        .archive()
        .restore("Cherry Liquid 135ml", &mut loaded)
        .unwrap();
    assert_eq!(restored.id, "2");
    store
        .catalog()
        .save(&loaded.catalog, &loaded.layout)
        .unwrap();

    assert!(read_sheet(&store).contains("2,Cherry Liquid 135ml,50.00,99.00,94.05,6,Cherry Blossom"));
    assert!(store.archive().list().unwrap().is_empty());

    let err = store
        .archive()
        .restore("Cherry Liquid 135ml", &mut loaded)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}
