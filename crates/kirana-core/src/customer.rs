//! # Customer Book
//!
//! Regular customers keyed by phone number, with purchase totals and loyalty
//! points.
//!
//! ## Loyalty
//! ```text
//!   every visit (checkout) ─► +1 point
//!   redeem n points        ─► n × point value off   (default 10 paise/point)
//! ```
//!
//! Customers without a phone number are keyed by name.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{self, Money};
use crate::types::{CustomerRef, Sale};
use crate::validation::validate_phone;

/// Default worth of one loyalty point, in paise.
pub const DEFAULT_POINT_VALUE_PAISE: i64 = 10;

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(with = "money::rupees", default)]
    pub total_purchases: Money,
    #[serde(with = "lenient_date", default)]
    pub last_visit: Option<NaiveDate>,
    #[serde(default)]
    pub loyalty_points: u64,
    #[serde(
        with = "lenient_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<NaiveDate>,
}

impl Customer {
    /// Rupee value of the customer's points.
    pub fn points_value(&self, point_value: Money) -> Money {
        point_value.multiply_quantity(self.loyalty_points as i64)
    }
}

/// Dates as `YYYY-MM-DD`; blank or unreadable values load as `None`.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
    }
}

// =============================================================================
// Customer Book
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerBook {
    customers: BTreeMap<String, Customer>,
}

impl CustomerBook {
    pub fn new() -> Self {
        CustomerBook::default()
    }

    /// The book key for a customer: trimmed phone, or trimmed name if no phone.
    pub fn key_for(name: &str, phone: &str) -> String {
        let phone = phone.trim();
        if phone.is_empty() {
            name.trim().to_string()
        } else {
            phone.to_string()
        }
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Customer)> {
        self.customers.iter()
    }

    pub fn get(&self, key: &str) -> CoreResult<&Customer> {
        self.customers
            .get(key.trim())
            .ok_or_else(|| CoreError::CustomerNotFound(key.trim().to_string()))
    }

    fn get_mut(&mut self, key: &str) -> CoreResult<&mut Customer> {
        self.customers
            .get_mut(key.trim())
            .ok_or_else(|| CoreError::CustomerNotFound(key.trim().to_string()))
    }

    /// Registers a new customer. Fails if the key is already taken.
    pub fn register(
        &mut self,
        name: &str,
        phone: &str,
        email: &str,
        today: NaiveDate,
    ) -> CoreResult<&Customer> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "customer name".to_string(),
            }
            .into());
        }
        if !phone.is_empty() {
            validate_phone(phone)?;
        }

        let key = Self::key_for(name, phone);
        if self.customers.contains_key(&key) {
            return Err(ValidationError::Duplicate {
                field: "customer".to_string(),
                value: key,
            }
            .into());
        }

        info!(customer = %key, "Registered customer");
        let customer = self.customers.entry(key).or_insert(Customer {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.trim().to_string(),
            total_purchases: Money::zero(),
            last_visit: None,
            loyalty_points: 0,
            registration_date: Some(today),
        });
        Ok(customer)
    }

    /// Changes a customer's name and/or email.
    pub fn update(
        &mut self,
        key: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> CoreResult<&Customer> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "customer name".to_string(),
                }
                .into());
            }
        }
        let customer = self.get_mut(key)?;
        if let Some(name) = name {
            customer.name = name.trim().to_string();
        }
        if let Some(email) = email {
            customer.email = email.trim().to_string();
        }
        Ok(customer)
    }

    pub fn remove(&mut self, key: &str) -> CoreResult<Customer> {
        self.customers
            .remove(key.trim())
            .ok_or_else(|| CoreError::CustomerNotFound(key.trim().to_string()))
    }

    /// Records a visit: upserts the customer, adds the amount, awards one point.
    pub fn record_purchase(
        &mut self,
        who: &CustomerRef,
        amount: Money,
        date: NaiveDate,
    ) -> &Customer {
        let key = Self::key_for(&who.name, &who.phone);
        let customer = self.customers.entry(key).or_insert_with(|| Customer {
            name: who.name.trim().to_string(),
            phone: who.phone.trim().to_string(),
            email: String::new(),
            total_purchases: Money::zero(),
            last_visit: None,
            loyalty_points: 0,
            registration_date: Some(date),
        });

        if !who.name.trim().is_empty() {
            customer.name = who.name.trim().to_string();
        }
        customer.total_purchases += amount;
        customer.loyalty_points += 1;
        customer.last_visit = customer.last_visit.max(Some(date));
        debug!(
            customer = %customer.phone,
            amount = %amount,
            points = customer.loyalty_points,
            "Recorded purchase"
        );
        customer
    }

    pub fn add_points(&mut self, key: &str, points: u64) -> CoreResult<u64> {
        let customer = self.get_mut(key)?;
        customer.loyalty_points += points;
        Ok(customer.loyalty_points)
    }

    /// Redeems points and returns their rupee value.
    pub fn redeem_points(&mut self, key: &str, points: u64, point_value: Money) -> CoreResult<Money> {
        let customer = self.get_mut(key)?;
        if points == 0 || points > customer.loyalty_points {
            return Err(CoreError::InsufficientPoints {
                available: customer.loyalty_points,
                requested: points,
            });
        }
        customer.loyalty_points -= points;
        let value = point_value.multiply_quantity(points as i64);
        info!(customer = %key, points, value = %value, "Redeemed loyalty points");
        Ok(value)
    }

    /// Case-insensitive substring match on name or phone.
    pub fn search(&self, query: &str) -> Vec<&Customer> {
        let needle = query.trim().to_lowercase();
        self.customers
            .values()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.phone.contains(&needle)
            })
            .collect()
    }

    /// Rebuilds the book from the sales ledger.
    ///
    /// One visit per transaction. Sales without a customer phone are skipped.
    /// Emails and registration dates already on file are kept.
    pub fn rebuild_from_sales(&self, sales: &[Sale]) -> CustomerBook {
        let mut rebuilt = CustomerBook::new();
        for sale in sales {
            let Some(who) = sale.customer.as_ref().filter(|c| !c.phone.trim().is_empty()) else {
                continue;
            };
            rebuilt.record_purchase(who, sale.total(), sale.timestamp.date());
        }

        for (key, customer) in rebuilt.customers.iter_mut() {
            if let Some(old) = self.customers.get(key) {
                customer.email = old.email.clone();
                if old.registration_date.is_some() {
                    customer.registration_date = old.registration_date;
                }
            }
        }
        info!(customers = rebuilt.len(), sales = sales.len(), "Rebuilt customer book");
        rebuilt
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, SaleLine};
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn who(name: &str, phone: &str) -> CustomerRef {
        CustomerRef {
            name: name.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn test_register_and_duplicate() {
        let mut book = CustomerBook::new();
        book.register("Ramesh", "9911148114", "", day(1)).unwrap();
        let err = book.register("Ramesh K", "9911148114", "", day(2)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
        assert!(book.register("", "9555269666", "", day(1)).is_err());
        assert!(book.register("Bad", "12ab", "", day(1)).is_err());
    }

    #[test]
    fn test_name_is_key_without_phone() {
        let mut book = CustomerBook::new();
        book.register("Walk In Aunty", "", "", day(1)).unwrap();
        assert!(book.get("Walk In Aunty").is_ok());
    }

    #[test]
    fn test_record_purchase_upserts_and_awards_point() {
        let mut book = CustomerBook::new();
        book.record_purchase(&who("Ramesh", "9911148114"), Money::from_rupees(100), day(3));
        let c = book.record_purchase(&who("Ramesh K", "9911148114"), Money::from_rupees(50), day(2));
        assert_eq!(c.name, "Ramesh K");
        assert_eq!(c.total_purchases, Money::from_rupees(150));
        assert_eq!(c.loyalty_points, 2);
        assert_eq!(c.last_visit, Some(day(3)));
    }

    #[test]
    fn test_points() {
        let mut book = CustomerBook::new();
        book.register("Ramesh", "9911148114", "", day(1)).unwrap();
        assert_eq!(book.add_points("9911148114", 30).unwrap(), 30);

        let value = book
            .redeem_points("9911148114", 25, Money::from_paise(DEFAULT_POINT_VALUE_PAISE))
            .unwrap();
        assert_eq!(value, Money::from_paise(250));
        assert_eq!(book.get("9911148114").unwrap().loyalty_points, 5);

        let err = book.redeem_points("9911148114", 6, Money::from_paise(10)).unwrap_err();
        assert_eq!(err, CoreError::InsufficientPoints { available: 5, requested: 6 });
        assert!(book.add_points("000", 1).is_err());
    }

    #[test]
    fn test_search() {
        let mut book = CustomerBook::new();
        book.register("Ramesh", "9911148114", "", day(1)).unwrap();
        book.register("Suresh", "9555269666", "", day(1)).unwrap();
        assert_eq!(book.search("ESH").len(), 2);
        assert_eq!(book.search("9555").len(), 1);
        assert_eq!(book.search("").len(), 2);
    }

    #[test]
    fn test_json_compatible_with_existing_file() {
        let json = r#"{
            "9911148114": {
                "name": "Ramesh",
                "phone": "9911148114",
                "email": "",
                "total_purchases": 264.0,
                "last_visit": "2025-08-14",
                "loyalty_points": 3
            },
            "Guest": { "name": "Guest", "last_visit": "" }
        }"#;
        let book: CustomerBook = serde_json::from_str(json).unwrap();
        let c = book.get("9911148114").unwrap();
        assert_eq!(c.total_purchases, Money::from_rupees(264));
        assert_eq!(c.last_visit, Some(day(14)));
        assert_eq!(book.get("Guest").unwrap().last_visit, None);
    }

    #[test]
    fn test_rebuild_from_sales() {
        let sale = |phone: &str, d: u32, paise: i64| Sale {
            id: Uuid::nil(),
            transaction_id: format!("TXN{d}"),
            timestamp: day(d).and_hms_opt(10, 0, 0).unwrap(),
            customer: Some(who("Ramesh", phone)),
            payment_method: PaymentMethod::Cash,
            lines: vec![SaleLine {
                product_id: None,
                product_name: "Tea".to_string(),
                quantity: 1,
                unit_price: Money::from_paise(paise),
                mrp: None,
            }],
            discount_bps: 0,
        };

        let mut old = CustomerBook::new();
        old.register("Ramesh", "9911148114", "r@example.com", day(1)).unwrap();

        let sales = vec![sale("9911148114", 5, 1000), sale("9911148114", 7, 500), sale("", 7, 99)];
        let book = old.rebuild_from_sales(&sales);
        assert_eq!(book.len(), 1);
        let c = book.get("9911148114").unwrap();
        assert_eq!(c.total_purchases, Money::from_rupees(15));
        assert_eq!(c.loyalty_points, 2);
        assert_eq!(c.email, "r@example.com");
        assert_eq!(c.registration_date, Some(day(1)));
        assert_eq!(c.last_visit, Some(day(7)));
    }
}
