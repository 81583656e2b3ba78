//! # Error Types
//!
//! Domain-specific error types for kirana-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kirana-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule / data errors                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kirana-store errors (separate crate)                                  │
//! │  └── StoreError       - File read/write failures                       │
//! │                                                                         │
//! │  Till errors (in app)                                                  │
//! │  └── AppError         - What the cashier sees                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → AppError → stderr    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A product row cannot be priced because a required field is missing,
    /// non-numeric or negative.
    ///
    /// Reported per row. Batch repricing collects these instead of stopping.
    #[error("Invalid product data for {product_id}: {field} {reason}")]
    InvalidProductData {
        product_id: String,
        field: String,
        reason: String,
    },

    /// No product with this id / name / code.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Selling or adjusting would take stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// sell 12:5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Savour Mix 200g", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The barcode already belongs to a different product.
    #[error("Barcode {barcode} is already assigned to {owner}")]
    BarcodeInUse { barcode: String, owner: String },

    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// No customer under this key.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Redeeming more loyalty points than the customer holds.
    #[error("Insufficient loyalty points: available {available}, requested {requested}")]
    InsufficientPoints { available: u64, requested: u64 },

    /// No sale with this transaction id.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidProductData`].
    pub fn invalid_data(
        product_id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidProductData {
            product_id: product_id.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. a barcode with spaces, a bad amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. product name, customer phone).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
