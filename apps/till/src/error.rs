//! # Till Error Type
//!
//! One error type for every command, printed to the cashier.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Till                               │
//! │                                                                         │
//! │  CoreError ──────┐                                                     │
//! │  StoreError ─────┼──► AppError { code, message } ──► stderr + exit code│
//! │  ConfigError ────┘                                                     │
//! │                                                                         │
//! │  error[NOT_FOUND]: Product not found: 42                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File-level failures are logged with their full cause; the cashier gets a
//! short message naming the file.

use std::fmt;
use std::path::PathBuf;

use kirana_core::{CoreError, ValidationError};
use kirana_store::StoreError;
use thiserror::Error;

// =============================================================================
// Config Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no config location available on this system")]
    NoConfigDir,

    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

// =============================================================================
// App Error
// =============================================================================

/// Error returned by every till command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Product, sale or customer does not exist
    NotFound,

    /// Input rejected before anything changed
    ValidationError,

    /// Catalog row cannot be priced
    InvalidProductData,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Cart rule violated (empty, too many lines)
    CartError,

    /// Customer has fewer points than requested
    InsufficientPoints,

    /// A data file could not be read or written
    StorageError,

    /// Configuration missing or invalid
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidProductData => "INVALID_PRODUCT_DATA",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::InsufficientPoints => "INSUFFICIENT_POINTS",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Process exit status for the code. Bad usage exits 2 from clap itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::StorageError | ErrorCode::ConfigError => 3,
            _ => 1,
        }
    }
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => AppError::not_found("Product", &id),
            CoreError::SaleNotFound(id) => AppError::not_found("Sale", &id),
            CoreError::CustomerNotFound(id) => AppError::not_found("Customer", &id),
            e @ CoreError::InvalidProductData { .. } => {
                AppError::new(ErrorCode::InvalidProductData, e.to_string())
            }
            e @ CoreError::InsufficientStock { .. } => {
                AppError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ CoreError::BarcodeInUse { .. } => AppError::validation(e.to_string()),
            e @ (CoreError::EmptyCart | CoreError::CartTooLarge { .. }) => {
                AppError::new(ErrorCode::CartError, e.to_string())
            }
            e @ CoreError::InsufficientPoints { .. } => {
                AppError::new(ErrorCode::InsufficientPoints, e.to_string())
            }
            CoreError::Validation(e) => AppError::validation(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            StoreError::Core(e) => AppError::from(e),
            e @ StoreError::MissingColumn { .. } => {
                AppError::new(ErrorCode::StorageError, e.to_string())
            }
            other => {
                tracing::error!(error = %other, "Data file operation failed");
                let file = other
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                AppError::new(ErrorCode::StorageError, format!("Could not access {}", file))
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Failure writing command output (closed pipe, full disk).
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::new(ErrorCode::StorageError, format!("cannot write output: {}", err))
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;
