use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product ID {product_id} not found")]
    NotFound { product_id: ProductId },
    #[error(
        "insufficient quantity for product ID {product_id}: available {available}, requested {requested}"
    )]
    InsufficientStock { product_id: ProductId, available: i64, requested: i64 },
    #[error(
        "quantity for product ID {product_id} would overflow: on hand {available}, change {delta}"
    )]
    QuantityOverflow { product_id: ProductId, available: i64, delta: i64 },
}

impl CatalogError {
    pub fn product_id(&self) -> ProductId {
        match self {
            Self::NotFound { product_id }
            | Self::InsufficientStock { product_id, .. }
            | Self::QuantityOverflow { product_id, .. } => *product_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("inventory source `{path}` was not found")]
    SourceNotFound { path: PathBuf },
    #[error("could not read inventory file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write inventory file `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not parse inventory data: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("could not encode inventory data: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid inventory record `{key}`: {reason}")]
    InvalidRecord { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid input for {field}: `{value}`")]
    InvalidInput { field: String, value: String },
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ApplicationError {
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), value: value.into() }
    }

    /// Stable machine-readable class used in command output envelopes.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Catalog(CatalogError::NotFound { .. }) => "not_found",
            Self::Catalog(CatalogError::InsufficientStock { .. }) => "insufficient_stock",
            Self::Catalog(CatalogError::QuantityOverflow { .. }) => "quantity_overflow",
            Self::Persistence(PersistenceError::SourceNotFound { .. }) => "source_not_found",
            Self::Persistence(_) => "persistence",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Catalog(CatalogError::NotFound { .. }) => {
                "The product does not exist. Check the product ID and try again."
            }
            Self::Catalog(CatalogError::InsufficientStock { .. }) => {
                "Not enough stock is on hand for this request."
            }
            Self::Catalog(CatalogError::QuantityOverflow { .. }) => {
                "The resulting quantity is out of range. Nothing was changed."
            }
            Self::Persistence(PersistenceError::SourceNotFound { .. }) => {
                "The inventory file was not found. The current inventory was kept."
            }
            Self::Persistence(_) => "The inventory file could not be read or written.",
            Self::InvalidInput { .. } => {
                "Invalid input. Please enter numeric values for IDs, prices, and quantities."
            }
            Self::Configuration(_) => "The configuration is invalid.",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::InvalidInput { .. } => 3,
            Self::Catalog(_) => 4,
            Self::Persistence(_) => 5,
        }
    }
}
