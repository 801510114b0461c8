//! Inventory ledger: a product catalog with on-hand quantities, best-effort
//! order fulfillment, and a JSON snapshot format.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod persistence;

pub use catalog::{Catalog, CatalogEntry, InventoryLevels, ProductDetails};
pub use domain::order::{FulfillmentReport, LineItem, LineOutcome, Order, OrderId};
pub use domain::product::{Product, ProductId, ProductUpdate};
pub use errors::{ApplicationError, CatalogError, PersistenceError};
pub use persistence::{LoadSummary, SaveSummary};
