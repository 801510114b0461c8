use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::product::{Product, ProductId, ProductUpdate};
use crate::errors::{CatalogError, PersistenceError};
use crate::persistence::{self, LoadSummary, SaveSummary};

/// Quantity snapshot keyed by product id.
pub type InventoryLevels = BTreeMap<ProductId, i64>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub product: Product,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductDetails {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl fmt::Display for ProductDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product ID: {}, Name: {}, Price: {}, Quantity: {}",
            self.id, self.name, self.price, self.quantity
        )
    }
}

/// Authoritative mapping of product id to product and on-hand quantity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<ProductId, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: BTreeMap<ProductId, CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entries.contains_key(&product_id)
    }

    pub fn quantity_of(&self, product_id: ProductId) -> Option<i64> {
        self.entries.get(&product_id).map(|entry| entry.quantity)
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Adds stock for `product`, returning the resulting quantity.
    ///
    /// When the id is already stocked only the quantity changes: the stored
    /// name and price are kept and the ones on `product` are dropped. The
    /// quantity is not validated, so zero and negative amounts pass through.
    /// A sum outside the `i64` range is rejected and nothing changes.
    pub fn add_product(&mut self, product: Product, quantity: i64) -> Result<i64, CatalogError> {
        let product_id = product.id;
        let total = match self.entries.get_mut(&product_id) {
            Some(entry) => {
                let Some(total) = entry.quantity.checked_add(quantity) else {
                    warn!(
                        event_name = "inventory.catalog.add_rejected",
                        product_id = product_id.0,
                        added = quantity,
                        available = entry.quantity,
                        reason = "quantity_overflow",
                        "stock addition rejected"
                    );
                    return Err(CatalogError::QuantityOverflow {
                        product_id,
                        available: entry.quantity,
                        delta: quantity,
                    });
                };
                if entry.product.name != product.name || entry.product.price != product.price {
                    debug!(
                        event_name = "inventory.catalog.merge_discarded_fields",
                        product_id = product_id.0,
                        kept_name = %entry.product.name,
                        discarded_name = %product.name,
                        "existing product details kept on merge"
                    );
                }
                entry.quantity = total;
                total
            }
            None => {
                self.entries.insert(product_id, CatalogEntry { product, quantity });
                quantity
            }
        };

        info!(
            event_name = "inventory.catalog.product_added",
            product_id = product_id.0,
            added = quantity,
            quantity = total,
            "stock added"
        );
        Ok(total)
    }

    /// Removes `quantity` units, returning what is left on hand.
    ///
    /// Either the whole amount is removed or nothing changes. An entry that
    /// drops to exactly zero is deleted.
    pub fn remove_product(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<i64, CatalogError> {
        let Some(entry) = self.entries.get_mut(&product_id) else {
            warn!(
                event_name = "inventory.catalog.remove_rejected",
                product_id = product_id.0,
                requested = quantity,
                reason = "not_found",
                "stock removal rejected"
            );
            return Err(CatalogError::NotFound { product_id });
        };

        if entry.quantity < quantity {
            warn!(
                event_name = "inventory.catalog.remove_rejected",
                product_id = product_id.0,
                requested = quantity,
                available = entry.quantity,
                reason = "insufficient_stock",
                "stock removal rejected"
            );
            return Err(CatalogError::InsufficientStock {
                product_id,
                available: entry.quantity,
                requested: quantity,
            });
        }

        // a large negative request can push the balance past the top of the range
        let Some(remaining) = entry.quantity.checked_sub(quantity) else {
            warn!(
                event_name = "inventory.catalog.remove_rejected",
                product_id = product_id.0,
                requested = quantity,
                available = entry.quantity,
                reason = "quantity_overflow",
                "stock removal rejected"
            );
            return Err(CatalogError::QuantityOverflow {
                product_id,
                available: entry.quantity,
                delta: quantity,
            });
        };
        entry.quantity = remaining;
        if remaining == 0 {
            self.entries.remove(&product_id);
        }

        info!(
            event_name = "inventory.catalog.product_removed",
            product_id = product_id.0,
            removed = quantity,
            quantity = remaining,
            "stock removed"
        );
        Ok(remaining)
    }

    pub fn update_product(
        &mut self,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> Result<(), CatalogError> {
        let Some(entry) = self.entries.get_mut(&product_id) else {
            warn!(
                event_name = "inventory.catalog.update_rejected",
                product_id = product_id.0,
                "product update rejected: not found"
            );
            return Err(CatalogError::NotFound { product_id });
        };

        let name_changed = update.name.is_some();
        let price_changed = update.price.is_some();
        if let Some(name) = update.name {
            entry.product.name = name;
        }
        if let Some(price) = update.price {
            entry.product.price = price;
        }

        info!(
            event_name = "inventory.catalog.product_updated",
            product_id = product_id.0,
            name_changed,
            price_changed,
            "product updated"
        );
        Ok(())
    }

    pub fn search_product(&self, product_id: ProductId) -> Result<&Product, CatalogError> {
        self.entries.get(&product_id).map(|entry| &entry.product).ok_or_else(|| {
            debug!(
                event_name = "inventory.catalog.lookup_missed",
                product_id = product_id.0,
                "product lookup missed"
            );
            CatalogError::NotFound { product_id }
        })
    }

    pub fn view_product_details(
        &self,
        product_id: ProductId,
    ) -> Result<ProductDetails, CatalogError> {
        let entry =
            self.entries.get(&product_id).ok_or(CatalogError::NotFound { product_id })?;
        Ok(ProductDetails {
            id: entry.product.id,
            name: entry.product.name.clone(),
            price: entry.product.price,
            quantity: entry.quantity,
        })
    }

    pub fn get_inventory_levels(&self) -> InventoryLevels {
        self.entries.iter().map(|(id, entry)| (*id, entry.quantity)).collect()
    }

    /// Writes every entry to `destination`, replacing whatever was there.
    pub fn save(&self, destination: &Path) -> Result<SaveSummary, PersistenceError> {
        persistence::save_to_path(self, destination)
    }

    /// Replaces the whole catalog with the contents of `source`.
    ///
    /// The file is fully parsed and validated before anything is replaced, so
    /// on any error (including a missing file) the current entries are kept.
    pub fn load(&mut self, source: &Path) -> Result<LoadSummary, PersistenceError> {
        let (loaded, summary) = persistence::load_from_path(source)?;
        *self = loaded;
        Ok(summary)
    }
}
