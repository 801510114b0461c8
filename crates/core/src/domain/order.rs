use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::domain::product::ProductId;
use crate::errors::CatalogError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// A stock withdrawal request. Line items are applied in the order given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    order_id: OrderId,
    line_items: Vec<LineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Fulfilled { product_id: ProductId, quantity: i64 },
    Skipped { product_id: ProductId, quantity: i64, reason: CatalogError },
}

impl LineOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FulfillmentReport {
    pub order_id: OrderId,
    pub lines: Vec<LineOutcome>,
}

impl FulfillmentReport {
    pub fn fulfilled_count(&self) -> usize {
        self.lines.iter().filter(|line| line.is_fulfilled()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.lines.len() - self.fulfilled_count()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped_count() == 0
    }
}

impl Order {
    pub fn new(order_id: OrderId, line_items: Vec<LineItem>) -> Self {
        Self { order_id, line_items }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Applies each line item independently against `catalog`.
    ///
    /// A line that names an unknown product or asks for more than is on hand
    /// is skipped; later lines still run and earlier ones are not undone.
    pub fn process(self, catalog: &mut Catalog) -> FulfillmentReport {
        let order_id = self.order_id;
        let mut lines = Vec::with_capacity(self.line_items.len());

        for LineItem { product_id, quantity } in self.line_items {
            let outcome = match catalog.quantity_of(product_id) {
                None => {
                    warn!(
                        event_name = "inventory.order.line_skipped",
                        order_id = order_id.0,
                        product_id = product_id.0,
                        reason = "invalid_product_id",
                        "skipping line item for unknown product"
                    );
                    LineOutcome::Skipped {
                        product_id,
                        quantity,
                        reason: CatalogError::NotFound { product_id },
                    }
                }
                Some(available) if available < quantity => {
                    warn!(
                        event_name = "inventory.order.line_skipped",
                        order_id = order_id.0,
                        product_id = product_id.0,
                        available,
                        requested = quantity,
                        reason = "insufficient_stock",
                        "skipping line item with insufficient stock"
                    );
                    LineOutcome::Skipped {
                        product_id,
                        quantity,
                        reason: CatalogError::InsufficientStock {
                            product_id,
                            available,
                            requested: quantity,
                        },
                    }
                }
                Some(_) => match catalog.remove_product(product_id, quantity) {
                    Ok(_) => LineOutcome::Fulfilled { product_id, quantity },
                    Err(reason) => LineOutcome::Skipped { product_id, quantity, reason },
                },
            };
            lines.push(outcome);
        }

        let report = FulfillmentReport { order_id, lines };
        info!(
            event_name = "inventory.order.processed",
            order_id = order_id.0,
            fulfilled = report.fulfilled_count(),
            skipped = report.skipped_count(),
            "order processed"
        );
        report
    }
}
