use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self { id, name: name.into(), price }
    }
}

/// Field-wise edit applied by [`Catalog::update_product`](crate::catalog::Catalog::update_product).
///
/// `None` leaves the field as it is. `Some` overwrites it, including with an
/// empty name or a zero price.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

impl ProductUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}
