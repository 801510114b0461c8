//! Parsing of operator-entered values. Every field is parsed before any
//! catalog call so a bad value never leaves a half-applied change behind.

use std::str::FromStr;

use depot_core::{ApplicationError, LineItem, ProductId};
use rust_decimal::Decimal;

pub fn parse_product_id(raw: &str) -> Result<ProductId, ApplicationError> {
    parse_integer("product ID", raw).map(ProductId)
}

pub fn parse_quantity(raw: &str) -> Result<i64, ApplicationError> {
    parse_integer("quantity", raw)
}

/// Upper bound on the line count an operator may announce for one order.
pub const MAX_ORDER_LINES: usize = 10_000;

/// Parses the announced number of order lines, capped at [`MAX_ORDER_LINES`].
pub fn parse_line_count(raw: &str) -> Result<usize, ApplicationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<usize>() {
        Ok(count) if count <= MAX_ORDER_LINES => Ok(count),
        _ => Err(ApplicationError::invalid_input("number of products", trimmed)),
    }
}

pub fn parse_integer(field: &str, raw: &str) -> Result<i64, ApplicationError> {
    raw.trim().parse::<i64>().map_err(|_| ApplicationError::invalid_input(field, raw.trim()))
}

pub fn parse_price(raw: &str) -> Result<Decimal, ApplicationError> {
    let trimmed = raw.trim();
    let price = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| ApplicationError::invalid_input("price", trimmed))?;
    if price < Decimal::ZERO {
        return Err(ApplicationError::invalid_input("price", trimmed));
    }
    Ok(price)
}

/// Blank input means "keep the current price".
pub fn parse_optional_price(raw: &str) -> Result<Option<Decimal>, ApplicationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_price(raw).map(Some)
}

/// Blank input means "keep the current name".
pub fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parses a `PRODUCT_ID:QUANTITY` line item.
pub fn parse_line_item(raw: &str) -> Result<LineItem, ApplicationError> {
    let Some((id, quantity)) = raw.split_once(':') else {
        return Err(ApplicationError::invalid_input("line item", raw.trim()));
    };
    Ok(LineItem::new(parse_product_id(id)?, parse_quantity(quantity)?))
}
