//! JSON snapshot format for a [`Catalog`].
//!
//! The document is an object keyed by the decimal product id:
//!
//! ```json
//! {"1": {"product": {"product_id": 1, "name": "Widget", "price": 2.50}, "quantity": 4}}
//! ```
//!
//! Prices are written as JSON numbers carrying the exact decimal text, so a
//! save/load cycle never rounds them through `f64`.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::domain::product::{Product, ProductId};
use crate::errors::PersistenceError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveSummary {
    pub path: PathBuf,
    pub entries: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    pub path: PathBuf,
    pub entries: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    product: PersistedProduct,
    quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedProduct {
    product_id: i64,
    name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    price: Decimal,
}

pub fn to_json(catalog: &Catalog) -> Result<String, PersistenceError> {
    let document: BTreeMap<String, PersistedEntry> = catalog
        .entries()
        .map(|entry| {
            (
                entry.product.id.to_string(),
                PersistedEntry {
                    product: PersistedProduct {
                        product_id: entry.product.id.0,
                        name: entry.product.name.clone(),
                        price: entry.product.price,
                    },
                    quantity: entry.quantity,
                },
            )
        })
        .collect();

    serde_json::to_string(&document).map_err(PersistenceError::Encode)
}

pub fn from_json(raw: &str) -> Result<Catalog, PersistenceError> {
    let document: BTreeMap<String, PersistedEntry> =
        serde_json::from_str(raw).map_err(PersistenceError::Parse)?;

    let mut entries = BTreeMap::new();
    for (key, record) in document {
        let product_id = key.parse::<i64>().map(ProductId).map_err(|_| {
            PersistenceError::InvalidRecord {
                key: key.clone(),
                reason: "key is not an integer product id".to_string(),
            }
        })?;

        if record.product.product_id != product_id.0 {
            return Err(PersistenceError::InvalidRecord {
                key,
                reason: format!(
                    "product_id {} does not match its key",
                    record.product.product_id
                ),
            });
        }
        if record.product.price < Decimal::ZERO {
            return Err(PersistenceError::InvalidRecord {
                key,
                reason: format!("price {} is negative", record.product.price),
            });
        }

        // "01" and "1" parse to the same id
        if entries.contains_key(&product_id) {
            return Err(PersistenceError::InvalidRecord {
                key,
                reason: format!("duplicate entry for product id {product_id}"),
            });
        }

        entries.insert(
            product_id,
            CatalogEntry {
                product: Product::new(product_id, record.product.name, record.product.price),
                quantity: record.quantity,
            },
        );
    }

    Ok(Catalog::from_entries(entries))
}

pub fn save_to_path(catalog: &Catalog, path: &Path) -> Result<SaveSummary, PersistenceError> {
    let raw = to_json(catalog)?;
    fs::write(path, raw)
        .map_err(|source| PersistenceError::Write { path: path.to_path_buf(), source })?;

    info!(
        event_name = "inventory.persistence.saved",
        path = %path.display(),
        entries = catalog.len(),
        "inventory saved"
    );
    Ok(SaveSummary { path: path.to_path_buf(), entries: catalog.len() })
}

pub fn load_from_path(path: &Path) -> Result<(Catalog, LoadSummary), PersistenceError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            warn!(
                event_name = "inventory.persistence.source_not_found",
                path = %path.display(),
                "inventory source not found; keeping current inventory"
            );
            PersistenceError::SourceNotFound { path: path.to_path_buf() }
        } else {
            PersistenceError::Read { path: path.to_path_buf(), source }
        }
    })?;

    let catalog = from_json(&raw)?;
    info!(
        event_name = "inventory.persistence.loaded",
        path = %path.display(),
        entries = catalog.len(),
        "inventory loaded"
    );
    let summary = LoadSummary { path: path.to_path_buf(), entries: catalog.len() };
    Ok((catalog, summary))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde_json::Value;
    use tempfile::TempDir;

    use crate::catalog::Catalog;
    use crate::domain::product::{Product, ProductId};
    use crate::errors::PersistenceError;
    use crate::persistence::{from_json, to_json};

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        for (id, name, price, quantity) in [
            (1, "Widget", Decimal::new(250, 2), 4),
            (12, "Gadget \"XL\"", Decimal::new(1999, 2), 30),
            (3, "Free sample", Decimal::ZERO, 1),
        ] {
            catalog.add_product(Product::new(ProductId(id), name, price), quantity).expect("add");
        }
        catalog
    }

    #[test]
    fn document_uses_string_keys_and_numeric_price() {
        let raw = to_json(&sample_catalog()).expect("encode");
        let value: Value = serde_json::from_str(&raw).expect("valid json");

        let entry = &value["12"];
        assert_eq!(entry["product"]["product_id"], 12);
        assert_eq!(entry["product"]["name"], "Gadget \"XL\"");
        assert_eq!(entry["product"]["price"].as_f64(), Some(19.99));
        assert_eq!(entry["quantity"], 30);
    }

    #[test]
    fn save_then_load_preserves_every_field() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("inventory.json");
        let original = sample_catalog();

        let saved = original.save(&path).map_err(|err| err.to_string())?;
        assert_eq!(saved.entries, 3);

        let mut restored = Catalog::new();
        let loaded = restored.load(&path).map_err(|err| err.to_string())?;

        assert_eq!(loaded.entries, 3);
        assert_eq!(restored, original);
        Ok(())
    }

    #[test]
    fn high_precision_prices_survive_a_round_trip() {
        let precise = Decimal::from_str("0.1234567890123456789").expect("decimal");
        let large = Decimal::from_str("12345678901234567.89").expect("decimal");
        let mut catalog = Catalog::new();
        catalog.add_product(Product::new(ProductId(1), "Resistor", precise), 1).expect("add");
        catalog.add_product(Product::new(ProductId(2), "Turbine", large), 1).expect("add");

        let raw = to_json(&catalog).expect("encode");
        assert!(raw.contains("\"price\":0.1234567890123456789"));
        assert!(raw.contains("\"price\":12345678901234567.89"));

        let restored = from_json(&raw).expect("decode");
        assert_eq!(restored.search_product(ProductId(1)).expect("resistor").price, precise);
        assert_eq!(restored.search_product(ProductId(2)).expect("turbine").price, large);
    }

    #[test]
    fn save_overwrites_existing_file() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("inventory.json");
        fs::write(&path, "stale contents that are much longer than the new document")
            .map_err(|err| err.to_string())?;

        Catalog::new().save(&path).map_err(|err| err.to_string())?;

        assert_eq!(fs::read_to_string(&path).map_err(|err| err.to_string())?, "{}");
        Ok(())
    }

    #[test]
    fn missing_source_keeps_existing_entries() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let mut catalog = sample_catalog();
        let before = catalog.clone();

        let error = catalog.load(&dir.path().join("absent.json")).expect_err("missing file");

        assert!(matches!(error, PersistenceError::SourceNotFound { .. }));
        assert_eq!(catalog, before);
        Ok(())
    }

    #[test]
    fn malformed_document_keeps_existing_entries() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"1\": {\"product\": ").map_err(|err| err.to_string())?;
        let mut catalog = sample_catalog();
        let before = catalog.clone();

        let error = catalog.load(&path).expect_err("malformed file");

        assert!(matches!(error, PersistenceError::Parse(_)));
        assert_eq!(catalog, before);
        Ok(())
    }

    #[test]
    fn load_replaces_rather_than_merges() {
        let raw = r#"{"5": {"product": {"product_id": 5, "name": "Bolt", "price": 0.1}, "quantity": 100}}"#;
        let catalog = from_json(raw).expect("decode");

        assert_eq!(catalog.len(), 1);
        let bolt = catalog.search_product(ProductId(5)).expect("bolt");
        assert_eq!(bolt.price, Decimal::new(1, 1));
        assert_eq!(catalog.quantity_of(ProductId(5)), Some(100));
    }

    #[test]
    fn integer_prices_are_accepted() {
        let raw = r#"{"2": {"product": {"product_id": 2, "name": "Crate", "price": 40}, "quantity": 1}}"#;
        let catalog = from_json(raw).expect("decode");
        assert_eq!(catalog.search_product(ProductId(2)).expect("crate").price, Decimal::new(40, 0));
    }

    #[test]
    fn rejects_non_integer_keys() {
        let raw = r#"{"abc": {"product": {"product_id": 1, "name": "x", "price": 1.0}, "quantity": 1}}"#;
        assert!(matches!(
            from_json(raw),
            Err(PersistenceError::InvalidRecord { ref key, .. }) if key == "abc"
        ));
    }

    #[test]
    fn rejects_product_id_that_disagrees_with_key() {
        let raw = r#"{"1": {"product": {"product_id": 2, "name": "x", "price": 1.0}, "quantity": 1}}"#;
        assert!(matches!(from_json(raw), Err(PersistenceError::InvalidRecord { .. })));
    }

    #[test]
    fn rejects_negative_prices() {
        let raw = r#"{"1": {"product": {"product_id": 1, "name": "x", "price": -1.5}, "quantity": 1}}"#;
        assert!(matches!(from_json(raw), Err(PersistenceError::InvalidRecord { .. })));
    }
}
