use std::path::Path;

use depot_core::ApplicationError;
use serde_json::{Map, Value};

use crate::commands::{load_catalog, load_config, CommandResult};

pub fn run(file: Option<&Path>) -> CommandResult {
    match levels(file) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error("levels", &error),
    }
}

fn levels(file: Option<&Path>) -> Result<CommandResult, ApplicationError> {
    let config = load_config(file)?;
    let catalog = load_catalog(&config)?;
    let levels = catalog.get_inventory_levels();

    let data: Map<String, Value> =
        levels.iter().map(|(id, quantity)| (id.to_string(), Value::from(*quantity))).collect();
    // widened so per-product quantities near the i64 limits still add up
    let total: i128 = levels.values().map(|quantity| i128::from(*quantity)).sum();

    Ok(CommandResult::success_with_data(
        "levels",
        format!("{} products, {total} units on hand", levels.len()),
        Some(Value::Object(data)),
    ))
}
