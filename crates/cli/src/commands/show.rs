use std::path::Path;

use depot_core::{ApplicationError, ProductId};
use serde_json::json;

use crate::commands::{load_catalog, load_config, CommandResult};

pub fn run(file: Option<&Path>, product_id: i64) -> CommandResult {
    match show(file, ProductId(product_id)) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error("show", &error),
    }
}

fn show(file: Option<&Path>, product_id: ProductId) -> Result<CommandResult, ApplicationError> {
    let config = load_config(file)?;
    let catalog = load_catalog(&config)?;
    let details = catalog.view_product_details(product_id)?;

    let data = json!({
        "product_id": details.id.0,
        "name": details.name,
        "price": details.price.to_string(),
        "quantity": details.quantity,
    });
    Ok(CommandResult::success_with_data("show", details.to_string(), Some(data)))
}
