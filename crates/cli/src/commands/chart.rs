use std::path::Path;

use depot_core::ApplicationError;

use crate::chart::render_bar_chart;
use crate::commands::{load_catalog, load_config, CommandResult};

/// Prints the chart as plain text; failures still use the JSON envelope.
pub fn run(file: Option<&Path>) -> CommandResult {
    match chart(file) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::from_error("chart", &error),
    }
}

fn chart(file: Option<&Path>) -> Result<String, ApplicationError> {
    let config = load_config(file)?;
    let catalog = load_catalog(&config)?;
    Ok(render_bar_chart(&catalog.get_inventory_levels(), &config.chart))
}
