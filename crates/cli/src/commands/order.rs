use std::path::Path;

use depot_core::{ApplicationError, LineOutcome, Order, OrderId};
use serde_json::{json, Value};

use crate::commands::{load_catalog, load_config, CommandResult};
use crate::prompt;

pub struct OrderArgs<'a> {
    pub file: Option<&'a Path>,
    pub order_id: i64,
    pub lines: &'a [String],
    pub dry_run: bool,
}

/// Applies an order to the stored inventory and writes the result back
/// unless `dry_run` is set.
pub fn run(args: OrderArgs<'_>) -> CommandResult {
    match process(args) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error("order", &error),
    }
}

fn process(args: OrderArgs<'_>) -> Result<CommandResult, ApplicationError> {
    let line_items =
        args.lines.iter().map(|raw| prompt::parse_line_item(raw)).collect::<Result<Vec<_>, _>>()?;

    let config = load_config(args.file)?;
    let mut catalog = load_catalog(&config)?;
    let order_id = OrderId(args.order_id);
    let report = Order::new(order_id, line_items).process(&mut catalog);

    if !args.dry_run {
        catalog.save(&config.storage.path)?;
    }

    let lines: Vec<Value> = report
        .lines
        .iter()
        .map(|line| match line {
            LineOutcome::Fulfilled { product_id, quantity } => json!({
                "product_id": product_id.0,
                "quantity": quantity,
                "status": "fulfilled",
            }),
            LineOutcome::Skipped { product_id, quantity, reason } => json!({
                "product_id": product_id.0,
                "quantity": quantity,
                "status": "skipped",
                "reason": ApplicationError::from(reason.clone()).error_class(),
                "detail": reason.to_string(),
            }),
        })
        .collect();

    let message = format!(
        "processed order {order_id}: {} fulfilled, {} skipped{}",
        report.fulfilled_count(),
        report.skipped_count(),
        if args.dry_run { " (dry run, inventory not saved)" } else { "" }
    );
    Ok(CommandResult::success_with_data(
        "order",
        message,
        Some(json!({ "order_id": order_id.0, "lines": lines })),
    ))
}
