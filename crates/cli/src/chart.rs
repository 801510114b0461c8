use depot_core::config::ChartConfig;
use depot_core::InventoryLevels;

pub const CHART_TITLE: &str = "Inventory Levels";

/// Renders a horizontal bar chart of a levels snapshot, one row per product id.
///
/// Bars are scaled so the largest quantity spans `config.width` glyphs. Any
/// positive quantity gets at least one glyph; zero or negative ones get none.
pub fn render_bar_chart(levels: &InventoryLevels, config: &ChartConfig) -> String {
    let mut lines = vec![CHART_TITLE.to_string()];
    if levels.is_empty() {
        lines.push("(no products in stock)".to_string());
        return lines.join("\n");
    }

    let max_quantity = levels.values().copied().max().unwrap_or(0).max(1);
    let id_width = levels.keys().map(|id| id.to_string().len()).max().unwrap_or(1);
    let label = "Product ID";
    let id_width = id_width.max(label.len());

    lines.push(format!("{label:>id_width$} | Quantity"));
    for (product_id, quantity) in levels {
        let bar_len = bar_length(*quantity, max_quantity, config.width);
        let bar: String = std::iter::repeat(config.glyph).take(bar_len).collect();
        let id = product_id.to_string();
        if bar.is_empty() {
            lines.push(format!("{id:>id_width$} | {quantity}"));
        } else {
            lines.push(format!("{id:>id_width$} | {bar} {quantity}"));
        }
    }

    lines.join("\n")
}

fn bar_length(quantity: i64, max_quantity: i64, width: usize) -> usize {
    if quantity <= 0 {
        return 0;
    }
    let scaled = (quantity as u128 * width as u128) / max_quantity as u128;
    (scaled as usize).max(1)
}
