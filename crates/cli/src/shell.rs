use std::fmt::Write as _;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::PathBuf;
use std::str::FromStr;

use depot_core::config::AppConfig;
use depot_core::{
    ApplicationError, Catalog, InventoryLevels, LineOutcome, Order, OrderId, PersistenceError,
    Product, ProductUpdate,
};
use thiserror::Error;
use tracing::debug;

use crate::chart::render_bar_chart;
use crate::prompt;

const MENU: &str = "\
Warehouse Management System
1. Add Product
2. Create Order
3. View Inventory Levels
4. Visualize Inventory
5. Update Product
6. Search Product
7. View Product Details
8. Save Inventory
9. Load Inventory
10. Exit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    AddProduct,
    CreateOrder,
    ViewLevels,
    Visualize,
    UpdateProduct,
    SearchProduct,
    ViewDetails,
    Save,
    Load,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "1" => Ok(Self::AddProduct),
            "2" => Ok(Self::CreateOrder),
            "3" => Ok(Self::ViewLevels),
            "4" => Ok(Self::Visualize),
            "5" => Ok(Self::UpdateProduct),
            "6" => Ok(Self::SearchProduct),
            "7" => Ok(Self::ViewDetails),
            "8" => Ok(Self::Save),
            "9" => Ok(Self::Load),
            "10" => Ok(Self::Exit),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

impl From<depot_core::CatalogError> for StepError {
    fn from(error: depot_core::CatalogError) -> Self {
        Self::Application(error.into())
    }
}

impl From<PersistenceError> for StepError {
    fn from(error: PersistenceError) -> Self {
        Self::Application(error.into())
    }
}

/// Interactive menu session. The session owns the catalog for its lifetime.
pub struct Shell<'a, R, W> {
    catalog: Catalog,
    config: &'a AppConfig,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(catalog: Catalog, config: &'a AppConfig, input: R, output: W) -> Self {
        Self { catalog, config, input, output }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Runs the menu loop until the operator exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "\n{MENU}")?;
            let choice = match self.ask("Enter your choice: ") {
                Ok(choice) => choice,
                Err(error) if error.kind() == ErrorKind::UnexpectedEof => break,
                Err(error) => return Err(error),
            };

            let Ok(choice) = choice.parse::<MenuChoice>() else {
                writeln!(self.output, "Error: Invalid choice. Please try again.")?;
                continue;
            };
            if choice == MenuChoice::Exit {
                break;
            }

            match self.dispatch(choice) {
                Ok(()) => {}
                Err(StepError::Application(error)) => self.report(&error)?,
                Err(StepError::Io(error)) if error.kind() == ErrorKind::UnexpectedEof => break,
                Err(StepError::Io(error)) => return Err(error),
            }
        }

        writeln!(self.output, "Exiting the system. Goodbye!")?;
        self.output.flush()
    }

    fn dispatch(&mut self, choice: MenuChoice) -> Result<(), StepError> {
        debug!(event_name = "inventory.shell.command", ?choice, "menu command selected");
        match choice {
            MenuChoice::AddProduct => self.add_product(),
            MenuChoice::CreateOrder => self.create_order(),
            MenuChoice::ViewLevels => self.view_levels(),
            MenuChoice::Visualize => self.visualize(),
            MenuChoice::UpdateProduct => self.update_product(),
            MenuChoice::SearchProduct => self.search_product(),
            MenuChoice::ViewDetails => self.view_details(),
            MenuChoice::Save => self.save(),
            MenuChoice::Load => self.load(),
            MenuChoice::Exit => Ok(()),
        }
    }

    fn add_product(&mut self) -> Result<(), StepError> {
        let product_id = prompt::parse_product_id(&self.ask("Enter product ID: ")?)?;
        let name = self.ask("Enter product name: ")?.trim().to_string();
        let price = prompt::parse_price(&self.ask("Enter product price: ")?)?;
        let quantity = prompt::parse_quantity(&self.ask("Enter quantity: ")?)?;

        let total = self.catalog.add_product(Product::new(product_id, name, price), quantity)?;
        let stored_name = self.catalog.search_product(product_id)?.name.clone();
        writeln!(
            self.output,
            "Added {quantity} of {stored_name} (product ID {product_id}). On hand: {total}."
        )?;
        Ok(())
    }

    fn create_order(&mut self) -> Result<(), StepError> {
        let order_id = OrderId(prompt::parse_integer("order ID", &self.ask("Enter order ID: ")?)?);
        let count =
            prompt::parse_line_count(&self.ask("Enter number of products in the order: ")?)?;

        let mut line_items = Vec::new();
        for _ in 0..count {
            let product_id = prompt::parse_product_id(&self.ask("Enter product ID: ")?)?;
            let quantity = prompt::parse_quantity(&self.ask("Enter quantity: ")?)?;
            line_items.push(depot_core::LineItem::new(product_id, quantity));
        }

        let report = Order::new(order_id, line_items).process(&mut self.catalog);
        for line in &report.lines {
            match line {
                LineOutcome::Fulfilled { product_id, quantity } => writeln!(
                    self.output,
                    "Processed {quantity} of product ID {product_id} for order {order_id}."
                )?,
                LineOutcome::Skipped { reason, .. } => {
                    writeln!(self.output, "Error: {reason}. Skipping this product.")?
                }
            }
        }
        writeln!(
            self.output,
            "Processed order {order_id}: {} fulfilled, {} skipped.",
            report.fulfilled_count(),
            report.skipped_count()
        )?;
        Ok(())
    }

    fn view_levels(&mut self) -> Result<(), StepError> {
        let levels = self.catalog.get_inventory_levels();
        writeln!(self.output, "Current Inventory Levels: {}", format_levels(&levels))?;
        Ok(())
    }

    fn visualize(&mut self) -> Result<(), StepError> {
        let chart = render_bar_chart(&self.catalog.get_inventory_levels(), &self.config.chart);
        writeln!(self.output, "{chart}")?;
        Ok(())
    }

    fn update_product(&mut self) -> Result<(), StepError> {
        let product_id = prompt::parse_product_id(&self.ask("Enter product ID to update: ")?)?;
        let name = prompt::optional_text(
            &self.ask("Enter new product name (leave blank to keep current): ")?,
        );
        let price = prompt::parse_optional_price(
            &self.ask("Enter new product price (leave blank to keep current): ")?,
        )?;

        self.catalog.update_product(product_id, ProductUpdate { name, price })?;
        writeln!(self.output, "Product {product_id} updated.")?;
        Ok(())
    }

    fn search_product(&mut self) -> Result<(), StepError> {
        let product_id = prompt::parse_product_id(&self.ask("Enter product ID to search: ")?)?;
        let product = self.catalog.search_product(product_id)?;
        writeln!(
            self.output,
            "Product found: ID={}, Name={}, Price={}",
            product.id, product.name, product.price
        )?;
        Ok(())
    }

    fn view_details(&mut self) -> Result<(), StepError> {
        let product_id =
            prompt::parse_product_id(&self.ask("Enter product ID to view details: ")?)?;
        let details = self.catalog.view_product_details(product_id)?;
        writeln!(self.output, "{details}")?;
        Ok(())
    }

    fn save(&mut self) -> Result<(), StepError> {
        let path = self.ask_path("Enter filename to save inventory")?;
        let summary = self.catalog.save(&path)?;
        writeln!(
            self.output,
            "Inventory saved to {} ({} products).",
            summary.path.display(),
            summary.entries
        )?;
        Ok(())
    }

    fn load(&mut self) -> Result<(), StepError> {
        let path = self.ask_path("Enter filename to load inventory")?;
        let summary = self.catalog.load(&path)?;
        writeln!(
            self.output,
            "Inventory loaded from {} ({} products).",
            summary.path.display(),
            summary.entries
        )?;
        Ok(())
    }

    fn ask_path(&mut self, label: &str) -> io::Result<PathBuf> {
        let default = self.config.storage.path.clone();
        let raw = self.ask(&format!("{label} [{}]: ", default.display()))?;
        Ok(prompt::optional_text(&raw).map(PathBuf::from).unwrap_or(default))
    }

    fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn report(&mut self, error: &ApplicationError) -> io::Result<()> {
        match error {
            ApplicationError::Persistence(PersistenceError::SourceNotFound { path }) => writeln!(
                self.output,
                "Error: File `{}` not found. Keeping the current inventory.",
                path.display()
            ),
            ApplicationError::InvalidInput { .. } => {
                writeln!(self.output, "Error: {error}. {}", error.user_message())
            }
            _ => writeln!(self.output, "Error: {error}."),
        }
    }
}

/// Renders a levels snapshot as `{id: quantity, ...}` in id order.
pub fn format_levels(levels: &InventoryLevels) -> String {
    let mut rendered = String::from("{");
    for (index, (product_id, quantity)) in levels.iter().enumerate() {
        if index > 0 {
            rendered.push_str(", ");
        }
        let _ = write!(rendered, "{product_id}: {quantity}");
    }
    rendered.push('}');
    rendered
}

#[cfg(test)]
mod tests {
    use depot_core::{InventoryLevels, ProductId};

    use super::{format_levels, MenuChoice};

    #[test]
    fn menu_choices_parse_from_numbers() {
        assert_eq!("1".parse::<MenuChoice>(), Ok(MenuChoice::AddProduct));
        assert_eq!(" 10 ".parse::<MenuChoice>(), Ok(MenuChoice::Exit));
        assert!("11".parse::<MenuChoice>().is_err());
        assert!("add".parse::<MenuChoice>().is_err());
    }

    #[test]
    fn levels_render_in_id_order() {
        let levels: InventoryLevels = [(ProductId(3), 1), (ProductId(1), 9)].into_iter().collect();
        assert_eq!(format_levels(&levels), "{1: 9, 3: 1}");
        assert_eq!(format_levels(&InventoryLevels::new()), "{}");
    }
}
