pub mod chart;
pub mod commands;
pub mod prompt;
pub mod shell;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use depot_core::config::{AppConfig, LogFormat, LoadOptions};
use depot_core::{Catalog, PersistenceError};
use tracing::{warn, Level};

use crate::shell::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "depot",
    about = "Depot inventory ledger CLI",
    long_about = "Track products and on-hand quantities, fulfill orders, and save or load the inventory file.",
    after_help = "Examples:\n  depot\n  depot levels --file inventory.json\n  depot order --file inventory.json --order-id 7 --line 1:5 --line 2:1"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start the interactive menu (default when no command is given)")]
    Shell {
        #[arg(long, help = "Inventory file used as the default for save/load")]
        file: Option<PathBuf>,
    },
    #[command(about = "Print current inventory levels as structured output")]
    Levels {
        #[arg(long, help = "Inventory file to read")]
        file: Option<PathBuf>,
    },
    #[command(about = "Show id, name, price, and quantity of one product")]
    Show {
        #[arg(long, help = "Inventory file to read")]
        file: Option<PathBuf>,
        #[arg(long, help = "Product ID", allow_negative_numbers = true)]
        id: i64,
    },
    #[command(about = "Process an order against the inventory file and save the result")]
    Order {
        #[arg(long, help = "Inventory file to update")]
        file: Option<PathBuf>,
        #[arg(long, help = "Order ID", allow_negative_numbers = true)]
        order_id: i64,
        #[arg(long = "line", value_name = "ID:QTY", help = "Line item; repeat for each product")]
        lines: Vec<String>,
        #[arg(long, help = "Report outcomes without writing the inventory file")]
        dry_run: bool,
    },
    #[command(about = "Render inventory levels as a text bar chart")]
    Chart {
        #[arg(long, help = "Inventory file to read")]
        file: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Shell { file: None }) {
        Command::Shell { file } => return run_shell(file),
        Command::Levels { file } => {
            init_default_logging();
            commands::levels::run(file.as_deref())
        }
        Command::Show { file, id } => {
            init_default_logging();
            commands::show::run(file.as_deref(), id)
        }
        Command::Order { file, order_id, lines, dry_run } => {
            init_default_logging();
            commands::order::run(commands::order::OrderArgs {
                file: file.as_deref(),
                order_id,
                lines: &lines,
                dry_run,
            })
        }
        Command::Chart { file } => {
            init_default_logging();
            commands::chart::run(file.as_deref())
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn run_shell(file: Option<PathBuf>) -> ExitCode {
    let mut options = LoadOptions::default();
    options.overrides.storage_path = file;
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config validation failed: {error}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config);

    let mut catalog = Catalog::new();
    if config.storage.load_on_start {
        match catalog.load(&config.storage.path) {
            Ok(_) => {}
            Err(PersistenceError::SourceNotFound { .. }) => {}
            Err(error) => warn!(
                event_name = "inventory.shell.preload_failed",
                error = %error,
                "could not preload inventory; starting empty"
            ),
        }
    }

    let stdin = io::stdin();
    let mut shell = Shell::new(catalog, &config, stdin.lock(), io::stdout());
    match shell.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("terminal i/o failed: {error}");
            ExitCode::from(1)
        }
    }
}

/// One-shot commands log with the configured format when config is valid,
/// and fall back to defaults otherwise so config errors still surface.
fn init_default_logging() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config);
}

pub fn init_logging(config: &AppConfig) {
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::WARN);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(io::stderr);

    // a subscriber may already be installed when embedded in tests
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
