pub mod chart;
pub mod config;
pub mod levels;
pub mod order;
pub mod show;

use std::path::Path;

use depot_core::config::{AppConfig, LoadOptions};
use depot_core::{ApplicationError, Catalog};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Resolves the effective config, honoring an explicit `--file` over `storage.path`.
pub(crate) fn load_config(file: Option<&Path>) -> Result<AppConfig, ApplicationError> {
    let mut options = LoadOptions::default();
    options.overrides.storage_path = file.map(Path::to_path_buf);
    Ok(AppConfig::load(options)?)
}

pub(crate) fn load_catalog(config: &AppConfig) -> Result<Catalog, ApplicationError> {
    let mut catalog = Catalog::new();
    catalog.load(&config.storage.path)?;
    Ok(catalog)
}
