use std::env;
use std::fs;
use std::path::Path;

use depot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "storage.path",
        &config.storage.path.display().to_string(),
        source("storage.path", &["DEPOT_STORAGE_PATH"]),
    ));
    lines.push(render_line(
        "storage.load_on_start",
        &config.storage.load_on_start.to_string(),
        source("storage.load_on_start", &["DEPOT_STORAGE_LOAD_ON_START"]),
    ));
    lines.push(render_line(
        "chart.width",
        &config.chart.width.to_string(),
        source("chart.width", &["DEPOT_CHART_WIDTH"]),
    ));
    lines.push(render_line(
        "chart.glyph",
        &config.chart.glyph.to_string(),
        source("chart.glyph", &["DEPOT_CHART_GLYPH"]),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["DEPOT_LOGGING_LEVEL", "DEPOT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["DEPOT_LOGGING_FORMAT", "DEPOT_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, render_line};

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[storage]\npath = \"stock.json\"\n".parse().expect("valid toml");
        assert!(contains_path(&doc, "storage.path"));
        assert!(!contains_path(&doc, "storage.load_on_start"));
        assert!(!contains_path(&doc, "chart.width"));
    }

    #[test]
    fn lines_name_their_source() {
        assert_eq!(
            render_line("chart.width", "40", "default".to_string()),
            "- chart.width = 40 (source: default)"
        );
    }
}
