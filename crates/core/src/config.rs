use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["depot.toml", "config/depot.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub chart: ChartConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub load_on_start: bool,
}

#[derive(Clone, Debug)]
pub struct ChartConfig {
    pub width: usize,
    pub glyph: char,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub storage_path: Option<PathBuf>,
    pub load_on_start: Option<bool>,
    pub chart_width: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig { path: PathBuf::from("inventory.json"), load_on_start: false },
            chart: ChartConfig { width: 40, glyph: '#' },
            logging: LoggingConfig { level: "warn".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(storage) = patch.storage {
            if let Some(path) = storage.path {
                self.storage.path = path;
            }
            if let Some(load_on_start) = storage.load_on_start {
                self.storage.load_on_start = load_on_start;
            }
        }

        if let Some(chart) = patch.chart {
            if let Some(width) = chart.width {
                self.chart.width = width;
            }
            if let Some(glyph) = chart.glyph {
                self.chart.glyph = parse_glyph(&glyph)?;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DEPOT_STORAGE_PATH") {
            self.storage.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("DEPOT_STORAGE_LOAD_ON_START") {
            self.storage.load_on_start = parse_bool("DEPOT_STORAGE_LOAD_ON_START", &value)?;
        }

        if let Some(value) = read_env("DEPOT_CHART_WIDTH") {
            self.chart.width = parse_usize("DEPOT_CHART_WIDTH", &value)?;
        }
        if let Some(value) = read_env("DEPOT_CHART_GLYPH") {
            self.chart.glyph = parse_glyph(&value).map_err(|_| ConfigError::InvalidEnvOverride {
                key: "DEPOT_CHART_GLYPH".to_string(),
                value: value.clone(),
            })?;
        }

        let log_level = read_env("DEPOT_LOGGING_LEVEL").or_else(|| read_env("DEPOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("DEPOT_LOGGING_FORMAT").or_else(|| read_env("DEPOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(storage_path) = overrides.storage_path {
            self.storage.path = storage_path;
        }
        if let Some(load_on_start) = overrides.load_on_start {
            self.storage.load_on_start = load_on_start;
        }
        if let Some(chart_width) = overrides.chart_width {
            self.chart.width = chart_width;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_chart(&self.chart)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Returns the first config file that exists, or the explicit path if it exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.path must not be empty".to_string()));
    }

    if storage.path.is_dir() {
        return Err(ConfigError::Validation(format!(
            "storage.path `{}` is a directory; expected a file path",
            storage.path.display()
        )));
    }

    Ok(())
}

fn validate_chart(chart: &ChartConfig) -> Result<(), ConfigError> {
    if chart.width == 0 || chart.width > 200 {
        return Err(ConfigError::Validation("chart.width must be in range 1..=200".to_string()));
    }

    if chart.glyph.is_whitespace() || chart.glyph.is_control() {
        return Err(ConfigError::Validation(
            "chart.glyph must be a visible character".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_glyph(value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) => Ok(glyph),
        _ => Err(ConfigError::Validation(format!(
            "chart.glyph must be exactly one character, got `{value}`"
        ))),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    chart: Option<ChartPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    path: Option<PathBuf>,
    load_on_start: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartPatch {
    width: Option<usize>,
    glyph: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const DEPOT_VARS: [&str; 8] = [
        "DEPOT_STORAGE_PATH",
        "DEPOT_STORAGE_LOAD_ON_START",
        "DEPOT_CHART_WIDTH",
        "DEPOT_CHART_GLYPH",
        "DEPOT_LOGGING_LEVEL",
        "DEPOT_LOGGING_FORMAT",
        "DEPOT_LOG_LEVEL",
        "DEPOT_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let config = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("missing.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.storage.path == PathBuf::from("inventory.json"), "default storage path")?;
        ensure(!config.storage.load_on_start, "load_on_start defaults to false")?;
        ensure(config.chart.width == 40, "default chart width")?;
        ensure(config.chart.glyph == '#', "default chart glyph")?;
        ensure(config.logging.level == "warn", "default log level")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default log format")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);
        env::set_var("TEST_DEPOT_DATA_DIR", "/var/lib/depot");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("depot.toml");
            fs::write(
                &path,
                r#"
[storage]
path = "${TEST_DEPOT_DATA_DIR}/stock.json"
load_on_start = true

[chart]
glyph = "*"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.path == PathBuf::from("/var/lib/depot/stock.json"),
                "storage path should be interpolated from environment",
            )?;
            ensure(config.storage.load_on_start, "load_on_start should come from the file")?;
            ensure(config.chart.glyph == '*', "glyph should come from the file")?;
            Ok(())
        })();

        clear_vars(&["TEST_DEPOT_DATA_DIR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);
        env::set_var("DEPOT_LOG_LEVEL", "debug");
        env::set_var("DEPOT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "debug", "log level should be set from env alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env alias",
            )
        })();

        clear_vars(&DEPOT_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);
        env::set_var("DEPOT_STORAGE_PATH", "from-env.json");
        env::set_var("DEPOT_CHART_WIDTH", "60");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("depot.toml");
            fs::write(
                &path,
                r#"
[storage]
path = "from-file.json"

[chart]
width = 20

[logging]
level = "error"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    chart_width: Some(80),
                    log_level: Some("info".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.path == PathBuf::from("from-env.json"),
                "env storage path should win over file",
            )?;
            ensure(config.chart.width == 80, "explicit override should win over env")?;
            ensure(config.logging.level == "info", "explicit log level override should win")?;
            Ok(())
        })();

        clear_vars(&DEPOT_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);
        env::set_var("DEPOT_CHART_WIDTH", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("chart.width")
            );
            ensure(has_message, "validation failure should mention chart.width")
        })();

        clear_vars(&DEPOT_VARS);
        result
    }

    #[test]
    fn non_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);
        env::set_var("DEPOT_CHART_WIDTH", "wide");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) if key == "DEPOT_CHART_WIDTH" => {
                Ok(())
            }
            other => Err(format!("expected invalid env override, got {other:?}")),
        };

        clear_vars(&DEPOT_VARS);
        result
    }

    #[test]
    fn multi_character_glyph_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("depot.toml");
        fs::write(&path, "[chart]\nglyph = \"##\"\n").map_err(|err| err.to_string())?;

        match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() }) {
            Err(ConfigError::Validation(message)) if message.contains("chart.glyph") => Ok(()),
            other => Err(format!("expected glyph validation failure, got {other:?}")),
        }
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&DEPOT_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("depot.toml");
        match AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Err(ConfigError::MissingConfigFile(missing)) if missing == path => Ok(()),
            other => Err(format!("expected missing config file error, got {other:?}")),
        }
    }
}
