use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

const DEFAULT_QUIET_PERIOD_MS: u64 = 2000;

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite database
    pub database_path: ConfigValue<PathBuf>,
    /// Owner whose journey the commands work on
    pub owner: ConfigValue<String>,
    /// Name given to a journey on first visit
    pub journey_name: ConfigValue<String>,
    /// Quiet period before a background draft save
    pub autosave_quiet_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct AutosaveSection {
    quiet_period_ms: Option<u64>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    owner: Option<String>,
    journey_name: Option<String>,
    autosave: AutosaveSection,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut database_path = ConfigValue::new(
            Self::default_data_dir().join("herdwise.db"),
            ConfigSource::Default,
        );
        let mut owner = ConfigValue::new("default".to_string(), ConfigSource::Default);
        let mut journey_name = ConfigValue::new("Inventário".to_string(), ConfigSource::Default);
        let mut autosave_quiet_ms = ConfigValue::new(DEFAULT_QUIET_PERIOD_MS, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(value) = file_config.owner {
                owner = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.journey_name {
                journey_name = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(ms) = file_config.autosave.quiet_period_ms {
                autosave_quiet_ms = ConfigValue::new(ms, ConfigSource::File);
            }
        }

        if let Ok(db_path) = std::env::var("HERDWISE_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(value) = std::env::var("HERDWISE_OWNER") {
            owner = ConfigValue::new(value, ConfigSource::Environment);
        }
        if let Ok(value) = std::env::var("HERDWISE_AUTOSAVE_QUIET_MS") {
            let ms = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnv("HERDWISE_AUTOSAVE_QUIET_MS", value))?;
            autosave_quiet_ms = ConfigValue::new(ms, ConfigSource::Environment);
        }

        Ok(Self {
            database_path,
            owner,
            journey_name,
            autosave_quiet_ms,
            config_file,
        })
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/herdwise/
    /// - macOS: ~/Library/Application Support/herdwise/
    /// - Windows: %APPDATA%/herdwise/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("herdwise")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/herdwise/
    /// - macOS: ~/Library/Application Support/herdwise/
    /// - Windows: %APPDATA%/herdwise/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("herdwise")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidEnv(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidEnv(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
