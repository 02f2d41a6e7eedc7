// Configuration loading and parsing (model.toml, sources.toml).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::scoring::{ScoringError, WeightSet};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub sources: SourcesConfig,
}

// ---------------------------------------------------------------------------
// model.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub weights: Vec<WeightEntry>,
    #[serde(default)]
    pub fallbacks: Fallbacks,
}

/// One `[[weights]]` entry. `stat` is a display label ("Barrel %") or a
/// slug ("barrel"); it is resolved to a `StatKey` during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightEntry {
    pub stat: String,
    pub weight: f64,
}

/// Values substituted when a player has no row in a stat table.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub ev: f64,
    pub barrel_pct: f64,
    pub xslg: f64,
    pub hard_hit_pct: f64,
    pub barrel_allowed_pct: f64,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            ev: 87.0,
            barrel_pct: 3.0,
            xslg: 0.34,
            hard_hit_pct: 40.0,
            barrel_allowed_pct: 6.0,
        }
    }
}

// ---------------------------------------------------------------------------
// sources.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub data_paths: DataPaths,
    pub database: DatabaseSection,
    pub statsapi: StatsApiConfig,
    pub cache: CacheConfig,
    pub weather: WeatherConfig,
    #[serde(default)]
    pub drive: DriveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub expected_batters: String,
    pub exit_batters: String,
    pub expected_pitchers: String,
    pub exit_pitchers: String,
    pub batted_ball: String,
    pub handedness: String,
}

impl DataPaths {
    /// Table name and path pairs, in a fixed order. The names double as the
    /// keys of `[drive.files]`.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("expected_batters", self.expected_batters.as_str()),
            ("exit_batters", self.exit_batters.as_str()),
            ("expected_pitchers", self.expected_pitchers.as_str()),
            ("exit_pitchers", self.exit_pitchers.as_str()),
            ("batted_ball", self.batted_ball.as_str()),
            ("handedness", self.handedness.as_str()),
        ]
    }

    pub fn path_for(&self, table: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == table)
            .map(|(_, path)| path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    /// Empty means "use the platform data directory".
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("hitrank/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub url: String,
    pub game_selector: String,
    pub team_selector: String,
    pub wind_selector: String,
}

/// Google Drive file ids keyed by table name (see `DataPaths::entries`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl Config {
    /// Resolve the configured weights into a validated `WeightSet`.
    pub fn weight_set(&self) -> Result<WeightSet, ScoringError> {
        WeightSet::from_entries(&self.model.weights)
    }

    /// Where the SQLite store lives. An empty `database.path` falls back to
    /// the platform data directory.
    pub fn db_path(&self) -> PathBuf {
        if !self.sources.database.path.is_empty() {
            return PathBuf::from(&self.sources.database.path);
        }
        match directories::ProjectDirs::from("", "", "hitrank") {
            Some(dirs) => dirs.data_dir().join("hitrank.db"),
            None => PathBuf::from("hitrank.db"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/model.toml` and
/// `config/sources.toml`, both relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- model.toml (required) ---
    let model_path = config_dir.join("model.toml");
    let model_text = read_file(&model_path)?;
    let model: ModelConfig =
        toml::from_str(&model_text).map_err(|e| ConfigError::ParseError {
            path: model_path.clone(),
            source: e,
        })?;

    // --- sources.toml (required) ---
    let sources_path = config_dir.join("sources.toml");
    let sources_text = read_file(&sources_path)?;
    let sources: SourcesConfig =
        toml::from_str(&sources_text).map_err(|e| ConfigError::ParseError {
            path: sources_path.clone(),
            source: e,
        })?;

    let config = Config { model, sources };
    validate(&config)?;
    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        // Without defaults/ an existing config/ is enough; with neither
        // there is nothing to load.
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        // Only plain files are copied
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        // Templates such as drive.toml.example stay in defaults/
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            // A user-edited copy wins over the default
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    // Weights: count, range, and known stat names
    config.weight_set().map_err(|e| ConfigError::ValidationError {
        field: "weights".into(),
        message: e.to_string(),
    })?;

    // Fallbacks feed straight into scores, so NaN/inf are rejected
    let f = &config.model.fallbacks;
    let fallback_fields: &[(&str, f64)] = &[
        ("fallbacks.ev", f.ev),
        ("fallbacks.barrel_pct", f.barrel_pct),
        ("fallbacks.xslg", f.xslg),
        ("fallbacks.hard_hit_pct", f.hard_hit_pct),
        ("fallbacks.barrel_allowed_pct", f.barrel_allowed_pct),
    ];
    for (name, val) in fallback_fields {
        if !val.is_finite() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be finite, got {val}"),
            });
        }
    }

    // Sources
    for (name, path) in config.sources.data_paths.entries() {
        if path.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("data_paths.{name}"),
                message: "must not be empty".into(),
            });
        }
    }

    if config.sources.statsapi.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "statsapi.timeout_secs".into(),
            message: "must be > 0".into(),
        });
    }

    if config.sources.statsapi.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "statsapi.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    // Drive ids must map onto a [data_paths] entry
    for table in config.sources.drive.files.keys() {
        if config.sources.data_paths.path_for(table).is_none() {
            return Err(ConfigError::ValidationError {
                field: format!("drive.files.{table}"),
                message: "does not name a known table".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
