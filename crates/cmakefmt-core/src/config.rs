// crates/cmakefmt-core/src/config.rs - Configuration System
//
// This module provides the configuration schema consumed by the formatter and
// the resolution logic that decides which configuration governs a run.
//
// CONFIGURATION HIERARCHY (highest to lowest priority):
// 1. Command-line overrides (--tab-size, --line-ending, etc.)
// 2. One file layer: the explicit --config path, OR the nearest
//    auto-discovered file walking upward from the input file's directory
// 3. Built-in defaults
//
// An explicit path disables discovery entirely. Standard input never
// triggers discovery. Finding no file at all is not an error.
//
// STRICTNESS POLICY:
// - Unknown keys are logged as warnings and ignored
// - Values of the wrong type or outside their domain are fatal
// - A config file that exists but cannot be read or parsed is fatal

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config {file}: {source}")]
    IoError {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid syntax in {file}: {error}")]
    ParseError { file: String, error: String },

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("Unsupported config file format: {0} (expected .toml, .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// File names probed in every directory during auto-discovery, in order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".cmake-format.toml",
    ".cmake-format.yaml",
    ".cmake-format.yml",
    ".cmake-format.json",
    "cmake-format.toml",
    "cmake-format.yaml",
    "cmake-format.yml",
    "cmake-format.json",
];

/// Every key the schema understands; anything else is reported and dropped
const KNOWN_KEYS: &[&str] = &[
    "tab_size",
    "use_tabchars",
    "max_empty_lines",
    "command_case",
    "separate_ctrl_name_with_space",
    "separate_fn_name_with_space",
    "line_ending",
];

const MAX_TAB_SIZE: usize = 16;
const MAX_EMPTY_LINES_LIMIT: usize = 100;

/// How command names are re-cased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCase {
    #[default]
    Lower,
    Upper,
    Unchanged,
}

/// Line ending written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Unix,
    Windows,
    /// Reuse whichever ending the input uses first
    Auto,
}

/// Serialization formats accepted for configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

/// Complete configuration schema for the formatter
///
/// `#[serde(default)]` lets partial files inherit built-in defaults for
/// every key they leave out, so defaults are a layer underneath the file
/// rather than something merged by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Spaces per indentation level
    pub tab_size: usize,

    /// Indent with tab characters instead of spaces
    pub use_tabchars: bool,

    /// Maximum number of consecutive blank lines kept
    pub max_empty_lines: usize,

    /// Case applied to command names
    pub command_case: CommandCase,

    /// Put a space between control-flow commands (if, foreach, ...) and "("
    pub separate_ctrl_name_with_space: bool,

    /// Put a space between all other command names and "("
    pub separate_fn_name_with_space: bool,

    /// Line ending used in the output
    pub line_ending: LineEnding,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tab_size: 2,
            use_tabchars: false,
            max_empty_lines: 1,
            command_case: CommandCase::Lower,
            separate_ctrl_name_with_space: false,
            separate_fn_name_with_space: false,
            line_ending: LineEnding::Unix,
        }
    }
}

/// Command-line overrides layered on top of the file layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub tab_size: Option<usize>,
    pub use_tabchars: Option<bool>,
    pub max_empty_lines: Option<usize>,
    pub command_case: Option<CommandCase>,
    pub line_ending: Option<LineEnding>,
}

impl ConfigOverrides {
    /// Return a copy of `base` with every present override applied
    pub fn apply(&self, base: FormatConfig) -> FormatConfig {
        FormatConfig {
            tab_size: self.tab_size.unwrap_or(base.tab_size),
            use_tabchars: self.use_tabchars.unwrap_or(base.use_tabchars),
            max_empty_lines: self.max_empty_lines.unwrap_or(base.max_empty_lines),
            command_case: self.command_case.unwrap_or(base.command_case),
            line_ending: self.line_ending.unwrap_or(base.line_ending),
            ..base
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Where the file layer of a resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Defaults,
    Discovered(PathBuf),
    Explicit(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => f.write_str("built-in defaults"),
            Self::Discovered(path) => write!(f, "{} (discovered)", path.display()),
            Self::Explicit(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The configuration governing one run
///
/// Built once by [`ConfigManager::resolve`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: FormatConfig,
    pub origin: ConfigOrigin,
}

impl ResolvedConfig {
    pub fn defaults() -> Self {
        Self {
            config: FormatConfig::default(),
            origin: ConfigOrigin::Defaults,
        }
    }

    /// Layer command-line overrides on top of this configuration
    pub fn with_overrides(self, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        if overrides.is_empty() {
            return Ok(self);
        }
        let config = overrides.apply(self.config);
        ConfigManager::validate_config(&config)?;
        Ok(Self {
            config,
            origin: self.origin,
        })
    }
}

/// Configuration loading and management
pub struct ConfigManager;

impl ConfigManager {
    /// Determine the effective configuration for one run
    ///
    /// LOADING STRATEGY:
    /// 1. If `explicit` is given, load exactly that file (no fallback)
    /// 2. Else if `target` is a real file, walk upward from its directory
    ///    and load the first conventionally named config found
    /// 3. Else use built-in defaults
    pub fn resolve(explicit: Option<&Path>, target: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        if let Some(path) = explicit {
            info!("Using explicit config {}", path.display());
            let config = Self::load_file(path)?;
            return Ok(ResolvedConfig {
                config,
                origin: ConfigOrigin::Explicit(path.to_path_buf()),
            });
        }

        let Some(start_dir) = target.and_then(Self::discovery_root) else {
            debug!("No input file to search from, using built-in defaults");
            return Ok(ResolvedConfig::defaults());
        };

        match Self::find_config(&start_dir) {
            Some(path) => {
                info!("Discovered config {}", path.display());
                let config = Self::load_file(&path)?;
                Ok(ResolvedConfig {
                    config,
                    origin: ConfigOrigin::Discovered(path),
                })
            }
            None => {
                debug!(
                    "No config file found above {}, using built-in defaults",
                    start_dir.display()
                );
                Ok(ResolvedConfig::defaults())
            }
        }
    }

    /// Find the nearest config file, starting in `start_dir` and walking up
    ///
    /// Directories are visited deepest first; within a directory the names
    /// in [`CONFIG_FILE_NAMES`] are probed in order. The first hit wins.
    pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
        start_dir.ancestors().find_map(|dir| {
            CONFIG_FILE_NAMES.iter().find_map(|name| {
                let candidate = dir.join(name);
                debug!("Probing {}", candidate.display());
                candidate.is_file().then_some(candidate)
            })
        })
    }

    /// Directory discovery starts from, or None when `target` is not a file
    fn discovery_root(target: &Path) -> Option<PathBuf> {
        if !target.is_file() {
            return None;
        }
        let absolute = fs::canonicalize(target)
            .or_else(|_| std::path::absolute(target))
            .ok()?;
        absolute.parent().map(Path::to_path_buf)
    }

    /// Load, parse and validate one config file
    pub fn load_file(path: &Path) -> ConfigResult<FormatConfig> {
        let format = ConfigFormat::from_path(path)?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            file: path.display().to_string(),
            source,
        })?;

        Self::parse_str(&content, format, &path.display().to_string())
    }

    /// Parse and validate config text in the given format
    ///
    /// The text is first read into a generic JSON value so unknown keys
    /// can be reported by name before the typed schema is applied.
    pub fn parse_str(content: &str, format: ConfigFormat, file: &str) -> ConfigResult<FormatConfig> {
        let parse_error = |error: String| ConfigError::ParseError {
            file: file.to_string(),
            error,
        };

        let value: serde_json::Value = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
        };

        let mut table = match value {
            serde_json::Value::Object(table) => table,
            // An empty YAML document parses as null
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(parse_error(format!(
                    "top level must be a table of options, found {}",
                    json_kind(&other)
                )));
            }
        };

        table.retain(|key, _| {
            let known = KNOWN_KEYS.contains(&key.as_str());
            if !known {
                warn!("{}: ignoring unknown config option '{}'", file, key);
            }
            known
        });

        let config: FormatConfig = serde_json::from_value(serde_json::Value::Object(table))
            .map_err(|e| parse_error(e.to_string()))?;

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Validate value domains that the type system cannot express
    pub fn validate_config(config: &FormatConfig) -> ConfigResult<()> {
        if config.tab_size == 0 || config.tab_size > MAX_TAB_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "tab_size must be between 1 and {}, got {}",
                MAX_TAB_SIZE, config.tab_size
            )));
        }

        if config.max_empty_lines > MAX_EMPTY_LINES_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "max_empty_lines must be at most {}, got {}",
                MAX_EMPTY_LINES_LIMIT, config.max_empty_lines
            )));
        }

        Ok(())
    }

    /// Render a configuration in the given format
    pub fn render(config: &FormatConfig, format: ConfigFormat) -> ConfigResult<String> {
        let serialize_error = |e: &dyn fmt::Display| ConfigError::SerializeError(e.to_string());
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| serialize_error(&e)),
            ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| serialize_error(&e)),
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| serialize_error(&e)),
        }
    }
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl FromStr for CommandCase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lower" => Ok(Self::Lower),
            "upper" => Ok(Self::Upper),
            "unchanged" => Ok(Self::Unchanged),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid command_case '{}'. Must be one of: lower, upper, unchanged",
                other
            ))),
        }
    }
}

impl FromStr for LineEnding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "windows" => Ok(Self::Windows),
            "auto" => Ok(Self::Auto),
            other => Err(ConfigError::ValidationError(format!(
                "Invalid line_ending '{}'. Must be one of: unix, windows, auto",
                other
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a table",
    }
}
