//! Configuration management for the flattener
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (flatten.toml)
//! - Environment variables (FLATTEN__*)
//! - `--set key=value` options, remapped through a [`ConfigMapping`]
//!
//! ## Example config file (flatten.toml):
//! ```toml
//! [flatten]
//! root_entity = "collection"
//!
//! [output]
//! format = "pretty"
//! fingerprint = false
//!
//! [validation]
//! compile_json_schema = true
//! check_references = true
//!
//! [loader]
//! skip_prefixes = ["_", "."]
//! extension = "json"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config_mapping::ConfigMapping;
use crate::error::{Result, SchemaError};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlattenConfig {
    #[serde(default)]
    pub flatten: FlattenSection,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Flattening settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlattenSection {
    /// Root entity name; the schema file stem when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_entity: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (pretty or compact)
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,

    /// Log a SHA-256 fingerprint of every entity map written
    #[serde(default)]
    pub fingerprint: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn render<T: Serialize>(self, value: &T) -> serde_json::Result<String> {
        match self {
            Self::Pretty => serde_json::to_string_pretty(value),
            Self::Compact => serde_json::to_string(value),
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Compile generated JSON Schema documents before writing them
    #[serde(default = "default_true")]
    pub compile_json_schema: bool,

    /// Check referential completeness of every flattened map
    #[serde(default = "default_true")]
    pub check_references: bool,
}

/// Schema discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File name prefixes to skip
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// Schema file extension
    #[serde(default = "default_extension")]
    pub extension: String,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_skip_prefixes() -> Vec<String> {
    vec!["_".to_string(), ".".to_string()]
}

fn default_extension() -> String {
    "json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            fingerprint: false,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            compile_json_schema: true,
            check_references: true,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            extension: default_extension(),
        }
    }
}

const OPTION_KEYS: &str = concat!(
    "^(root_entity|format|fingerprint|compile_json_schema|check_references",
    "|skip_prefixes|extension)$"
);

/// Remaps loosely-named `--set` options onto configuration keys
pub fn option_mapping() -> Result<ConfigMapping> {
    let mut mapping = ConfigMapping::new();
    mapping
        .rename("^rootEntity$", "root_entity")?
        .rename("^outputFormat$", "format")?
        .rename("^validate$", "compile_json_schema")?
        .as_is(OPTION_KEYS)?;
    Ok(mapping)
}

impl FlattenConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["flatten.toml", ".flatten.toml", "config/flatten.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) =
            directories::ProjectDirs::from("dev", "schema-flatten", "schema-flatten")
        {
            let xdg_config = config_dir.config_dir().join("flatten.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (FLATTEN__*)
        builder = builder.add_source(
            Environment::with_prefix("FLATTEN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Apply `key=value` options on top of this configuration
    ///
    /// Values are read as JSON when they parse, otherwise as plain strings.
    pub fn with_options(mut self, options: &[(String, String)]) -> Result<Self> {
        let mut values = Map::new();
        for (key, raw) in options {
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
            values.insert(key.clone(), value);
        }

        let mapping = option_mapping()?;
        let mapped = mapping.apply(&values);

        for key in values.keys() {
            if !mapping.matches(key) {
                return Err(SchemaError::InvalidFormat(format!("unknown option '{}'", key)));
            }
        }

        for (key, value) in mapped {
            match key.as_str() {
                "root_entity" => {
                    self.flatten.root_entity = Some(match value {
                        Value::String(name) => name,
                        other => other.to_string(),
                    })
                }
                "format" => self.output.format = serde_json::from_value(value)?,
                "fingerprint" => self.output.fingerprint = serde_json::from_value(value)?,
                "compile_json_schema" => {
                    self.validation.compile_json_schema = serde_json::from_value(value)?
                }
                "check_references" => {
                    self.validation.check_references = serde_json::from_value(value)?
                }
                "skip_prefixes" => self.loader.skip_prefixes = serde_json::from_value(value)?,
                "extension" => self.loader.extension = serde_json::from_value(value)?,
                other => {
                    return Err(SchemaError::InvalidFormat(format!(
                        "unknown option '{}'",
                        other
                    )))
                }
            }
        }

        Ok(self)
    }
}
