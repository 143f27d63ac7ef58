use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather map settings
    #[serde(default)]
    pub map: MapConfig,

    /// Screens requested after marker actions
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Local file names, relative to `config_dir`
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Weather map provider and marker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Map SDK script location. Opaque to the marker workflow.
    #[serde(default = "default_sdk_url")]
    pub sdk_url: String,

    /// Provider API key, passed through at initialization only
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    #[serde(default = "default_center_lng")]
    pub center_lng: f64,

    /// Provider zoom level (lower is closer)
    #[serde(default = "default_zoom_level")]
    pub zoom_level: u8,

    /// Two clicks closer than this are the same spot
    #[serde(default = "default_click_epsilon")]
    pub click_epsilon_meters: f64,

    /// Delay before the first load attempt, lets the container mount
    #[serde(default = "default_load_delay")]
    pub load_delay_ms: u64,

    /// Load attempts before giving up
    #[serde(default = "default_init_retries")]
    pub init_retries: u32,

    #[serde(default = "default_draft_icon")]
    pub draft_icon: String,

    #[serde(default = "default_fixed_icon")]
    pub fixed_icon: String,
}

fn default_sdk_url() -> String {
    "https://dapi.kakao.com/v2/maps/sdk.js".to_string()
}

fn default_api_key() -> String {
    "YOUR_MAP_API_KEY".to_string()
}

fn default_center_lat() -> f64 {
    33.450701
}

fn default_center_lng() -> f64 {
    126.570667
}

fn default_zoom_level() -> u8 {
    3
}

fn default_click_epsilon() -> f64 {
    10.0
}

fn default_load_delay() -> u64 {
    300
}

fn default_init_retries() -> u32 {
    3
}

fn default_draft_icon() -> String {
    "marker_draft".to_string()
}

fn default_fixed_icon() -> String {
    "marker_fixed".to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            sdk_url: default_sdk_url(),
            api_key: default_api_key(),
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            zoom_level: default_zoom_level(),
            click_epsilon_meters: default_click_epsilon(),
            load_delay_ms: default_load_delay(),
            init_retries: default_init_retries(),
            draft_icon: default_draft_icon(),
            fixed_icon: default_fixed_icon(),
        }
    }
}

impl MapConfig {
    /// Check if an API key is configured (not a placeholder)
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && !self.api_key.starts_with("YOUR_")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Screen requested after a pin is committed; empty disables it
    #[serde(default = "default_on_commit")]
    pub on_commit: Option<String>,

    /// Screen requested after the overlay is closed without saving
    #[serde(default)]
    pub on_cancel: Option<String>,
}

fn default_on_commit() -> Option<String> {
    Some("nearby_places".to_string())
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            on_commit: default_on_commit(),
            on_cancel: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key-value file holding the "name this place" fields
    #[serde(default = "default_form_file")]
    pub form_file: String,

    /// SQLite database of committed pins
    #[serde(default = "default_pins_db")]
    pub pins_db: String,
}

fn default_form_file() -> String {
    "place_form.json".to_string()
}

fn default_pins_db() -> String {
    "pins.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            form_file: default_form_file(),
            pins_db: default_pins_db(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inforecord");

        Self {
            config_dir,
            map: MapConfig::default(),
            navigation: NavigationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", config_path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.map.sdk_url, "map.sdk_url", &mut result);

        if !self.map.has_api_key() {
            result.add_warning(
                "map.api_key",
                "Map API key not configured - the weather map will not load",
            );
        }

        let (lat, lng) = (self.map.center_lat, self.map.center_lng);
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            result.add_error("map.center_lat", "Latitude must be between -90 and 90");
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            result.add_error("map.center_lng", "Longitude must be between -180 and 180");
        }

        if !(1..=14).contains(&self.map.zoom_level) {
            result.add_error("map.zoom_level", "Zoom level must be between 1 and 14");
        }

        let eps = self.map.click_epsilon_meters;
        if !eps.is_finite() || eps <= 0.0 {
            result.add_error(
                "map.click_epsilon_meters",
                "Click epsilon must be a positive distance",
            );
        } else if eps > 1000.0 {
            result.add_warning(
                "map.click_epsilon_meters",
                "Click epsilon is more than 1km; nearby taps will toggle pins",
            );
        }

        if self.map.init_retries == 0 {
            result.add_warning("map.init_retries", "Map load will not be retried (0 attempts)");
        }

        if self.storage.form_file.trim().is_empty() {
            result.add_error("storage.form_file", "File name cannot be empty");
        }
        if self.storage.pins_db.trim().is_empty() {
            result.add_error("storage.pins_db", "File name cannot be empty");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Path of the key-value form file
    pub fn form_path(&self) -> PathBuf {
        self.config_dir.join(&self.storage.form_file)
    }

    /// Path of the pin database
    pub fn pins_db_path(&self) -> PathBuf {
        self.config_dir.join(&self.storage.pins_db)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("inforecord");

        Ok(config_dir.join("config.toml"))
    }
}
