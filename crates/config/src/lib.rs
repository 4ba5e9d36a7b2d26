//! Configuration loading, validation, and management for TripCover.
//!
//! Loads configuration from `~/.tripcover/config.toml` with an environment
//! variable override for the API credential. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the completion service credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `~/.tripcover/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier sent with every completion request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional cap on tokens per reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Completion service endpoint
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Reference documents loaded into every conversation
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Weather and disaster-risk advisory policy
    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

fn default_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("provider", &self.provider)
            .field("reference", &self.reference)
            .field("advisory", &self.advisory)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name used in logs and diagnostics
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_provider_name() -> String {
    "groq".into()
}
fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Directory the relative paths below are resolved against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Policy documents preloaded at startup, in load order
    #[serde(default = "default_documents")]
    pub documents: Vec<String>,

    /// Spreadsheet with Region / Country / Country Code columns
    #[serde(default = "default_destination_table")]
    pub destination_table: String,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_documents() -> Vec<String> {
    vec![
        "Scootsurance QSR022206_updated.pdf".into(),
        "TravelEasy Policy QTD032212.pdf".into(),
        "TravelEasy Pre-Ex Policy QTD032212-PX.pdf".into(),
    ]
}
fn default_destination_table() -> String {
    "Scoot_SG_destination_list.xlsx".into()
}

impl ReferenceConfig {
    /// Full paths of the preloaded documents.
    pub fn document_paths(&self) -> Vec<PathBuf> {
        self.documents.iter().map(|d| self.base_dir.join(d)).collect()
    }

    /// Full path of the destination spreadsheet.
    pub fn destination_table_path(&self) -> PathBuf {
        self.base_dir.join(&self.destination_table)
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            documents: default_documents(),
            destination_table: default_destination_table(),
        }
    }
}

/// Advisory policy as data.
///
/// Templates may use `{destination}` and `{duration}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Destinations (matched case-insensitively) that trigger a disaster-risk advisory
    #[serde(default = "default_high_risk")]
    pub high_risk_destinations: Vec<String>,

    /// Weather narrative for high-risk destinations
    #[serde(default = "default_high_risk_weather")]
    pub high_risk_weather: String,

    /// Weather narrative for every other destination
    #[serde(default = "default_moderate_weather")]
    pub moderate_weather: String,

    /// Disaster-risk narrative for high-risk destinations
    #[serde(default = "default_disaster_risk")]
    pub disaster_risk: String,
}

fn default_high_risk() -> Vec<String> {
    vec![
        "Philippines".into(),
        "Indonesia".into(),
        "Bangladesh".into(),
        "Vietnam".into(),
        "Myanmar".into(),
        "Nepal".into(),
    ]
}
fn default_high_risk_weather() -> String {
    concat!(
        "🌧️ Expect heavy monsoon rain, flash floods and tropical storms in {destination} ",
        "during your {duration}-day trip. Flights and ground transport may be disrupted ",
        "at short notice.",
    )
    .into()
}
fn default_moderate_weather() -> String {
    concat!(
        "🌤️ Weather in {destination} over your {duration}-day trip should be moderate, ",
        "with mostly fair days and only occasional showers.",
    )
    .into()
}
fn default_disaster_risk() -> String {
    concat!(
        "⚠️ {destination} has a history of floods, typhoons and other natural disasters. ",
        "Recommend a plan with flood cover and emergency evacuation benefits for this ",
        "{duration}-day trip.",
    )
    .into()
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            high_risk_destinations: default_high_risk(),
            high_risk_weather: default_high_risk_weather(),
            moderate_weather: default_moderate_weather(),
            disaster_risk: default_disaster_risk(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tripcover/config.toml).
    ///
    /// `GROQ_API_KEY` fills in the API key when the file has none.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tripcover")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.provider.api_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.api_url must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            provider: ProviderConfig::default(),
            reference: ReferenceConfig::default(),
            advisory: AdvisoryConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
