//! Runtime configuration for wxmap
//!
//! Units, language and endpoints are fixed for the lifetime of a service.
//! Values come from `Config::default()` or the process environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default OpenWeatherMap API root
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Default Nominatim API root
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Conversion factor from metres per second to kilometres per hour
const MS_TO_KMH: f64 = 3.6;

/// Conversion factor from miles per hour to kilometres per hour
const MPH_TO_KMH: f64 = 1.609_344;

/// Default auto-refresh interval (1 minute)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
const ENV_UNITS: &str = "WXMAP_UNITS";
const ENV_LANG: &str = "WXMAP_LANG";
const ENV_REFRESH_SECS: &str = "WXMAP_REFRESH_SECS";

/// Error types for configuration loading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The provider API key was not set
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    /// The units value is not recognized
    #[error("Invalid units: '{0}'. Valid units: metric, imperial")]
    InvalidUnits(String),

    /// The refresh interval is not a positive number of seconds
    #[error("Invalid refresh interval: '{0}'")]
    InvalidRefreshInterval(String),
}

/// Measurement system requested from the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Parses a units name, case-insensitively
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            _ => Err(ConfigError::InvalidUnits(s.to_string())),
        }
    }

    /// Value of the provider's `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Converts a wind speed reported in these units (m/s or mph) to km/h
    pub fn wind_speed_to_kmh(&self, speed: f64) -> f64 {
        match self {
            Self::Metric => speed * MS_TO_KMH,
            Self::Imperial => speed * MPH_TO_KMH,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeatherMap API key
    pub api_key: String,
    /// Measurement system
    #[serde(default)]
    pub units: Units,
    /// Language code for condition descriptions
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Weather provider API root
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    /// Geocoding service API root
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_base_url: String,
    /// User-Agent sent to the geocoding service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Auto-refresh interval
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Duration,
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE_URL.to_string()
}

fn default_geocoding_base_url() -> String {
    DEFAULT_GEOCODING_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("wxmap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            units: Units::default(),
            lang: default_lang(),
            weather_base_url: default_weather_base_url(),
            geocoding_base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Creates a default configuration with the given API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, if set
    ///
    /// # Returns
    /// * `Ok(Config)` with defaults for every unset optional variable
    /// * `Err(ConfigError)` if the API key is missing or a value is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(ENV_API_KEY))?;

        let mut config = Self::with_api_key(api_key);

        if let Some(units) = lookup(ENV_UNITS) {
            config.units = Units::parse(&units)?;
        }
        if let Some(lang) = lookup(ENV_LANG).filter(|lang| !lang.trim().is_empty()) {
            config.lang = lang.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            config.refresh_interval = parse_refresh_secs(&secs)?;
        }

        Ok(config)
    }
}

fn parse_refresh_secs(s: &str) -> Result<Duration, ConfigError> {
    match s.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidRefreshInterval(s.to_string())),
    }
}
