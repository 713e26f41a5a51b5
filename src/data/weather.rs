//! OpenWeatherMap API client
//!
//! This module fetches current conditions, the 5-day/3-hour forecast and
//! active alerts for a coordinate and parses them into our data structures.
//! Each call is a single attempt with the transport's default timeout.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::{
    AlertSet, Condition, Conditions, ForecastPoint, ForecastSeries, Location, WeatherAlert,
    WeatherSnapshot,
};
use crate::config::{Config, Units};

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const ONECALL_PATH: &str = "/data/3.0/onecall";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or out-of-range field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

/// Client for fetching weather data from OpenWeatherMap
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: Units,
    lang: String,
}

impl WeatherClient {
    /// Create a new WeatherClient from service configuration
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.weather_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            units: config.units,
            lang: config.lang.clone(),
        }
    }

    /// Point the client at a different API root (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch current conditions for a location
    ///
    /// # Returns
    /// * `Ok(WeatherSnapshot)` - Current conditions and the provider's place name
    /// * `Err(WeatherError)` - On transport failure, non-2xx status or bad payload
    pub async fn get_current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let text = self.get_text(CURRENT_PATH, location, &[]).await?;
        let response: CurrentResponse = serde_json::from_str(&text)?;
        Ok(parse_current(response))
    }

    /// Fetch the 5-day forecast at 3-hour granularity for a location
    ///
    /// # Returns
    /// * `Ok(ForecastSeries)` - Ordered forecast points
    /// * `Err(WeatherError)` - On transport failure, non-2xx status or bad payload
    pub async fn get_forecast(&self, location: &Location) -> Result<ForecastSeries, WeatherError> {
        let text = self.get_text(FORECAST_PATH, location, &[]).await?;
        let response: ForecastResponse = serde_json::from_str(&text)?;
        parse_forecast(response, self.units)
    }

    /// Fetch active alerts for a location, best-effort
    ///
    /// The alert endpoint is less available than the other two. Any failure is
    /// logged and reported as `None` (alerts unavailable) rather than an error.
    pub async fn get_alerts(&self, location: &Location) -> Option<AlertSet> {
        match self.try_get_alerts(location).await {
            Ok(alerts) => Some(alerts),
            Err(e) => {
                tracing::warn!(lat = location.lat, lng = location.lng, "Alerts unavailable: {}", e);
                None
            }
        }
    }

    async fn try_get_alerts(&self, location: &Location) -> Result<AlertSet, WeatherError> {
        let text = self
            .get_text(ONECALL_PATH, location, &[("exclude", "minutely,hourly,daily")])
            .await?;
        let response: OneCallResponse = serde_json::from_str(&text)?;
        parse_alerts(response)
    }

    /// Issues one GET and returns the body of a 2xx response
    async fn get_text(
        &self,
        path: &str,
        location: &Location,
        extra: &[(&str, &str)],
    ) -> Result<String, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        let lat = location.lat.to_string();
        let lon = location.lng.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_query()),
                ("lang", self.lang.as_str()),
            ])
            .query(extra)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "Weather request rejected");
            return Err(WeatherError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Parse the current-conditions payload
fn parse_current(response: CurrentResponse) -> WeatherSnapshot {
    WeatherSnapshot {
        conditions: to_conditions(response.main, response.wind, response.weather),
        place_name: response.name,
        country: response.sys.and_then(|sys| sys.country),
        fetched_at: Utc::now(),
    }
}

/// Parse the forecast payload into an ordered series
fn parse_forecast(response: ForecastResponse, units: Units) -> Result<ForecastSeries, WeatherError> {
    let mut points = Vec::with_capacity(response.list.len());

    for entry in response.list {
        let timestamp = from_unix(entry.dt, "list.dt")?;
        points.push(ForecastPoint {
            timestamp,
            conditions: to_conditions(entry.main, entry.wind, entry.weather),
        });
    }

    points.sort_by_key(|point| point.timestamp);

    Ok(ForecastSeries {
        points,
        city_name: response.city.name,
        country: response.city.country,
        utc_offset_seconds: response.city.timezone,
        units,
    })
}

/// Parse the alerts section of a one-call payload; absent means none active
fn parse_alerts(response: OneCallResponse) -> Result<AlertSet, WeatherError> {
    response
        .alerts
        .unwrap_or_default()
        .into_iter()
        .map(|alert| {
            Ok(WeatherAlert {
                sender: alert.sender_name,
                event: alert.event,
                valid_from: from_unix(alert.start, "alerts.start")?,
                valid_until: from_unix(alert.end, "alerts.end")?,
                description: alert.description,
                tags: alert.tags,
            })
        })
        .collect()
}

fn to_conditions(main: MainReadings, wind: Option<Wind>, weather: Vec<ConditionEntry>) -> Conditions {
    let wind = wind.unwrap_or_default();
    Conditions {
        temperature: main.temp,
        feels_like: main.feels_like,
        humidity: main.humidity.clamp(0.0, 100.0) as u8,
        pressure: main.pressure,
        wind_speed: wind.speed,
        wind_direction: wind.deg.rem_euclid(360.0) as u16,
        condition: weather.into_iter().next().map(|entry| Condition {
            id: entry.id,
            group: entry.main,
            description: entry.description,
            icon: entry.icon,
        }),
    }
}

fn from_unix(seconds: i64, field: &str) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| WeatherError::MissingField(field.to_string()))
}

/// Current-conditions response structure
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainReadings,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    wind: Option<Wind>,
    #[serde(default)]
    name: String,
    sys: Option<Sys>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    id: u16,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Sys {
    country: Option<String>,
}

/// Forecast response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
    city: City,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: MainReadings,
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct City {
    name: String,
    country: Option<String>,
    #[serde(default)]
    timezone: i32,
}

/// One-call response structure; only alerts are read
#[derive(Debug, Deserialize)]
struct OneCallResponse {
    alerts: Option<Vec<AlertEntry>>,
}

#[derive(Debug, Deserialize)]
struct AlertEntry {
    sender_name: String,
    event: String,
    start: i64,
    end: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}
