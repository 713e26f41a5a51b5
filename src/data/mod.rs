//! Core data models for wxmap
//!
//! This module contains the data types exchanged between the remote clients,
//! the fetch coordinator and presentation consumers: locations, current
//! conditions, forecast series and weather alerts.

pub mod geocode;
pub mod location;
pub mod weather;

pub use geocode::{GeocodeError, GeocodingClient};
pub use location::LocationKey;
pub use weather::{WeatherClient, WeatherError};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::Units;

/// Number of days shown in the multi-day forecast summary
const SUMMARY_DAYS: usize = 5;

/// A user-selected geographic point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
    /// Display name, once known
    pub name: Option<String>,
}

impl Location {
    /// Creates an unnamed location, as produced by a map click
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            name: None,
        }
    }

    /// Creates a named location, as produced by a successful search
    pub fn named(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            name: Some(name.into()),
        }
    }

    /// Returns the fetch identity of this location
    pub fn key(&self) -> LocationKey {
        LocationKey::derive(self)
    }
}

/// Weather condition as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Provider condition code (e.g. 800 for clear sky)
    pub id: u16,
    /// Condition group ("Rain", "Clouds", ...)
    pub group: String,
    /// Human-readable description
    pub description: String,
    /// Provider icon code
    pub icon: String,
}

/// Measured or forecast conditions at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// Temperature in configured units
    pub temperature: f64,
    /// Feels-like temperature in configured units
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Wind speed (m/s for metric, mph for imperial)
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: u16,
    /// Primary weather condition
    pub condition: Option<Condition>,
}

impl Conditions {
    /// Wind speed in km/h, given the units the provider reported it in
    pub fn wind_speed_kmh(&self, units: Units) -> f64 {
        units.wind_speed_to_kmh(self.wind_speed)
    }
}

/// Current conditions for one location at one fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// The measured conditions
    pub conditions: Conditions,
    /// Place name the provider resolved for the coordinate
    pub place_name: String,
    /// Country code, if reported
    pub country: Option<String>,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}

/// One timestamped entry of a forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Time the forecast applies to
    pub timestamp: DateTime<Utc>,
    /// Forecast conditions
    pub conditions: Conditions,
}

/// Multi-day forecast at 3-hour granularity, replaced wholesale on each fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// Ordered forecast points
    pub points: Vec<ForecastPoint>,
    /// City name reported by the provider
    pub city_name: String,
    /// Country code reported by the provider
    pub country: Option<String>,
    /// Offset of the forecast location from UTC in seconds
    pub utc_offset_seconds: i32,
    /// Units the provider reported values in
    #[serde(default)]
    pub units: Units,
}

/// Flattened numeric series consumed by charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: f64,
    pub wind_speed_kmh: f64,
}

impl ForecastSeries {
    /// Number of forecast points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Picks one representative point per local calendar day, up to five days.
    ///
    /// The point closest to midday (11:00-13:00 local time) is preferred; days
    /// without one fall back to their middle point.
    pub fn daily_summaries(&self) -> Vec<&ForecastPoint> {
        let offset =
            FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix());

        let mut by_day: BTreeMap<NaiveDate, Vec<&ForecastPoint>> = BTreeMap::new();
        for point in &self.points {
            let local_date = point.timestamp.with_timezone(&offset).date_naive();
            by_day.entry(local_date).or_default().push(point);
        }

        by_day
            .into_values()
            .filter_map(|items| {
                let noon = items.iter().copied().find(|point| {
                    let hour = point.timestamp.with_timezone(&offset).hour();
                    (11..=13).contains(&hour)
                });
                noon.or_else(|| items.get(items.len() / 2).copied())
            })
            .take(SUMMARY_DAYS)
            .collect()
    }

    /// Flattens the series into chart-ready values
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        self.points
            .iter()
            .map(|point| ChartPoint {
                timestamp: point.timestamp,
                temperature: point.conditions.temperature,
                feels_like: point.conditions.feels_like,
                humidity: point.conditions.humidity,
                pressure: point.conditions.pressure,
                wind_speed_kmh: point.conditions.wind_speed_kmh(self.units),
            })
            .collect()
    }
}

/// How prominently an alert should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Severe,
    Advisory,
}

/// Event keywords that mark an alert as severe
const SEVERE_EVENT_TERMS: [&str; 9] = [
    "tornado",
    "hurricane",
    "flood",
    "tsunami",
    "earthquake",
    "severe",
    "extreme",
    "emergency",
    "warning",
];

/// An active weather alert for the selected location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    /// Issuing agency
    pub sender: String,
    /// Event name (e.g. "Flood Warning")
    pub event: String,
    /// Start of validity
    pub valid_from: DateTime<Utc>,
    /// End of validity
    pub valid_until: DateTime<Utc>,
    /// Free-text description
    pub description: String,
    /// Provider tags
    pub tags: Vec<String>,
}

impl WeatherAlert {
    /// Classifies the alert by keywords in its event name
    pub fn severity(&self) -> AlertSeverity {
        let event = self.event.to_lowercase();
        if SEVERE_EVENT_TERMS.iter().any(|term| event.contains(term)) {
            AlertSeverity::Severe
        } else {
            AlertSeverity::Advisory
        }
    }
}

/// Active alerts for a location; empty is a normal state
pub type AlertSet = Vec<WeatherAlert>;

/// Maps a wind bearing to one of eight compass points
pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
    const DIRECTIONS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = ((f64::from(degrees) / 45.0).round() as usize) % DIRECTIONS.len();
    DIRECTIONS[index]
}
