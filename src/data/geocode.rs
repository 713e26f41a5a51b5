//! Place-name search via Nominatim
//!
//! Resolves free text to the first matching coordinate. The display name is
//! shortened to its first comma-delimited segment ("Paris, Ile-de-France,
//! France" becomes "Paris").

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Location;
use crate::config::Config;

/// Errors that can occur when searching for a place
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Query was empty or whitespace; nothing was sent
    #[error("Search query is empty")]
    EmptyQuery,

    /// Search returned zero results
    #[error("No results for '{0}'")]
    NotFound(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Geocoding service returned HTTP {0}")]
    Status(u16),

    /// Body was malformed or a coordinate could not be parsed
    #[error("Failed to parse geocoding response: {0}")]
    ParseError(String),
}

impl GeocodeError {
    /// Message suitable for showing next to the search box
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Location not found. Please try another search.",
            Self::EmptyQuery => "Please enter a location to search.",
            _ => "Location search failed. Please try again later.",
        }
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// One entry of a Nominatim search result; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

/// Client for the Nominatim search endpoint
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl GeocodingClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.geocoding_base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Resolves a place name to a named location
    ///
    /// # Returns
    /// * `Ok(Location)` - First result, named by the leading segment of its display name
    /// * `Err(GeocodeError::NotFound)` - The service returned no results
    /// * `Err(GeocodeError)` - Transport, status or parse failure
    pub async fn search(&self, query: &str) -> Result<Location, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let results: Vec<SearchResult> = serde_json::from_str(&text)?;
        tracing::debug!(query, count = results.len(), "Geocoding results");

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

        parse_result(first)
    }
}

fn parse_result(result: SearchResult) -> Result<Location, GeocodeError> {
    let lat = parse_coordinate(&result.lat, "lat")?;
    let lng = parse_coordinate(&result.lon, "lon")?;
    Ok(Location::named(lat, lng, short_name(&result.display_name)))
}

fn parse_coordinate(value: &str, field: &str) -> Result<f64, GeocodeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeocodeError::ParseError(format!("invalid {}: '{}'", field, value)))
}

fn short_name(display_name: &str) -> String {
    display_name
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
