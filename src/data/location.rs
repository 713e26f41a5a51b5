//! Quantized fetch identity for a coordinate
//!
//! Repeated selections of "the same" point (click jitter, a search result
//! landing on the current selection) must map to one fetch target. Both
//! coordinates are rounded to four decimal places, roughly 11 m.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Location;

/// Number of decimal places kept when deriving a key
pub const KEY_PRECISION: usize = 4;

/// Stable identity of a location for fetch purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey(String);

impl LocationKey {
    /// Derives the key for a location. Pure and total.
    pub fn derive(location: &Location) -> Self {
        Self(format!("{},{}", quantize(location.lat), quantize(location.lng)))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a coordinate at key precision, folding "-0.0000" into "0.0000"
fn quantize(value: f64) -> String {
    let formatted = format!("{:.*}", KEY_PRECISION, value);
    match formatted.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => formatted,
    }
}
