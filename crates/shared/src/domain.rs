use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ReachIdError;

/// GEOGLOWS river reach number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReachId(pub i64);

impl fmt::Display for ReachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of digits a hand-typed river id must have.
pub const REACH_ID_DIGITS: usize = 9;

impl FromStr for ReachId {
    type Err = ReachIdError;

    /// Parses a river id typed by the user. Only exactly nine ASCII digits are
    /// accepted; ids resolved from the map layer go through [`ReachId::from_property`].
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReachIdError::Empty);
        }
        if raw.len() != REACH_ID_DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ReachIdError::NotNineDigits(raw.to_string()));
        }
        raw.parse::<i64>()
            .map(ReachId)
            .map_err(|_| ReachIdError::NotNineDigits(raw.to_string()))
    }
}

impl ReachId {
    /// Reads a reach id out of a feature attribute, which the map service
    /// returns either as a number or as a string (`"Null"` when absent).
    pub fn from_property(value: &serde_json::Value) -> Option<Self> {
        let id = match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
            serde_json::Value::String(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("null") {
                    return None;
                }
                s.parse::<i64>().ok()?
            }
            _ => return None,
        };
        (id > 0).then_some(ReachId(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {:.3}, Lon: {:.3}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Clear,
    Load,
    Ready,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Forecast,
    Retrospective,
}
