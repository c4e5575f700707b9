//! Activity cleaning and unit conversion.
//!
//! Strips bulky or location-revealing fields and rescales metric values to
//! display units (miles, feet, mph). Conversion happens only for fields that
//! are present and numeric; nothing is rounded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strava_activity_client::RawActivity;

pub const METERS_TO_MILES: f64 = 0.000621371;
pub const METERS_TO_FEET: f64 = 3.28084;
pub const MPS_TO_MPH: f64 = 2.23694;

/// Fields dropped from every activity.
pub const REMOVED_FIELDS: &[&str] = &["athlete", "map", "start_latlng", "end_latlng"];

/// Field → multiplicative factor.
pub const CONVERSIONS: &[(&str, f64)] = &[
    ("distance", METERS_TO_MILES),
    ("elev_high", METERS_TO_FEET),
    ("elev_low", METERS_TO_FEET),
    ("total_elevation_gain", METERS_TO_FEET),
    ("average_speed", MPS_TO_MPH),
    ("max_speed", MPS_TO_MPH),
];

/// An activity after cleaning: same open JSON shape, display units.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedActivity(Map<String, Value>);

impl NormalizedActivity {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn activity_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn sport_type(&self) -> Option<&str> {
        self.0.get("sport_type").and_then(Value::as_str)
    }

    /// Local start timestamp, falling back to the UTC one.
    pub fn local_start(&self) -> Option<&str> {
        self.0
            .get("start_date_local")
            .and_then(Value::as_str)
            .or_else(|| self.0.get("start_date").and_then(Value::as_str))
    }

    /// Miles; zero when absent.
    pub fn distance_miles(&self) -> f64 {
        self.number("distance")
    }

    /// Seconds; zero when absent.
    pub fn moving_time_secs(&self) -> f64 {
        self.number("moving_time")
    }

    /// Seconds; zero when absent.
    pub fn elapsed_time_secs(&self) -> f64 {
        self.number("elapsed_time")
    }

    /// Case-insensitive match of `type` or `sport_type` against any of `types`.
    pub fn matches_type(&self, types: &[String]) -> bool {
        [self.activity_type(), self.sport_type()]
            .into_iter()
            .flatten()
            .any(|t| types.iter().any(|want| want.eq_ignore_ascii_case(t)))
    }

    fn number(&self, field: &str) -> f64 {
        self.0.get(field).and_then(Value::as_f64).unwrap_or(0.0)
    }
}

impl From<Map<String, Value>> for NormalizedActivity {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub fn normalize(raw: RawActivity) -> NormalizedActivity {
    let mut map = raw.into_map();
    for field in REMOVED_FIELDS {
        map.remove(*field);
    }
    for (field, factor) in CONVERSIONS {
        if let Some(slot) = map.get_mut(*field)
            && let Some(n) = slot.as_f64()
        {
            *slot = Value::from(n * factor);
        }
    }
    NormalizedActivity(map)
}

pub fn normalize_all(raw: impl IntoIterator<Item = RawActivity>) -> Vec<NormalizedActivity> {
    raw.into_iter().map(normalize).collect()
}
