//! Read-only view over an activity record as the API returned it.
//!
//! The payload is kept as an open JSON object so that new or unknown provider
//! fields pass through untouched; only the fields the pipeline reads get typed
//! accessors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawActivity(Map<String, Value>);

impl RawActivity {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Activity id rendered as a string (the API sends a number).
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn activity_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn sport_type(&self) -> Option<&str> {
        self.str_field("sport_type")
    }

    pub fn start_date(&self) -> Option<&str> {
        self.str_field("start_date")
    }

    pub fn start_date_local(&self) -> Option<&str> {
        self.str_field("start_date_local")
    }

    pub fn timezone(&self) -> Option<&str> {
        self.str_field("timezone")
    }

    /// Meters.
    pub fn distance(&self) -> Option<f64> {
        self.f64_field("distance")
    }

    /// Seconds.
    pub fn moving_time(&self) -> Option<f64> {
        self.f64_field("moving_time")
    }

    /// Seconds.
    pub fn elapsed_time(&self) -> Option<f64> {
        self.f64_field("elapsed_time")
    }

    pub fn average_heartrate(&self) -> Option<f64> {
        self.f64_field("average_heartrate")
    }

    /// `[lat, lng]`; the API sends an empty array for activities without GPS.
    pub fn start_latlng(&self) -> Option<(f64, f64)> {
        let arr = self.0.get("start_latlng")?.as_array()?;
        match arr.as_slice() {
            [lat, lng] => Some((lat.as_f64()?, lng.as_f64()?)),
            _ => None,
        }
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    fn f64_field(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }
}

impl From<Map<String, Value>> for RawActivity {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RawActivity {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
