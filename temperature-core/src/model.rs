use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Address returned by the postal lookup. Only `city` feeds the rest of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state_code: String,
    pub state: String,
    pub region: String,
    pub ibge_code: String,
    pub area_code: String,
}

/// A geocoded candidate from the place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMatch {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current conditions for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: f64,
    pub condition: String,
    pub observation_time: Option<DateTime<Utc>>,
}

/// Temperature in the three units served by the HTTP endpoint.
///
/// Build it with [`TemperatureReading::from_celsius`] so Fahrenheit and Kelvin
/// always derive from the Celsius value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    #[serde(rename = "temp_C")]
    pub celsius: f64,
    #[serde(rename = "temp_F")]
    pub fahrenheit: f64,
    #[serde(rename = "temp_K")]
    pub kelvin: f64,
}

impl TemperatureReading {
    pub fn from_celsius(celsius: f64) -> Self {
        Self {
            celsius,
            fahrenheit: crate::convert::celsius_to_fahrenheit(celsius),
            kelvin: crate::convert::celsius_to_kelvin(celsius),
        }
    }
}
