use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::model::{PlaceMatch, WeatherSnapshot};

use super::{CurrentWeather, PlaceSearch, ProviderError, decode_json};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com client serving both place search and current conditions.
///
/// The API key travels in the `key` header. Each call checks for it on its
/// own, so a missing key only fails the calls that need it.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::MissingCredential)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct WaCondition {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    #[serde(default)]
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: Option<WaLocation>,
    current: WaCurrent,
}

#[async_trait]
impl PlaceSearch for WeatherApiProvider {
    #[instrument(skip(self))]
    async fn search(&self, city: &str) -> Result<PlaceMatch, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.endpoint("search.json");
        debug!(%url, city, "searching place");

        // Form encoding writes spaces in `q` as `+`.
        let res = self
            .http
            .get(&url)
            .header("key", api_key)
            .query(&[("q", city)])
            .send()
            .await?;

        let candidates: Vec<WaSearchResult> = decode_json(res, "weatherapi search").await?;
        debug!(candidates = candidates.len(), "place search answered");

        let first = candidates.into_iter().next().ok_or(ProviderError::NoResults)?;

        Ok(PlaceMatch {
            name: first.name,
            region: first.region,
            country: first.country,
            lat: first.lat,
            lon: first.lon,
        })
    }
}

#[async_trait]
impl CurrentWeather for WeatherApiProvider {
    #[instrument(skip(self))]
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, ProviderError> {
        let api_key = self.api_key()?;
        let url = self.endpoint("current.json");
        let q = format_coordinates(lat, lon);
        debug!(%url, %q, "fetching current weather");

        let res = self
            .http
            .get(&url)
            .header("key", api_key)
            .query(&[("q", q.as_str())])
            .send()
            .await?;

        let parsed: WaResponse = decode_json(res, "weatherapi current").await?;

        let observation_time = parsed.current.last_updated_epoch.and_then(unix_to_utc);

        Ok(WeatherSnapshot {
            location_name: parsed.location.map(|l| l.name).unwrap_or_default(),
            temperature_c: parsed.current.temp_c,
            condition: parsed.current.condition.text,
            observation_time,
        })
    }
}

/// `lat,lon` with six decimals; out-of-range values pass through untouched.
pub fn format_coordinates(lat: f64, lon: f64) -> String {
    format!("{lat:.6},{lon:.6}")
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_use_six_decimals() {
        assert_eq!(format_coordinates(-19.0, -45.5), "-19.000000,-45.500000");
        assert_eq!(format_coordinates(123.4567891, 500.0), "123.456789,500.000000");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let provider = WeatherApiProvider::new(Some("  ".into()), DEFAULT_BASE_URL);
        assert!(matches!(provider.api_key(), Err(ProviderError::MissingCredential)));

        let provider = WeatherApiProvider::new(Some("KEY".into()), DEFAULT_BASE_URL);
        assert_eq!(provider.api_key().unwrap(), "KEY");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let provider = WeatherApiProvider::new(Some("SECRET".into()), DEFAULT_BASE_URL);
        let dbg = format!("{provider:?}");

        assert!(!dbg.contains("SECRET"));
        assert!(dbg.contains("<redacted>"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let provider = WeatherApiProvider::new(None, "http://127.0.0.1:9");

        let err = provider.search("Abaeté").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential));

        let err = provider.fetch_current(-19.16, -45.44).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential));
    }

    #[test]
    fn current_response_parses_epoch() {
        let body = r#"{
            "location": {"name": "Abaete", "region": "Minas Gerais"},
            "current": {"temp_c": 24.3, "last_updated_epoch": 1700000000, "condition": {"text": "Sunny"}}
        }"#;
        let parsed: WaResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.current.temp_c, 24.3);
        assert_eq!(
            parsed.current.last_updated_epoch.and_then(unix_to_utc).map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }
}
