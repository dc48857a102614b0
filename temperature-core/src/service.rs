//! CEP → address → place → weather → temperature pipeline.

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    Config,
    model::TemperatureReading,
    provider::{
        CurrentWeather, PlaceSearch, PostalLookup, ProviderError, viacep::ViaCepProvider,
        weatherapi::WeatherApiProvider,
    },
};

/// Pipeline step that produced a [`ChainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Postal,
    City,
    Weather,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Postal => "postal",
            Stage::City => "city",
            Stage::Weather => "weather",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Stage::Postal => "can not find zipcode",
            Stage::City => "can not find city",
            Stage::Weather => "can not fetch weather",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure with its original cause.
///
/// `Display` renders the flattened `"<stage message>: <cause>"` text sent to clients.
#[derive(Debug, Error)]
#[error("{}: {source}", .stage.message())]
pub struct ChainError {
    stage: Stage,
    #[source]
    source: ProviderError,
}

impl ChainError {
    pub fn new(stage: Stage, source: ProviderError) -> Self {
        Self { stage, source }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn cause(&self) -> &ProviderError {
        &self.source
    }
}

/// Sequences the three collaborators. Cheap to clone; holds no per-request state.
#[derive(Debug, Clone)]
pub struct TemperatureService {
    postal: Arc<dyn PostalLookup>,
    places: Arc<dyn PlaceSearch>,
    weather: Arc<dyn CurrentWeather>,
}

impl TemperatureService {
    pub fn new(
        postal: Arc<dyn PostalLookup>,
        places: Arc<dyn PlaceSearch>,
        weather: Arc<dyn CurrentWeather>,
    ) -> Self {
        Self { postal, places, weather }
    }

    /// Wire the ViaCEP and WeatherAPI.com clients from configuration.
    pub fn from_config(config: &Config) -> Self {
        let weatherapi = Arc::new(WeatherApiProvider::new(
            config.api_key().map(str::to_owned),
            config.weatherapi.base_url.clone(),
        ));

        Self::new(
            Arc::new(ViaCepProvider::new(config.viacep.base_url.clone())),
            weatherapi.clone(),
            weatherapi,
        )
    }

    /// Resolve `code` to the current temperature; the first failing stage aborts.
    #[instrument(skip(self))]
    pub async fn temperature_by_postal_code(
        &self,
        code: &str,
    ) -> Result<TemperatureReading, ChainError> {
        let address = self.postal.lookup(code).await.map_err(|e| fail(Stage::Postal, e))?;

        let place = self.places.search(&address.city).await.map_err(|e| fail(Stage::City, e))?;

        let snapshot = self
            .weather
            .fetch_current(place.lat, place.lon)
            .await
            .map_err(|e| fail(Stage::Weather, e))?;

        let reading = TemperatureReading::from_celsius(snapshot.temperature_c);
        info!(
            city = %address.city,
            place = %place.name,
            temp_c = reading.celsius,
            observed_at = ?snapshot.observation_time,
            "temperature resolved"
        );

        Ok(reading)
    }
}

fn fail(stage: Stage, source: ProviderError) -> ChainError {
    warn!(%stage, error = %source, "pipeline stage failed");
    ChainError::new(stage, source)
}
