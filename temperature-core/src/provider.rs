//! Clients for the external services the pipeline depends on.
//!
//! Each collaborator sits behind its own small trait so the orchestrator can
//! run against fakes in tests.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Address, PlaceMatch, WeatherSnapshot};

pub mod viacep;
pub mod weatherapi;

/// Failure of a single collaborator call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid zipcode")]
    InvalidFormat,

    #[error("WEATHER_API_KEY is not set")]
    MissingCredential,

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("status code: {}", .0.as_u16())]
    UpstreamStatus(StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no cities found for the given search term")]
    NoResults,

    #[error("zipcode not found")]
    NotFound,
}

#[async_trait]
pub trait PostalLookup: Send + Sync + Debug {
    /// Resolve a (possibly formatted) postal code to an address.
    async fn lookup(&self, code: &str) -> Result<Address, ProviderError>;
}

#[async_trait]
pub trait PlaceSearch: Send + Sync + Debug {
    /// Return the first candidate matching `city`.
    async fn search(&self, city: &str) -> Result<PlaceMatch, ProviderError>;
}

#[async_trait]
pub trait CurrentWeather: Send + Sync + Debug {
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, ProviderError>;
}

/// Check the status, read the body and decode it as JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    res: Response,
    upstream: &str,
) -> Result<T, ProviderError> {
    let status = res.status();
    debug!(upstream, %status, "upstream responded");

    if !status.is_success() {
        // The body is only for the log; a failed read must not mask the status.
        let body = res.text().await.unwrap_or_default();
        warn!(upstream, %status, body = %truncate_body(&body), "upstream rejected request");
        return Err(ProviderError::UpstreamStatus(status));
    }

    let body = res.text().await?;

    serde_json::from_str(&body).map_err(|err| {
        warn!(upstream, error = %err, body = %truncate_body(&body), "undecodable upstream body");
        ProviderError::Decode(err)
    })
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_client_facing() {
        assert_eq!(ProviderError::InvalidFormat.to_string(), "invalid zipcode");
        assert_eq!(ProviderError::MissingCredential.to_string(), "WEATHER_API_KEY is not set");
        assert_eq!(
            ProviderError::UpstreamStatus(StatusCode::NOT_FOUND).to_string(),
            "status code: 404"
        );
        assert_eq!(
            ProviderError::NoResults.to_string(),
            "no cities found for the given search term"
        );
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);

        assert!(cut.len() <= 200);
        assert!(cut.chars().all(|c| c == 'é'));
        assert_eq!(truncate_body("short"), "short");
    }
}
