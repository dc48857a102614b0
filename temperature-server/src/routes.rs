//! `/temperature` endpoint.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use serde::Serialize;
use temperature_core::{ChainError, TemperatureReading, TemperatureService};
use tracing::{debug, warn};

pub fn router(service: TemperatureService) -> Router {
    // Bound to every method so the handler can answer 405 with a JSON body.
    Router::new().route("/temperature", any(temperature)).with_state(service)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Every way a request can end without a reading.
#[derive(Debug)]
enum ApiError {
    MethodNotAllowed,
    MissingZipcode,
    Pipeline(ChainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
            }
            ApiError::MissingZipcode => (StatusCode::BAD_REQUEST, "invalid zipcode".to_string()),
            ApiError::Pipeline(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

async fn temperature(
    State(service): State<TemperatureService>,
    method: Method,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TemperatureReading>, ApiError> {
    if method != Method::GET {
        debug!(%method, "rejecting non-GET request");
        return Err(ApiError::MethodNotAllowed);
    }

    // First occurrence wins when `cep` is repeated.
    let cep = params
        .iter()
        .find(|(name, _)| name == "cep")
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::MissingZipcode)?;

    match service.temperature_by_postal_code(cep).await {
        Ok(reading) => Ok(Json(reading)),
        Err(err) => {
            warn!(%cep, stage = %err.stage(), error = %err, "temperature request failed");
            Err(ApiError::Pipeline(err))
        }
    }
}
