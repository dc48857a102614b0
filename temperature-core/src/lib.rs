//! Core library for the `temperature-server` binary.
//!
//! This crate defines:
//! - Configuration & credential handling
//! - Clients for ViaCEP (postal lookup) and WeatherAPI.com (place search, current weather)
//! - Temperature unit conversions
//! - The orchestrating [`TemperatureService`]

pub mod config;
pub mod convert;
pub mod model;
pub mod provider;
pub mod service;

pub use config::Config;
pub use model::{Address, PlaceMatch, TemperatureReading, WeatherSnapshot};
pub use provider::{CurrentWeather, PlaceSearch, PostalLookup, ProviderError};
pub use service::{ChainError, Stage, TemperatureService};
