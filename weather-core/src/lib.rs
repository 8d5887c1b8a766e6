//! Core library for the weather lookup service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherProvider` trait
//! - Threshold alerts, the CSV history log and PNG charts
//!
//! It is used by `weather-web`, but has no dependency on any HTTP framework.

pub mod alert;
pub mod chart;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;

pub use alert::{Alert, AlertKind};
pub use config::{ChartConfig, Config, ProviderConfig, ServerConfig, StorageConfig};
pub use error::WeatherError;
pub use model::{ChartField, Coordinates, ForecastEntry, HistoryRow, WeatherRecord};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{HistoryFilter, HistoryStore};
