use crate::{
    Config,
    error::Result,
    model::{Coordinates, ForecastEntry, WeatherRecord},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Number of forecast slots returned per query.
///
/// With the provider's 3-hour interval this covers roughly the next 24 hours.
/// If the provider changes its interval the coverage changes with it.
pub const FORECAST_SLOTS: usize = 8;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`, stamped with the local clock.
    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord>;

    /// The next [`FORECAST_SLOTS`] forecast entries for `city`.
    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastEntry>>;

    /// Best geocoding match for `city`.
    async fn geocode(&self, city: &str) -> Result<Coordinates>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::new(api_key.to_owned(), &config.openweather)?;
    Ok(Arc::new(provider))
}
