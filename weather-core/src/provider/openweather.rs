use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::ProviderConfig,
    error::{Result, WeatherError},
    model::{Coordinates, ForecastEntry, WeatherRecord},
};

use super::{FORECAST_SLOTS, WeatherProvider};

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    current_url: String,
    forecast_url: String,
    geocode_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, config: &ProviderConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build OpenWeather HTTP client")?;

        Ok(Self {
            api_key,
            current_url: config.current_url.clone(),
            forecast_url: config.forecast_url.clone(),
            geocode_url: config.geocode_url.clone(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                WeatherError::UpstreamUnavailable(format!(
                    "failed to send OpenWeather {what} request: {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::UpstreamUnavailable(format!(
                "failed to read OpenWeather {what} response body: {e}"
            ))
        })?;

        if !status.is_success() {
            tracing::warn!(%status, body = %truncate_body(&body), "OpenWeather {what} request failed");
            return Err(WeatherError::UpstreamUnavailable(format!(
                "OpenWeather {what} request failed with status {status}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, body = %truncate_body(&body), "unexpected OpenWeather {what} JSON");
            WeatherError::UpstreamDataShape(format!("failed to parse OpenWeather {what} JSON: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, city: &str) -> Result<WeatherRecord> {
        let parsed: OwCurrentResponse = self
            .get_json(
                "current weather",
                &self.current_url,
                &[("q", city), ("units", "metric")],
            )
            .await?;

        let condition = first_condition(&parsed.weather)?;
        let now = Local::now();

        Ok(WeatherRecord {
            city: parsed.name,
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            description: condition.description.clone(),
            icon: condition.icon.clone(),
        })
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastEntry>> {
        let parsed: OwForecastResponse = self
            .get_json(
                "forecast",
                &self.forecast_url,
                &[("q", city), ("units", "metric")],
            )
            .await?;

        parsed
            .list
            .iter()
            .take(FORECAST_SLOTS)
            .map(|entry| -> Result<ForecastEntry> {
                let at = unix_to_local(entry.dt)?;
                let condition = first_condition(&entry.weather)?;
                Ok(ForecastEntry {
                    date: at.format("%Y-%m-%d").to_string(),
                    time: at.format("%H:%M").to_string(),
                    temperature: entry.main.temp,
                    humidity: entry.main.humidity,
                    wind_speed: entry.wind.speed,
                    description: condition.description.clone(),
                    icon: condition.icon.clone(),
                })
            })
            .collect()
    }

    async fn geocode(&self, city: &str) -> Result<Coordinates> {
        let parsed: Vec<OwGeoEntry> = self
            .get_json("geocoding", &self.geocode_url, &[("q", city), ("limit", "1")])
            .await?;

        let place = parsed
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(format!("City '{city}'")))?;

        Ok(Coordinates {
            lat: place.lat,
            lon: place.lon,
            name: place.name,
            country: place.country.unwrap_or_default(),
            state: place.state.unwrap_or_default(),
        })
    }
}

fn first_condition(weather: &[OwWeather]) -> Result<&OwWeather> {
    weather.first().ok_or_else(|| {
        WeatherError::UpstreamDataShape("OpenWeather response contained no weather conditions".into())
    })
}

fn unix_to_local(ts: i64) -> Result<DateTime<Local>> {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| WeatherError::UpstreamDataShape(format!("invalid forecast timestamp {ts}")))
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
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    async fn provider(server: &MockServer) -> OpenWeatherProvider {
        let config = ProviderConfig {
            api_key: None,
            current_url: format!("{}/data/2.5/weather", server.uri()),
            forecast_url: format!("{}/data/2.5/forecast", server.uri()),
            geocode_url: format!("{}/geo/1.0/direct", server.uri()),
            timeout_secs: 5,
        };
        OpenWeatherProvider::new("TEST_KEY".into(), &config).unwrap()
    }

    fn forecast_slot(dt: i64, temp: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "main": { "temp": temp, "humidity": 70 },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 4.2 }
        })
    }

    #[tokio::test]
    async fn fetch_current_maps_provider_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "paris"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "dt": 1,
                "main": { "temp": 36.4, "humidity": 20, "feels_like": 38.0 },
                "weather": [{ "description": "clear sky", "icon": "01d" }],
                "wind": { "speed": 20.5 }
            })))
            .mount(&server)
            .await;

        let record = provider(&server).await.fetch_current("paris").await.unwrap();

        assert_eq!(record.city, "Paris");
        assert_eq!(record.temperature, 36.4);
        assert_eq!(record.humidity, 20.0);
        assert_eq!(record.wind_speed, 20.5);
        assert_eq!(record.description, "clear sky");
        assert_eq!(record.icon, "01d");
        assert_eq!(record.date.len(), "2024-01-01".len());
        assert_eq!(record.time.len(), "12:00:00".len());
    }

    #[tokio::test]
    async fn fetch_current_missing_field_is_shape_error() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "main": { "temp": 20.0 },
                "weather": [],
                "wind": { "speed": 1.0 }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).await.fetch_current("paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamDataShape(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn fetch_current_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).await.fetch_current("atlantis").await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn fetch_forecast_takes_first_eight_slots() {
        let server = MockServer::start().await;
        let list: Vec<_> = (0..12)
            .map(|i| forecast_slot(1_700_000_000 + i * 10_800, 10.0 + i as f64))
            .collect();
        Mock::given(path("/data/2.5/forecast"))
            .and(query_param("q", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "city": { "name": "Oslo", "country": "NO" },
                "list": list
            })))
            .mount(&server)
            .await;

        let forecast = provider(&server).await.fetch_forecast("Oslo").await.unwrap();

        assert_eq!(forecast.len(), FORECAST_SLOTS);
        assert_eq!(forecast[0].temperature, 10.0);
        assert_eq!(forecast[7].temperature, 17.0);
        assert_eq!(forecast[0].time.len(), "09:00".len());
        assert_eq!(forecast[0].description, "light rain");
    }

    #[tokio::test]
    async fn fetch_forecast_short_list_is_kept() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [forecast_slot(1_700_000_000, 5.0)]
            })))
            .mount(&server)
            .await;

        let forecast = provider(&server).await.fetch_forecast("Oslo").await.unwrap();
        assert_eq!(forecast.len(), 1);
    }

    #[tokio::test]
    async fn geocode_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .and(query_param("q", "Springfield"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "Springfield",
                "lat": 39.7990,
                "lon": -89.6440,
                "country": "US",
                "state": "Illinois"
            }])))
            .mount(&server)
            .await;

        let coords = provider(&server).await.geocode("Springfield").await.unwrap();
        assert_eq!(coords.name, "Springfield");
        assert_eq!(coords.state, "Illinois");
        assert_eq!(coords.lat, 39.799);
    }

    #[tokio::test]
    async fn geocode_missing_optional_fields_default_to_empty() {
        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "Monaco", "lat": 43.73, "lon": 7.42
            }])))
            .mount(&server)
            .await;

        let coords = provider(&server).await.geocode("Monaco").await.unwrap();
        assert_eq!(coords.country, "");
        assert_eq!(coords.state, "");
    }

    #[tokio::test]
    async fn geocode_empty_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = provider(&server).await.geocode("Nowhere").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_unavailable() {
        let server = MockServer::start().await;
        let provider = provider(&server).await;
        drop(server);

        let err = provider.geocode("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamUnavailable(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);
        assert!(cut.len() <= 200);
        assert!(body.starts_with(cut));
    }
}
