//! HTTP handlers for the weather endpoints and pages.

use axum::{
    Form, Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use weather_core::{
    Alert, ChartField, Coordinates, ForecastEntry, HistoryFilter, HistoryRow, WeatherError,
    WeatherRecord, alert, chart, store,
};

use crate::{
    AppState,
    error::{AppError, AppResult, FORECAST_FAILED},
    pages::Page,
};

/// Form body carrying a city name.
#[derive(Debug, Deserialize)]
pub struct CityForm {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    pub parameter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub success: bool,
    pub data: WeatherRecord,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub success: bool,
    pub forecast: Vec<ForecastEntry>,
}

#[derive(Debug, Serialize)]
pub struct CoordinatesResponse {
    pub success: bool,
    pub coordinates: Coordinates,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub success: bool,
    pub graph: String,
}

fn required_city(city: Option<String>) -> AppResult<String> {
    city.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("City name is required".to_string()))
}

fn render_page(state: &AppState, page: Page) -> AppResult<Html<String>> {
    let rows = state.store.read_all()?;
    state
        .pages
        .render(page, &rows)
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")))
}

/// Form and recent history
pub async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    render_page(&state, Page::Index)
}

pub async fn history_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    render_page(&state, Page::History)
}

pub async fn graphs_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    render_page(&state, Page::Graphs)
}

/// Fetch current conditions, evaluate alerts and append the lookup to history
pub async fn fetch_weather(
    State(state): State<AppState>,
    Form(form): Form<CityForm>,
) -> AppResult<Json<WeatherResponse>> {
    let city = required_city(form.city)?;

    let record = state.provider.fetch_current(&city).await?;
    let alerts = alert::evaluate(&record);

    state
        .store
        .append(&record)
        .map_err(|e| AppError::Persistence(format!("Failed to save weather data: {e}")))?;

    tracing::info!(city = %record.city, alerts = alerts.len(), "weather lookup stored");

    Ok(Json(WeatherResponse {
        success: true,
        data: record,
        alerts,
    }))
}

/// Fetch the short-range forecast. Nothing is stored.
pub async fn fetch_forecast(
    State(state): State<AppState>,
    Form(form): Form<CityForm>,
) -> AppResult<Json<ForecastResponse>> {
    let city = required_city(form.city)?;

    let forecast = state
        .provider
        .fetch_forecast(&city)
        .await
        .map_err(AppError::upstream(FORECAST_FAILED))?;

    Ok(Json(ForecastResponse {
        success: true,
        forecast,
    }))
}

pub async fn clear_history(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    state
        .store
        .clear()
        .map_err(|e| AppError::Persistence(format!("Failed to clear history: {e}")))?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Weather history cleared successfully!".to_string(),
    }))
}

/// Filter history by city substring and inclusive date range
pub async fn filter_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<Vec<HistoryRow>>> {
    let rows = state.store.read_all()?;
    Ok(Json(store::filter(rows, &filter)))
}

pub async fn get_city_coordinates(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> AppResult<Json<CoordinatesResponse>> {
    let city = required_city(query.city)?;

    let coordinates = state.provider.geocode(&city).await.map_err(|e| match e {
        WeatherError::NotFound(_) => AppError::NotFound("City not found".to_string()),
        other => AppError::Upstream {
            message: format!("Failed to get coordinates: {other}"),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            source: other,
        },
    })?;

    Ok(Json(CoordinatesResponse {
        success: true,
        coordinates,
    }))
}

pub async fn get_history(State(state): State<AppState>) -> AppResult<Json<Vec<HistoryRow>>> {
    Ok(Json(state.store.read_all()?))
}

/// Render one history column as a base64 PNG chart
pub async fn generate_graph(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<GraphResponse>> {
    let field = ChartField::try_from(query.parameter.as_deref().unwrap_or("temperature"))?;

    let rows = state.store.read_all()?;
    if rows.is_empty() {
        return Err(AppError::Graph("No data available for graphing".to_string()));
    }

    let png = tokio::task::spawn_blocking(move || chart::render(field, &rows))
        .await
        .map_err(|e| AppError::Internal(format!("chart task failed: {e}")))?
        .map_err(|e| AppError::Graph(format!("Failed to generate graph: {e}")))?
        .ok_or_else(|| AppError::Graph("Failed to generate graph".to_string()))?;

    Ok(Json(GraphResponse {
        success: true,
        graph: STANDARD.encode(png),
    }))
}

/// Export the raw history file
pub async fn download_csv(State(state): State<AppState>) -> AppResult<Response> {
    let bytes = state
        .store
        .raw()?
        .ok_or_else(|| AppError::NotFound("No data file found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"weather_data.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
