//! Error handling for the web surface.
//!
//! Every failure is converted to a JSON body of the form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::Level;
use weather_core::WeatherError;

pub const FETCH_FAILED: &str =
    "Failed to fetch weather data. Please check the city name and try again.";
pub const FORECAST_FAILED: &str =
    "Failed to fetch forecast data. Please check the city name and try again.";

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid request input.
    #[error("{0}")]
    Validation(String),

    /// Upstream failures. The user sees `message`, the log gets `source`.
    #[error("{message}")]
    Upstream {
        message: String,
        status: StatusCode,
        #[source]
        source: WeatherError,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Persistence(String),

    /// Chart generation failures.
    #[error("{0}")]
    Graph(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Collapse an upstream failure into a user-facing 400 with `message`.
    pub fn upstream(message: &str) -> impl FnOnce(WeatherError) -> AppError + '_ {
        move |source| {
            if source.is_upstream() {
                AppError::Upstream {
                    message: message.to_string(),
                    status: StatusCode::BAD_REQUEST,
                    source,
                }
            } else {
                AppError::from(source)
            }
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::UpstreamUnavailable(_) | WeatherError::UpstreamDataShape(_) => {
                AppError::Upstream {
                    message: FETCH_FAILED.to_string(),
                    status: StatusCode::BAD_REQUEST,
                    source: err,
                }
            }
            WeatherError::NotFound(_) => AppError::NotFound(err.to_string()),
            WeatherError::Persistence(_) | WeatherError::MalformedRow(_) => {
                AppError::Persistence(err.to_string())
            }
            WeatherError::UnknownField(_) | WeatherError::Chart(_) => {
                AppError::Graph(err.to_string())
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::Graph(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if log_level(status) == Level::ERROR {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {:?}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Server faults log at `error`, client mistakes and missing data at `warn`.
fn log_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_kinds_collapse_to_generic_message() {
        for err in [
            WeatherError::UpstreamUnavailable("connection refused".into()),
            WeatherError::UpstreamDataShape("missing field `main`".into()),
        ] {
            let app = AppError::from(err);
            assert_eq!(app.to_string(), FETCH_FAILED);
            assert_eq!(app.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn upstream_helper_keeps_non_upstream_errors() {
        let app = AppError::upstream(FORECAST_FAILED)(WeatherError::NotFound("City".into()));
        assert!(matches!(app, AppError::NotFound(_)));

        let app = AppError::upstream(FORECAST_FAILED)(WeatherError::UpstreamUnavailable(
            "timeout".into(),
        ));
        assert_eq!(app.to_string(), FORECAST_FAILED);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Persistence("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Graph("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn only_server_errors_log_at_error_level() {
        assert_eq!(log_level(StatusCode::INTERNAL_SERVER_ERROR), Level::ERROR);
        assert_eq!(log_level(StatusCode::BAD_REQUEST), Level::WARN);
        assert_eq!(log_level(StatusCode::NOT_FOUND), Level::WARN);
    }
}
