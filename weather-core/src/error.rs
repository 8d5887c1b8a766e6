use thiserror::Error;

/// Errors produced by the weather core.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport failure or a non-success status from the provider.
    #[error("weather provider unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider answered, but the body did not have the expected shape.
    #[error("unexpected weather provider response: {0}")]
    UpstreamDataShape(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("history log I/O failed: {0}")]
    Persistence(String),

    /// A stored row could not be converted to typed values.
    #[error("malformed history row: {0}")]
    MalformedRow(String),

    #[error("unknown chart field '{0}'. Supported fields: temperature, humidity, wind_speed.")]
    UnknownField(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),
}

impl WeatherError {
    /// Both upstream kinds are reported to end users as one condition.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            WeatherError::UpstreamUnavailable(_) | WeatherError::UpstreamDataShape(_)
        )
    }
}

impl From<std::io::Error> for WeatherError {
    fn from(err: std::io::Error) -> Self {
        WeatherError::Persistence(err.to_string())
    }
}

impl From<csv::Error> for WeatherError {
    fn from(err: csv::Error) -> Self {
        WeatherError::Persistence(err.to_string())
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
