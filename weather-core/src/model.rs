use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeatherError};

/// Column order of the history log.
pub const HISTORY_COLUMNS: [&str; 8] = [
    "city",
    "temperature",
    "humidity",
    "wind_speed",
    "date",
    "time",
    "description",
    "icon",
];

/// One current-conditions lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub date: String,
    pub time: String,
    pub description: String,
    pub icon: String,
}

/// One forecast slot. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: String,
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
    pub state: String,
}

/// A stored history row, kept as text exactly as it sits in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRow {
    pub city: String,
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub date: String,
    pub time: String,
    pub description: String,
    pub icon: String,
}

impl HistoryRow {
    /// Parse a chartable numeric column.
    pub fn numeric(&self, field: ChartField) -> Result<f64> {
        let raw = match field {
            ChartField::Temperature => &self.temperature,
            ChartField::Humidity => &self.humidity,
            ChartField::WindSpeed => &self.wind_speed,
        };

        raw.trim().parse::<f64>().map_err(|_| {
            WeatherError::MalformedRow(format!(
                "{} value '{}' for {} is not a number",
                field, raw, self.city
            ))
        })
    }

    /// Combined `date time` of the lookup.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        let joined = format!("{} {}", self.date, self.time);
        NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S").map_err(|_| {
            WeatherError::MalformedRow(format!("invalid timestamp '{joined}' for {}", self.city))
        })
    }
}

impl From<&WeatherRecord> for HistoryRow {
    fn from(record: &WeatherRecord) -> Self {
        Self {
            city: record.city.clone(),
            temperature: decimal(record.temperature),
            humidity: record.humidity.to_string(),
            wind_speed: decimal(record.wind_speed),
            date: record.date.clone(),
            time: record.time.clone(),
            description: record.description.clone(),
            icon: record.icon.clone(),
        }
    }
}

/// Whole numbers keep one decimal place, so `36.0` is stored as `36.0`.
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Numeric columns that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartField {
    Temperature,
    Humidity,
    WindSpeed,
}

impl ChartField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartField::Temperature => "temperature",
            ChartField::Humidity => "humidity",
            ChartField::WindSpeed => "wind_speed",
        }
    }

    pub const fn all() -> &'static [ChartField] {
        &[
            ChartField::Temperature,
            ChartField::Humidity,
            ChartField::WindSpeed,
        ]
    }

    /// Human title, e.g. "Wind Speed".
    pub fn title(&self) -> &'static str {
        match self {
            ChartField::Temperature => "Temperature",
            ChartField::Humidity => "Humidity",
            ChartField::WindSpeed => "Wind Speed",
        }
    }
}

impl std::fmt::Display for ChartField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ChartField {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "temperature" => Ok(ChartField::Temperature),
            "humidity" => Ok(ChartField::Humidity),
            "wind_speed" => Ok(ChartField::WindSpeed),
            _ => Err(WeatherError::UnknownField(value.to_string())),
        }
    }
}
