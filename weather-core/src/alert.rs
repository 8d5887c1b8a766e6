//! Threshold alerts derived from a current-conditions record.

use serde::{Deserialize, Serialize};

use crate::model::WeatherRecord;

const VERY_HOT_C: f64 = 35.0;
const HOT_C: f64 = 30.0;
const FREEZING_C: f64 = 0.0;
const HUMID_PCT: f64 = 80.0;
const DRY_PCT: f64 = 30.0;
const STRONG_WIND_MPS: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub icon: String,
}

impl Alert {
    fn new(kind: AlertKind, message: String, icon: &str) -> Self {
        Self {
            kind,
            message,
            icon: icon.to_string(),
        }
    }
}

/// Alerts for `record`, ordered temperature, humidity, wind.
pub fn evaluate(record: &WeatherRecord) -> Vec<Alert> {
    [
        temperature_alert(record.temperature),
        humidity_alert(record.humidity),
        wind_alert(record.wind_speed),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn temperature_alert(t: f64) -> Option<Alert> {
    if t > VERY_HOT_C {
        Some(Alert::new(
            AlertKind::Danger,
            format!("🌡️ High Temperature Alert: {t}°C is very hot!"),
            "fas fa-thermometer-full",
        ))
    } else if t < FREEZING_C {
        Some(Alert::new(
            AlertKind::Warning,
            format!("🧊 Freezing Alert: {t}°C is below freezing!"),
            "fas fa-snowflake",
        ))
    } else if t > HOT_C {
        Some(Alert::new(
            AlertKind::Info,
            format!("☀️ Hot Weather: {t}°C - Stay hydrated!"),
            "fas fa-sun",
        ))
    } else {
        None
    }
}

fn humidity_alert(h: f64) -> Option<Alert> {
    if h > HUMID_PCT {
        Some(Alert::new(
            AlertKind::Info,
            format!("💧 High Humidity: {h}% - Very humid conditions"),
            "fas fa-tint",
        ))
    } else if h < DRY_PCT {
        Some(Alert::new(
            AlertKind::Warning,
            format!("🏜️ Low Humidity: {h}% - Dry conditions"),
            "fas fa-mountain",
        ))
    } else {
        None
    }
}

fn wind_alert(speed: f64) -> Option<Alert> {
    (speed > STRONG_WIND_MPS).then(|| {
        Alert::new(
            AlertKind::Warning,
            format!("💨 Strong Winds: {speed} m/s - Be cautious!"),
            "fas fa-wind",
        )
    })
}
