//! Data models for weather readings and related structures
//!
//! Defines the core data structures used throughout the application.
//! All magnitudes use fixed units (km/h, °C, %, km, hPa); unit conversion
//! for display lives in [`crate::display`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notify::AlertEvent;

/// A single observed or forecast weather reading.
///
/// Every quantity is optional: a reading only carries what its source
/// measured. Condition evaluation refuses to guess; an absent field that a
/// plan's criterion needs produces a `MissingData` error instead of a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Unique identifier for this reading
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Wind speed (km/h)
    pub wind_speed: Option<f64>,

    /// Precipitation probability for the forecast window (percent)
    pub rain_chance: Option<f64>,

    /// Air temperature (°C)
    pub temperature: Option<f64>,

    /// Apparent ("feels like") temperature (°C)
    pub feels_like: Option<f64>,

    /// Relative humidity (percent)
    pub humidity: Option<f64>,

    /// Horizontal visibility (km)
    pub visibility: Option<f64>,

    /// Barometric pressure (hPa)
    pub pressure: Option<f64>,

    /// UV index
    pub uv_index: Option<f64>,

    /// Cloud cover (percent of sky)
    pub cloud_cover: Option<f64>,

    /// Thunderstorm observed or forecast
    pub storm: Option<bool>,

    /// ISO 8601 timestamp of the reading (defaults to receive time)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Optional correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl WeatherReading {
    /// A reading with no observed quantities and a fresh id/timestamp.
    /// Base for struct-update construction.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            wind_speed: None,
            rain_chance: None,
            temperature: None,
            feels_like: None,
            humidity: None,
            visibility: None,
            pressure: None,
            uv_index: None,
            cloud_cover: None,
            storm: None,
            timestamp: Utc::now(),
            correlation_id: Some(Uuid::new_v4().to_string()),
        }
    }

    /// Coarse hazard flags independent of any plan.
    /// Used for operational logging, not for plan verdicts.
    pub fn hazard_flags(&self) -> HazardFlags {
        HazardFlags {
            heavy_rain: self.rain_chance.is_some_and(|r| r > 70.0),
            storm: self.storm.unwrap_or(false),
            strong_wind: self.wind_speed.is_some_and(|w| w > 50.0),
            extreme_heat: self.temperature.is_some_and(|t| t > 38.0),
            extreme_cold: self.temperature.is_some_and(|t| t < 0.0),
        }
    }
}

/// Hazard flags for a reading (operational, not plan-specific)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardFlags {
    pub heavy_rain: bool,
    pub storm: bool,
    pub strong_wind: bool,
    pub extreme_heat: bool,
    pub extreme_cold: bool,
}

impl HazardFlags {
    /// Count the number of active hazard flags
    pub fn active_count(&self) -> u8 {
        let mut count = 0;
        if self.heavy_rain { count += 1; }
        if self.storm { count += 1; }
        if self.strong_wind { count += 1; }
        if self.extreme_heat { count += 1; }
        if self.extreme_cold { count += 1; }
        count
    }
}

/// Input DTO for weather reading ingestion. Field ranges are enforced by
/// [`crate::validation::validate_reading`] after conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherInput {
    pub wind_speed: Option<f64>,
    pub rain_chance: Option<f64>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub visibility: Option<f64>,
    pub pressure: Option<f64>,
    pub uv_index: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub storm: Option<bool>,

    /// Optional client-provided timestamp (defaults to server time)
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<WeatherInput> for WeatherReading {
    fn from(input: WeatherInput) -> Self {
        WeatherReading {
            wind_speed: input.wind_speed,
            rain_chance: input.rain_chance,
            temperature: input.temperature,
            feels_like: input.feels_like,
            humidity: input.humidity,
            visibility: input.visibility,
            pressure: input.pressure,
            uv_index: input.uv_index,
            cloud_cover: input.cloud_cover,
            storm: input.storm,
            timestamp: input.timestamp.unwrap_or_else(Utc::now),
            ..WeatherReading::empty()
        }
    }
}

/// Temperature display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempUnit {
    Celsius,
    Fahrenheit,
}

/// Wind speed display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    Kmh,
    Knots,
    Ms,
}

/// Account profile of the alert recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
}

/// Delivery preferences consulted by the notification dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    /// Deliver over the WhatsApp channel
    pub whatsapp: bool,
    /// Deliver over the email channel
    pub email: bool,
    /// Only dispatch transitions into `alert`; monitoring/recovery
    /// transitions stay in the in-app feed
    pub critical_only: bool,
    /// Upcoming-plan reminders (stored, not yet scheduled)
    pub reminders: bool,
}

/// Display/unit preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitPreferences {
    pub temp_unit: TempUnit,
    pub speed_unit: SpeedUnit,
    pub location: String,
}

/// User-level settings: profile, delivery preferences and display units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub profile: UserProfile,
    pub notifications: NotificationPrefs,
    pub preferences: UnitPreferences,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            profile: UserProfile {
                name: String::new(),
                email: String::new(),
                whatsapp: String::new(),
            },
            notifications: NotificationPrefs {
                whatsapp: true,
                email: true,
                critical_only: true,
                reminders: false,
            },
            preferences: UnitPreferences {
                temp_unit: TempUnit::Celsius,
                speed_unit: SpeedUnit::Kmh,
                location: String::new(),
            },
        }
    }
}

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// New weather reading available
    WeatherUpdate(WeatherReading),
    /// A plan's verdict transitioned and produced an alert event
    AlertRaised(AlertEvent),
    /// Connection acknowledgment
    Connected { client_id: String },
    /// Error message
    Error { message: String },
    /// Heartbeat/ping
    Ping,
    /// Heartbeat/pong response
    Pong,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub last_reading: Option<DateTime<Utc>>,
    pub plan_count: usize,
}
