//! Request validation shared by the HTTP surface
//!
//! Weather quantities are checked against the physical bounds the simulated
//! feed also clamps to, including finite-number guarantees JSON alone cannot
//! give. The plan DTOs carry `validator` derives for their structural checks.

use crate::error::{AppError, AppResult};
use crate::models::WeatherReading;

/// Physical bounds for every weather field.
///
/// Single source of truth shared by ingest validation and the feed's
/// clamping.
pub struct FieldBounds;

impl FieldBounds {
    pub const WIND_MIN: f64 = 0.0;
    pub const WIND_MAX: f64 = 200.0;
    pub const RAIN_MIN: f64 = 0.0;
    pub const RAIN_MAX: f64 = 100.0;
    pub const TEMP_MIN: f64 = -60.0;
    pub const TEMP_MAX: f64 = 60.0;
    pub const FEELS_LIKE_MIN: f64 = -70.0;
    pub const FEELS_LIKE_MAX: f64 = 70.0;
    pub const HUMIDITY_MIN: f64 = 0.0;
    pub const HUMIDITY_MAX: f64 = 100.0;
    pub const VISIBILITY_MIN: f64 = 0.0;
    pub const VISIBILITY_MAX: f64 = 100.0;
    pub const PRESSURE_MIN: f64 = 870.0;
    pub const PRESSURE_MAX: f64 = 1085.0;
    pub const UV_MIN: f64 = 0.0;
    pub const UV_MAX: f64 = 16.0;
    pub const CLOUD_MIN: f64 = 0.0;
    pub const CLOUD_MAX: f64 = 100.0;
}

/// Maximum page size for history queries
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Largest history window a query may request, in minutes
pub const MAX_HISTORY_MINUTES: i64 = 1440;

/// Maximum accepted length for plan and participant names
pub const MAX_NAME_LENGTH: usize = 120;

/// Semantic check for an incoming reading: every present field must be a
/// finite number inside its physical range. Absent fields are fine; the
/// evaluator handles absence explicitly.
pub fn validate_reading(reading: &WeatherReading) -> AppResult<()> {
    let fields = [
        ("wind_speed", reading.wind_speed, FieldBounds::WIND_MIN, FieldBounds::WIND_MAX),
        ("rain_chance", reading.rain_chance, FieldBounds::RAIN_MIN, FieldBounds::RAIN_MAX),
        ("temperature", reading.temperature, FieldBounds::TEMP_MIN, FieldBounds::TEMP_MAX),
        ("feels_like", reading.feels_like, FieldBounds::FEELS_LIKE_MIN, FieldBounds::FEELS_LIKE_MAX),
        ("humidity", reading.humidity, FieldBounds::HUMIDITY_MIN, FieldBounds::HUMIDITY_MAX),
        ("visibility", reading.visibility, FieldBounds::VISIBILITY_MIN, FieldBounds::VISIBILITY_MAX),
        ("pressure", reading.pressure, FieldBounds::PRESSURE_MIN, FieldBounds::PRESSURE_MAX),
        ("uv_index", reading.uv_index, FieldBounds::UV_MIN, FieldBounds::UV_MAX),
        ("cloud_cover", reading.cloud_cover, FieldBounds::CLOUD_MIN, FieldBounds::CLOUD_MAX),
    ];

    for (name, value, min, max) in fields {
        let Some(value) = value else { continue };
        if !value.is_finite() {
            return Err(AppError::ValidationError(format!(
                "{name} must be a finite number"
            )));
        }
        if value < min || value > max {
            return Err(AppError::ValidationError(format!(
                "{name} {value} is outside the physical range [{min}, {max}]"
            )));
        }
    }

    Ok(())
}

/// Resolve and guard history pagination parameters.
pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> AppResult<(u32, u32)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(100);

    if page == 0 {
        return Err(AppError::BadRequest("page starts at 1".to_string()));
    }
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be at least 1".to_string()));
    }
    if limit as usize > MAX_PAGE_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must not exceed {MAX_PAGE_LIMIT}"
        )));
    }
    Ok((page, limit))
}

/// Resolve and guard the history window length in minutes.
pub fn validate_minutes(minutes: Option<i64>) -> AppResult<i64> {
    let minutes = minutes.unwrap_or(60);

    if minutes < 1 {
        return Err(AppError::BadRequest(
            "minutes must be at least 1".to_string(),
        ));
    }
    if minutes > MAX_HISTORY_MINUTES {
        return Err(AppError::BadRequest(format!(
            "minutes must not exceed {MAX_HISTORY_MINUTES}"
        )));
    }
    Ok(minutes)
}

/// Non-empty trimmed name guard shared by plan and participant creation.
pub fn validate_name(name: &str, what: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError(format!(
            "{what} name must not be empty"
        )));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::ValidationError(format!(
            "{what} name must not exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}
