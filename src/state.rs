//! Application state management
//!
//! Central state container: the reading buffer, the plan repository, the
//! in-app alert feed, user settings and WebSocket client bookkeeping. Held
//! behind an `Arc<RwLock<_>>` by the server; the watcher is the single
//! writer of plan verdict history.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::models::{UserSettings, WeatherReading};
use crate::notify::AlertEvent;
use crate::plans::PlanStore;

/// Maximum number of readings to keep in memory
const MAX_READINGS: usize = 3600; // 1 hour at 1 reading/second

/// Maximum number of alert events kept in the in-app feed
const MAX_ALERTS: usize = 200;

/// Central application state
#[derive(Debug)]
pub struct AppState {
    /// Circular buffer of weather readings
    readings: VecDeque<WeatherReading>,
    /// Watched plans and their verdict histories
    pub plan_store: PlanStore,
    /// In-app alert feed, newest kept
    alerts: VecDeque<AlertEvent>,
    /// Profile, notification and unit preferences
    pub settings: UserSettings,
    /// Application start time
    start_time: DateTime<Utc>,
    /// Total readings processed
    total_readings: u64,
    /// Connected WebSocket clients
    connected_clients: Vec<String>,
}

impl AppState {
    /// Create new application state
    pub fn new() -> Self {
        info!("Initializing application state");
        Self {
            readings: VecDeque::with_capacity(MAX_READINGS),
            plan_store: PlanStore::new(),
            alerts: VecDeque::new(),
            settings: UserSettings::default(),
            start_time: Utc::now(),
            total_readings: 0,
            connected_clients: Vec::new(),
        }
    }

    /// Add a new weather reading to the buffer
    pub fn add_reading(&mut self, reading: WeatherReading) {
        self.total_readings += 1;

        // Remove oldest reading if at capacity
        if self.readings.len() >= MAX_READINGS {
            self.readings.pop_front();
        }

        debug!(
            reading_id = %reading.id,
            total = self.total_readings,
            "Adding weather reading to state"
        );

        self.readings.push_back(reading);
    }

    /// Get the latest weather reading
    pub fn get_latest(&self) -> Option<&WeatherReading> {
        self.readings.back()
    }

    /// Get readings from the last N minutes. A window too large to represent
    /// as a time delta covers the whole buffer.
    pub fn get_last_minutes(&self, minutes: i64) -> Vec<&WeatherReading> {
        let cutoff = Duration::try_minutes(minutes)
            .and_then(|window| Utc::now().checked_sub_signed(window));

        match cutoff {
            Some(cutoff) => self
                .readings
                .iter()
                .filter(|r| r.timestamp >= cutoff)
                .collect(),
            None => self.readings.iter().collect(),
        }
    }

    /// Get statistics about the buffered readings. Each field is summarized
    /// over the readings that actually carry it; a field no reading carries
    /// yields no summary.
    pub fn get_statistics(&self) -> ReadingStatistics {
        let collect = |f: fn(&WeatherReading) -> Option<f64>| -> Vec<f64> {
            self.readings.iter().filter_map(f).collect()
        };

        ReadingStatistics {
            count: self.readings.len(),
            wind_speed: summarize(&collect(|r| r.wind_speed)),
            temperature: summarize(&collect(|r| r.temperature)),
            humidity: summarize(&collect(|r| r.humidity)),
            rain_chance: summarize(&collect(|r| r.rain_chance)),
            pressure: summarize(&collect(|r| r.pressure)),
        }
    }

    /// Push an alert event onto the in-app feed
    pub fn push_alert(&mut self, event: AlertEvent) {
        if self.alerts.len() >= MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(event);
    }

    /// Alert feed, newest first
    pub fn recent_alerts(&self) -> Vec<&AlertEvent> {
        self.alerts.iter().rev().collect()
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds() as u64
    }

    /// Get total readings processed
    pub fn total_readings(&self) -> u64 {
        self.total_readings
    }

    /// Get the timestamp of the latest reading
    pub fn last_reading_time(&self) -> Option<DateTime<Utc>> {
        self.readings.back().map(|r| r.timestamp)
    }

    /// Register a new WebSocket client
    pub fn add_client(&mut self, client_id: String) {
        info!(client_id = %client_id, "WebSocket client connected");
        self.connected_clients.push(client_id);
    }

    /// Remove a WebSocket client
    pub fn remove_client(&mut self, client_id: &str) {
        info!(client_id = %client_id, "WebSocket client disconnected");
        self.connected_clients.retain(|id| id != client_id);
    }

    /// Get count of connected clients
    pub fn client_count(&self) -> usize {
        self.connected_clients.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one field across the readings that carry it
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct FieldStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

fn summarize(values: &[f64]) -> Option<FieldStats> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(FieldStats {
        avg: sum / values.len() as f64,
        min: values.iter().copied().fold(f64::MAX, f64::min),
        max: values.iter().copied().fold(f64::MIN, f64::max),
    })
}

/// Statistical summary of the reading buffer
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReadingStatistics {
    pub count: usize,
    pub wind_speed: Option<FieldStats>,
    pub temperature: Option<FieldStats>,
    pub humidity: Option<FieldStats>,
    pub rain_chance: Option<FieldStats>,
    pub pressure: Option<FieldStats>,
}
