//! Simulated weather feed
//!
//! ══════════════════════════════════════════════════════════════════════════════
//! SINGLE SOURCE OF WEATHER DATA
//! ══════════════════════════════════════════════════════════════════════════════
//!
//! Generates realistic weather readings for development and demos. It is the
//! single source of readings in the system; when a real provider is
//! connected, this module is replaced by a fetch/ingest client without
//! changing anything downstream (state, watcher, WebSocket, handlers).
//!
//! The generated data follows realistic patterns:
//! - daily temperature cycle with Gaussian noise
//! - humidity inversely correlated with temperature
//! - gusty wind over a slowly drifting baseline
//! - rain fronts that arrive, persist and decay, raising rain chance and
//!   cloud cover while cutting visibility and pressure
//! - UV following the daylight cycle, attenuated by cloud cover
//! - storm flag when a strong front coincides with high wind

use chrono::Utc;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::WeatherReading;
use crate::state::AppState;
use crate::validation::FieldBounds;

/// Simulated feed producing one reading per tick
pub struct WeatherFeed {
    /// Interval between readings in milliseconds
    interval_ms: u64,
    /// Baseline air temperature (°C)
    base_temperature: f64,
    /// Baseline relative humidity (%)
    base_humidity: f64,
    /// Baseline wind speed (km/h)
    base_wind: f64,
    /// Baseline barometric pressure (hPa)
    base_pressure: f64,
    /// Current rain front strength, 0.0 = clear sky
    front_intensity: f64,
    /// Time drift factor driving the daily cycles
    drift_factor: f64,
}

impl WeatherFeed {
    pub fn new(interval_ms: u64) -> Self {
        info!(interval_ms = interval_ms, "Initializing simulated weather feed");

        Self {
            interval_ms,
            base_temperature: 24.0, // Mild coastal day
            base_humidity: 55.0,
            base_wind: 14.0,
            base_pressure: 1013.0,
            front_intensity: 0.0,
            drift_factor: 0.0,
        }
    }

    /// Run the feed continuously, storing each reading into shared state.
    pub async fn run(mut self, state: Arc<RwLock<AppState>>) {
        info!("Starting weather feed loop");

        let mut tick_interval = interval(Duration::from_millis(self.interval_ms));
        let mut rng = rand::thread_rng();
        let mut tick_count: u64 = 0;

        loop {
            tick_interval.tick().await;
            tick_count += 1;

            let reading = self.tick(&mut rng);

            debug!(
                tick = tick_count,
                wind = ?reading.wind_speed,
                rain = ?reading.rain_chance,
                temperature = ?reading.temperature,
                cloud = ?reading.cloud_cover,
                "Generated weather reading"
            );

            // Store reading in application state
            {
                let mut app_state = state.write().await;
                app_state.add_reading(reading.clone());
            }

            // Log hazardous conditions periodically
            if tick_count % 60 == 0 {
                let hazards = reading.hazard_flags();
                let active = hazards.active_count();
                if active > 0 {
                    warn!(
                        active_hazards = active,
                        heavy_rain = hazards.heavy_rain,
                        storm = hazards.storm,
                        strong_wind = hazards.strong_wind,
                        extreme_heat = hazards.extreme_heat,
                        extreme_cold = hazards.extreme_cold,
                        "Hazardous weather conditions detected"
                    );
                }
            }

            // Occasionally shift the climate baselines
            if tick_count % 300 == 0 {
                self.base_temperature =
                    (self.base_temperature + rng.gen_range(-1.0..1.0)).clamp(12.0, 32.0);
                self.base_wind = (self.base_wind + rng.gen_range(-3.0..3.0)).clamp(2.0, 35.0);
                self.base_humidity =
                    (self.base_humidity + rng.gen_range(-5.0..5.0)).clamp(35.0, 75.0);

                info!(
                    new_base_temp = self.base_temperature,
                    new_base_wind = self.base_wind,
                    new_base_humidity = self.base_humidity,
                    "Weather baseline shift simulated"
                );
            }
        }
    }

    /// Advance the simulation one step and synthesize a reading.
    fn tick(&mut self, rng: &mut impl Rng) -> WeatherReading {
        let temp_noise = Normal::new(0.0, 0.5).unwrap();
        let humidity_noise = Normal::new(0.0, 2.0).unwrap();
        let wind_noise = Normal::new(0.0, 2.5).unwrap();
        let pressure_noise = Normal::new(0.0, 0.6).unwrap();
        let cloud_noise = Normal::new(0.0, 5.0).unwrap();
        let rain_noise = Normal::new(0.0, 4.0).unwrap();

        // Gradual cycle driver, wraps roughly every ten minutes at 1s ticks
        self.drift_factor += 0.01;
        if self.drift_factor > std::f64::consts::PI * 2.0 {
            self.drift_factor = 0.0;
        }

        // Rain fronts arrive rarely, persist and decay slowly
        if self.front_intensity <= 0.0 {
            if rng.gen::<f64>() < 0.004 {
                self.front_intensity = rng.gen_range(0.4..1.0);
                info!(intensity = self.front_intensity, "Rain front arriving");
            }
        } else {
            self.front_intensity -= 0.002;
            if self.front_intensity < 0.05 {
                self.front_intensity = 0.0;
                info!("Rain front cleared");
            }
        }
        let front = self.front_intensity;

        // Temperature: daily swing around the baseline, fronts cool it down
        let temp_drift = (self.drift_factor * 0.5).sin() * 4.0;
        let temperature = (self.base_temperature + temp_drift - front * 3.0
            + temp_noise.sample(rng))
        .clamp(FieldBounds::TEMP_MIN, FieldBounds::TEMP_MAX);

        // Humidity: inversely correlated with the temperature swing,
        // pushed up by an active front
        let humidity = (self.base_humidity - temp_drift * 2.0 + front * 20.0
            + humidity_noise.sample(rng))
        .clamp(FieldBounds::HUMIDITY_MIN, FieldBounds::HUMIDITY_MAX);

        // Wind: drifting baseline with occasional gusts
        let gust = if rng.gen::<f64>() < 0.05 {
            rng.gen_range(5.0..20.0)
        } else {
            0.0
        };
        let wind = (self.base_wind + (self.drift_factor * 1.3).sin() * 4.0 + gust
            + wind_noise.sample(rng))
        .clamp(FieldBounds::WIND_MIN, FieldBounds::WIND_MAX);

        // Cloud cover: fair-weather drift plus the front's deck
        let cloud = (15.0 + (self.drift_factor * 0.8).sin() * 15.0 + front * 65.0
            + cloud_noise.sample(rng))
        .clamp(FieldBounds::CLOUD_MIN, FieldBounds::CLOUD_MAX);

        // Rain chance: low background noise, dominated by the front
        let rain_chance = if front > 0.0 {
            20.0 + front * 75.0 + rain_noise.sample(rng)
        } else {
            rain_noise.sample(rng).abs() + cloud * 0.1
        }
        .clamp(FieldBounds::RAIN_MIN, FieldBounds::RAIN_MAX);

        // Visibility drops inside a front
        let visibility = (28.0 - front * 22.0 + pressure_noise.sample(rng))
            .clamp(FieldBounds::VISIBILITY_MIN, FieldBounds::VISIBILITY_MAX);

        // Pressure: slow drift, falls as a front moves through
        let pressure = (self.base_pressure + (self.drift_factor * 0.3).sin() * 3.0
            - front * 10.0
            + pressure_noise.sample(rng))
        .clamp(FieldBounds::PRESSURE_MIN, FieldBounds::PRESSURE_MAX);

        // UV follows the daylight cycle, attenuated by cloud
        let daylight = self.drift_factor.sin().max(0.0);
        let uv = (daylight * 11.0 * (1.0 - 0.7 * cloud / 100.0))
            .clamp(FieldBounds::UV_MIN, FieldBounds::UV_MAX);

        // Apparent temperature: humidity makes heat worse, wind makes cold worse
        let mut feels_like = temperature;
        if temperature >= 26.0 {
            feels_like += (humidity - 50.0).max(0.0) * 0.08;
        }
        if temperature <= 12.0 {
            feels_like -= (wind * 0.1).min(6.0);
        }
        let feels_like = feels_like.clamp(FieldBounds::FEELS_LIKE_MIN, FieldBounds::FEELS_LIKE_MAX);

        let storm = front > 0.7 && wind > 35.0;

        WeatherReading {
            id: Uuid::new_v4(),
            wind_speed: Some(round1(wind)),
            rain_chance: Some(round1(rain_chance)),
            temperature: Some(round1(temperature)),
            feels_like: Some(round1(feels_like)),
            humidity: Some(round1(humidity)),
            visibility: Some(round1(visibility)),
            pressure: Some(round1(pressure)),
            uv_index: Some(round1(uv)),
            cloud_cover: Some(round1(cloud)),
            storm: Some(storm),
            timestamp: Utc::now(),
            correlation_id: Some(Uuid::new_v4().to_string()),
        }
    }
}

/// One-decimal precision, matching what a provider API would serve
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
