//! Condition evaluation core
//!
//! Decides whether a weather reading satisfies a plan's declared condition
//! spec and what status the plan should report. Evaluation is a pure
//! projection of (spec, reading): deterministic, side-effect-free, no shared
//! mutable state, safe to call from any number of tasks concurrently.
//!
//! Each active criterion is classified independently as satisfied, marginal
//! (within a tolerance band beyond a boundary) or violated, then aggregated:
//! a violated criterion the caller's criticality policy marks critical makes
//! the verdict `alert`; any other violation or marginal makes it
//! `monitoring`; otherwise the verdict is `ideal`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{AppError, AppResult};
use crate::models::WeatherReading;

/// Inclusive numeric range; a missing bound leaves that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundedRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl BoundedRange {
    pub fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub fn at_least(min: f64) -> Self {
        Self { min: Some(min), max: None }
    }

    pub fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    /// Bounds must be finite and ordered. Checked when a spec is constructed
    /// or stored, so evaluation never sees an inconsistent range.
    fn check(&self, name: &str) -> AppResult<()> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(AppError::InvalidSpec(format!("{name}: bound must be finite")));
            }
        }
        if let (Some(lo), Some(hi)) = (self.min, self.max) {
            if lo > hi {
                return Err(AppError::InvalidSpec(format!("{name}: min {lo} exceeds max {hi}")));
            }
        }
        Ok(())
    }

    fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }

    /// Distance from the nearest edge when outside the range, 0.0 inside.
    fn distance_outside(&self, value: f64) -> f64 {
        if let Some(lo) = self.min {
            if value < lo {
                return lo - value;
            }
        }
        if let Some(hi) = self.max {
            if value > hi {
                return value - hi;
            }
        }
        0.0
    }

    fn width(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }
}

/// A weather criterion a plan can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Wind,
    Temperature,
    Humidity,
    Visibility,
    Pressure,
    UvIndex,
    FeelsLike,
    CloudCover,
    NoRain,
    Sunny,
    Cloudy,
    NoStorms,
    NoStrongWind,
}

impl Criterion {
    /// Name of the reading field this criterion inspects.
    pub fn field(&self) -> &'static str {
        match self {
            Criterion::Wind | Criterion::NoStrongWind => "wind_speed",
            Criterion::Temperature => "temperature",
            Criterion::Humidity => "humidity",
            Criterion::Visibility => "visibility",
            Criterion::Pressure => "pressure",
            Criterion::UvIndex => "uv_index",
            Criterion::FeelsLike => "feels_like",
            Criterion::CloudCover | Criterion::Sunny | Criterion::Cloudy => "cloud_cover",
            Criterion::NoRain => "rain_chance",
            Criterion::NoStorms => "storm",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::Wind => "wind",
            Criterion::Temperature => "temperature",
            Criterion::Humidity => "humidity",
            Criterion::Visibility => "visibility",
            Criterion::Pressure => "pressure",
            Criterion::UvIndex => "uv_index",
            Criterion::FeelsLike => "feels_like",
            Criterion::CloudCover => "cloud_cover",
            Criterion::NoRain => "no_rain",
            Criterion::Sunny => "sunny",
            Criterion::Cloudy => "cloudy",
            Criterion::NoStorms => "no_storms",
            Criterion::NoStrongWind => "no_strong_wind",
        };
        f.write_str(name)
    }
}

/// Per-criterion classification, in order of increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Satisfied,
    Marginal,
    Violated,
}

/// Plan-level verdict, in order of increasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ideal,
    Monitoring,
    Alert,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verdict::Ideal => "ideal",
            Verdict::Monitoring => "monitoring",
            Verdict::Alert => "alert",
        };
        f.write_str(name)
    }
}

/// Whether a violated criterion escalates the verdict to `alert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Critical,
    Soft,
}

/// Caller-supplied mapping deciding which violated criteria are
/// safety/plan-critical. Plan types weight the same criterion differently:
/// rain is critical for a wedding, wind for a kitesurf competition.
/// Criteria without an entry are soft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalityPolicy {
    levels: HashMap<Criterion, Criticality>,
}

impl CriticalityPolicy {
    /// Empty policy: every criterion is soft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline policy treating the weather-safety criteria as critical.
    pub fn safety_default() -> Self {
        Self::new()
            .critical(Criterion::NoStorms)
            .critical(Criterion::NoStrongWind)
    }

    pub fn critical(mut self, criterion: Criterion) -> Self {
        self.levels.insert(criterion, Criticality::Critical);
        self
    }

    pub fn soft(mut self, criterion: Criterion) -> Self {
        self.levels.insert(criterion, Criticality::Soft);
        self
    }

    pub fn classify(&self, criterion: Criterion) -> Criticality {
        self.levels
            .get(&criterion)
            .copied()
            .unwrap_or(Criticality::Soft)
    }
}

/// A sparse set of weather criteria attached to a plan.
///
/// Every criterion is independently optional; an absent criterion never
/// contributes to failure, and a spec with zero active criteria is satisfied
/// by any reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSpec {
    /// Wind speed range (km/h)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<BoundedRange>,
    /// Air temperature range (°C)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<BoundedRange>,
    /// Relative humidity range (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<BoundedRange>,
    /// Visibility range (km)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<BoundedRange>,
    /// Barometric pressure range (hPa)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<BoundedRange>,
    /// UV index range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv_index: Option<BoundedRange>,
    /// Apparent temperature range (°C)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<BoundedRange>,
    /// Cloud cover range (%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<BoundedRange>,
    /// Rain chance must stay below the negligible-rain threshold
    pub no_rain: bool,
    /// Cloud cover must stay below the sunny threshold
    pub sunny: bool,
    /// Cloud cover must reach the overcast threshold
    pub cloudy: bool,
    /// No thunderstorm observed or forecast
    pub no_storms: bool,
    /// Wind speed must stay below the strong-wind threshold
    pub no_strong_wind: bool,
}

impl ConditionSpec {
    /// Reject inconsistent bounds. Called at construction/storage time so
    /// stored specs are always valid; `evaluate` re-checks cheaply.
    pub fn validate(&self) -> AppResult<()> {
        let ranges = [
            ("wind", self.wind),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("visibility", self.visibility),
            ("pressure", self.pressure),
            ("uv_index", self.uv_index),
            ("feels_like", self.feels_like),
            ("cloud_cover", self.cloud_cover),
        ];
        for (name, range) in ranges {
            if let Some(range) = range {
                range.check(name)?;
            }
        }
        Ok(())
    }
}

/// Explanation for a criterion that did not come back satisfied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub criterion: Criterion,
    pub status: CriterionStatus,
    /// Human-readable constraint, e.g. "within 15..30 km/h"
    pub expected: String,
    /// Observed value (1.0/0.0 for the storm flag)
    pub observed: f64,
}

/// Outcome of one evaluation: the verdict plus one finding per
/// non-satisfied criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
}

/// Tuning knobs for per-criterion classification.
///
/// The boundaries between ideal, monitoring and alert are product decisions,
/// not physical constants; every threshold here is overridable through
/// configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Fraction of a range's width beyond an edge still classified marginal
    pub tolerance: f64,
    /// Rain chance (%) below which `no_rain` is satisfied
    pub rain_threshold: f64,
    /// Percentage points past the rain threshold still classified marginal
    pub rain_margin: f64,
    /// Wind speed (km/h) at which `no_strong_wind` stops being satisfied
    pub strong_wind_threshold: f64,
    /// km/h past the strong-wind threshold still classified marginal
    pub strong_wind_margin: f64,
    /// Maximum cloud cover (%) for `sunny`
    pub sunny_max_cloud: f64,
    /// Minimum cloud cover (%) for `cloudy`
    pub cloudy_min_cloud: f64,
    /// Percentage points around the cloud thresholds still classified marginal
    pub cloud_margin: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.10,
            rain_threshold: 15.0,
            rain_margin: 10.0,
            strong_wind_threshold: 40.0,
            strong_wind_margin: 8.0,
            sunny_max_cloud: 30.0,
            cloudy_min_cloud: 40.0,
            cloud_margin: 10.0,
        }
    }
}

/// Stateless evaluator: immutable configuration, no other state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator {
    config: EvaluatorConfig,
}

impl ConditionEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Evaluate a reading against a spec under the given criticality policy.
    ///
    /// Returns `InvalidSpec` for inconsistent bounds and `MissingData` when
    /// the reading lacks a field an active criterion needs; a reading is
    /// never silently treated as satisfying (or violating) a criterion it
    /// carries no data for.
    pub fn evaluate(
        &self,
        spec: &ConditionSpec,
        reading: &WeatherReading,
        policy: &CriticalityPolicy,
    ) -> AppResult<Evaluation> {
        spec.validate()?;

        let mut missing: Vec<&'static str> = Vec::new();
        let mut checks: Vec<(Criterion, CriterionStatus, String, f64)> = Vec::new();

        self.classify_ranges(spec, reading, &mut missing, &mut checks);
        self.classify_predicates(spec, reading, &mut missing, &mut checks);

        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(AppError::MissingData(format!(
                "reading omits {} required by active criteria",
                missing.join(", ")
            )));
        }

        let mut findings = Vec::new();
        let mut degraded = false;
        let mut critical_violation = false;

        for (criterion, status, expected, observed) in checks {
            match status {
                CriterionStatus::Satisfied => continue,
                CriterionStatus::Marginal => degraded = true,
                CriterionStatus::Violated => {
                    degraded = true;
                    if policy.classify(criterion) == Criticality::Critical {
                        critical_violation = true;
                    }
                }
            }
            findings.push(Finding { criterion, status, expected, observed });
        }

        let verdict = if critical_violation {
            Verdict::Alert
        } else if degraded {
            Verdict::Monitoring
        } else {
            Verdict::Ideal
        };

        Ok(Evaluation { verdict, findings })
    }

    fn classify_ranges(
        &self,
        spec: &ConditionSpec,
        reading: &WeatherReading,
        missing: &mut Vec<&'static str>,
        checks: &mut Vec<(Criterion, CriterionStatus, String, f64)>,
    ) {
        // (criterion, declared range, observed value, unit, margin when the
        // range is half-open and has no width to take the tolerance from)
        let ranges = [
            (Criterion::Wind, spec.wind, reading.wind_speed, "km/h", 5.0),
            (Criterion::Temperature, spec.temperature, reading.temperature, "°C", 2.0),
            (Criterion::Humidity, spec.humidity, reading.humidity, "%", 5.0),
            (Criterion::Visibility, spec.visibility, reading.visibility, "km", 2.0),
            (Criterion::Pressure, spec.pressure, reading.pressure, "hPa", 5.0),
            (Criterion::UvIndex, spec.uv_index, reading.uv_index, "", 1.0),
            (Criterion::FeelsLike, spec.feels_like, reading.feels_like, "°C", 2.0),
            (Criterion::CloudCover, spec.cloud_cover, reading.cloud_cover, "%", 10.0),
        ];

        for (criterion, range, value, unit, fallback_margin) in ranges {
            let Some(range) = range else { continue };
            let Some(value) = value else {
                missing.push(criterion.field());
                continue;
            };
            let status = classify_range(&range, value, self.config.tolerance, fallback_margin);
            checks.push((criterion, status, describe_range(&range, unit), value));
        }
    }

    fn classify_predicates(
        &self,
        spec: &ConditionSpec,
        reading: &WeatherReading,
        missing: &mut Vec<&'static str>,
        checks: &mut Vec<(Criterion, CriterionStatus, String, f64)>,
    ) {
        let cfg = &self.config;

        if spec.no_rain {
            match reading.rain_chance {
                Some(rain) => checks.push((
                    Criterion::NoRain,
                    classify_ceiling(rain, cfg.rain_threshold, cfg.rain_margin),
                    format!("rain chance below {}%", cfg.rain_threshold),
                    rain,
                )),
                None => missing.push(Criterion::NoRain.field()),
            }
        }

        if spec.sunny {
            match reading.cloud_cover {
                Some(cover) => checks.push((
                    Criterion::Sunny,
                    classify_ceiling(cover, cfg.sunny_max_cloud, cfg.cloud_margin),
                    format!("cloud cover below {}%", cfg.sunny_max_cloud),
                    cover,
                )),
                None => missing.push(Criterion::Sunny.field()),
            }
        }

        if spec.cloudy {
            match reading.cloud_cover {
                Some(cover) => checks.push((
                    Criterion::Cloudy,
                    classify_floor(cover, cfg.cloudy_min_cloud, cfg.cloud_margin),
                    format!("cloud cover at least {}%", cfg.cloudy_min_cloud),
                    cover,
                )),
                None => missing.push(Criterion::Cloudy.field()),
            }
        }

        if spec.no_storms {
            match reading.storm {
                // The storm flag is binary: no marginal band.
                Some(storm) => checks.push((
                    Criterion::NoStorms,
                    if storm { CriterionStatus::Violated } else { CriterionStatus::Satisfied },
                    "no storms".to_string(),
                    if storm { 1.0 } else { 0.0 },
                )),
                None => missing.push(Criterion::NoStorms.field()),
            }
        }

        if spec.no_strong_wind {
            match reading.wind_speed {
                Some(wind) => checks.push((
                    Criterion::NoStrongWind,
                    classify_ceiling(wind, cfg.strong_wind_threshold, cfg.strong_wind_margin),
                    format!("wind below {} km/h", cfg.strong_wind_threshold),
                    wind,
                )),
                None => missing.push(Criterion::NoStrongWind.field()),
            }
        }
    }
}

/// Inside the range (inclusive) is satisfied; beyond an edge by at most
/// `tolerance * width` is marginal; further out is violated. Half-open
/// ranges use `fallback_margin` as the band.
fn classify_range(
    range: &BoundedRange,
    value: f64,
    tolerance: f64,
    fallback_margin: f64,
) -> CriterionStatus {
    if range.contains(value) {
        return CriterionStatus::Satisfied;
    }
    let band = range.width().map_or(fallback_margin, |w| w * tolerance);
    if range.distance_outside(value) <= band {
        CriterionStatus::Marginal
    } else {
        CriterionStatus::Violated
    }
}

/// Value must stay below `limit`; the band `[limit, limit + margin]` is
/// marginal, anything above is violated.
fn classify_ceiling(value: f64, limit: f64, margin: f64) -> CriterionStatus {
    if value < limit {
        CriterionStatus::Satisfied
    } else if value <= limit + margin {
        CriterionStatus::Marginal
    } else {
        CriterionStatus::Violated
    }
}

/// Value must reach at least `limit`; the band `[limit - margin, limit)` is
/// marginal, anything below is violated.
fn classify_floor(value: f64, limit: f64, margin: f64) -> CriterionStatus {
    if value >= limit {
        CriterionStatus::Satisfied
    } else if value >= limit - margin {
        CriterionStatus::Marginal
    } else {
        CriterionStatus::Violated
    }
}

fn describe_range(range: &BoundedRange, unit: &str) -> String {
    let text = match (range.min, range.max) {
        (Some(lo), Some(hi)) => format!("within {lo}..{hi} {unit}"),
        (Some(lo), None) => format!("at least {lo} {unit}"),
        (None, Some(hi)) => format!("at most {hi} {unit}"),
        (None, None) => "unconstrained".to_string(),
    };
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> ConditionEvaluator {
        ConditionEvaluator::default()
    }

    fn reading() -> WeatherReading {
        WeatherReading {
            wind_speed: Some(18.0),
            rain_chance: Some(5.0),
            temperature: Some(24.0),
            feels_like: Some(25.0),
            humidity: Some(55.0),
            visibility: Some(20.0),
            pressure: Some(1015.0),
            uv_index: Some(6.0),
            cloud_cover: Some(20.0),
            storm: Some(false),
            ..WeatherReading::empty()
        }
    }

    #[test]
    fn empty_spec_is_ideal_for_any_reading() {
        let spec = ConditionSpec::default();
        let policy = CriticalityPolicy::new();

        for r in [reading(), WeatherReading::empty()] {
            let eval = evaluator().evaluate(&spec, &r, &policy).unwrap();
            assert_eq!(eval.verdict, Verdict::Ideal);
            assert!(eval.findings.is_empty());
        }
    }

    #[test]
    fn kitesurf_conditions_ideal() {
        // wind 15..30 km/h, no rain; wind 18, rain chance 5
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(15.0, 30.0)),
            no_rain: true,
            ..ConditionSpec::default()
        };

        let eval = evaluator()
            .evaluate(&spec, &reading(), &CriticalityPolicy::new())
            .unwrap();

        assert_eq!(eval.verdict, Verdict::Ideal);
        assert!(eval.findings.is_empty());
    }

    #[test]
    fn wedding_rain_is_an_alert() {
        // no rain + temp 20..30, rain critical; rain chance 65, temp 22
        let spec = ConditionSpec {
            temperature: Some(BoundedRange::between(20.0, 30.0)),
            no_rain: true,
            ..ConditionSpec::default()
        };
        let policy = CriticalityPolicy::new().critical(Criterion::NoRain);
        let r = WeatherReading {
            rain_chance: Some(65.0),
            temperature: Some(22.0),
            ..WeatherReading::empty()
        };

        let eval = evaluator().evaluate(&spec, &r, &policy).unwrap();

        assert_eq!(eval.verdict, Verdict::Alert);
        assert_eq!(eval.findings.len(), 1);
        assert_eq!(eval.findings[0].criterion, Criterion::NoRain);
        assert_eq!(eval.findings[0].status, CriterionStatus::Violated);
        assert_eq!(eval.findings[0].observed, 65.0);
    }

    #[test]
    fn rain_near_threshold_is_monitoring() {
        // overcast photo shoot: cloudy + no rain; rain chance 20 sits just
        // past the 15% threshold, inside the marginal band
        let spec = ConditionSpec {
            cloudy: true,
            no_rain: true,
            ..ConditionSpec::default()
        };
        let r = WeatherReading {
            rain_chance: Some(20.0),
            cloud_cover: Some(60.0),
            ..WeatherReading::empty()
        };

        let eval = evaluator()
            .evaluate(&spec, &r, &CriticalityPolicy::new())
            .unwrap();

        assert_eq!(eval.verdict, Verdict::Monitoring);
        assert_eq!(eval.findings.len(), 1);
        assert_eq!(eval.findings[0].status, CriterionStatus::Marginal);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(15.0, 30.0)),
            ..ConditionSpec::default()
        };
        let policy = CriticalityPolicy::new();

        for wind in [15.0, 30.0] {
            let r = WeatherReading { wind_speed: Some(wind), ..WeatherReading::empty() };
            let eval = evaluator().evaluate(&spec, &r, &policy).unwrap();
            assert_eq!(eval.verdict, Verdict::Ideal, "wind {wind} should satisfy");
        }
    }

    #[test]
    fn classification_degrades_monotonically_outside_the_range() {
        // width 15, tolerance 0.10 -> 1.5 marginal band beyond each edge
        let range = BoundedRange::between(15.0, 30.0);

        assert_eq!(classify_range(&range, 30.0, 0.10, 5.0), CriterionStatus::Satisfied);
        assert_eq!(classify_range(&range, 31.0, 0.10, 5.0), CriterionStatus::Marginal);
        assert_eq!(classify_range(&range, 31.5, 0.10, 5.0), CriterionStatus::Marginal);
        assert_eq!(classify_range(&range, 32.0, 0.10, 5.0), CriterionStatus::Violated);
        assert_eq!(classify_range(&range, 60.0, 0.10, 5.0), CriterionStatus::Violated);

        assert_eq!(classify_range(&range, 14.0, 0.10, 5.0), CriterionStatus::Marginal);
        assert_eq!(classify_range(&range, 10.0, 0.10, 5.0), CriterionStatus::Violated);
    }

    #[test]
    fn half_open_range_uses_fallback_margin() {
        // visibility at least 10 km, fallback margin 2 km
        let spec = ConditionSpec {
            visibility: Some(BoundedRange::at_least(10.0)),
            ..ConditionSpec::default()
        };
        let policy = CriticalityPolicy::new();

        let cases = [
            (12.0, Verdict::Ideal),
            (9.0, Verdict::Monitoring),
            (7.0, Verdict::Monitoring), // violated, but soft without a policy entry
            (3.0, Verdict::Monitoring),
        ];
        for (vis, expected) in cases {
            let r = WeatherReading { visibility: Some(vis), ..WeatherReading::empty() };
            let eval = evaluator().evaluate(&spec, &r, &policy).unwrap();
            assert_eq!(eval.verdict, expected, "visibility {vis}");
        }

        // same readings under a critical policy separate marginal from violated
        let policy = CriticalityPolicy::new().critical(Criterion::Visibility);
        let marginal = WeatherReading { visibility: Some(9.0), ..WeatherReading::empty() };
        let violated = WeatherReading { visibility: Some(7.0), ..WeatherReading::empty() };
        assert_eq!(
            evaluator().evaluate(&spec, &marginal, &policy).unwrap().verdict,
            Verdict::Monitoring
        );
        assert_eq!(
            evaluator().evaluate(&spec, &violated, &policy).unwrap().verdict,
            Verdict::Alert
        );
    }

    #[test]
    fn soft_violation_is_monitoring_not_alert() {
        let spec = ConditionSpec {
            humidity: Some(BoundedRange::between(40.0, 70.0)),
            ..ConditionSpec::default()
        };
        let r = WeatherReading { humidity: Some(95.0), ..WeatherReading::empty() };

        let eval = evaluator()
            .evaluate(&spec, &r, &CriticalityPolicy::new())
            .unwrap();

        assert_eq!(eval.verdict, Verdict::Monitoring);
        assert_eq!(eval.findings[0].status, CriterionStatus::Violated);
    }

    #[test]
    fn storm_flag_has_no_marginal_band() {
        let spec = ConditionSpec { no_storms: true, ..ConditionSpec::default() };
        let policy = CriticalityPolicy::safety_default();

        let calm = WeatherReading { storm: Some(false), ..WeatherReading::empty() };
        let stormy = WeatherReading { storm: Some(true), ..WeatherReading::empty() };

        assert_eq!(
            evaluator().evaluate(&spec, &calm, &policy).unwrap().verdict,
            Verdict::Ideal
        );

        let eval = evaluator().evaluate(&spec, &stormy, &policy).unwrap();
        assert_eq!(eval.verdict, Verdict::Alert);
        assert_eq!(eval.findings[0].observed, 1.0);
    }

    #[test]
    fn strong_wind_ceiling_classification() {
        let spec = ConditionSpec { no_strong_wind: true, ..ConditionSpec::default() };
        let policy = CriticalityPolicy::safety_default();

        let cases = [
            (25.0, Verdict::Ideal),
            (44.0, Verdict::Monitoring), // within the 8 km/h margin
            (55.0, Verdict::Alert),
        ];
        for (wind, expected) in cases {
            let r = WeatherReading { wind_speed: Some(wind), ..WeatherReading::empty() };
            let eval = evaluator().evaluate(&spec, &r, &policy).unwrap();
            assert_eq!(eval.verdict, expected, "wind {wind}");
        }
    }

    #[test]
    fn sunny_and_cloudy_read_cloud_cover() {
        let sunny_spec = ConditionSpec { sunny: true, ..ConditionSpec::default() };
        let cloudy_spec = ConditionSpec { cloudy: true, ..ConditionSpec::default() };
        let policy = CriticalityPolicy::new();

        let clear = WeatherReading { cloud_cover: Some(10.0), ..WeatherReading::empty() };
        let overcast = WeatherReading { cloud_cover: Some(80.0), ..WeatherReading::empty() };

        assert_eq!(
            evaluator().evaluate(&sunny_spec, &clear, &policy).unwrap().verdict,
            Verdict::Ideal
        );
        assert_eq!(
            evaluator().evaluate(&sunny_spec, &overcast, &policy).unwrap().verdict,
            Verdict::Monitoring
        );
        assert_eq!(
            evaluator().evaluate(&cloudy_spec, &overcast, &policy).unwrap().verdict,
            Verdict::Ideal
        );
        assert_eq!(
            evaluator().evaluate(&cloudy_spec, &clear, &policy).unwrap().verdict,
            Verdict::Monitoring
        );
    }

    #[test]
    fn missing_field_is_an_error_not_a_verdict() {
        let spec = ConditionSpec {
            humidity: Some(BoundedRange::between(40.0, 70.0)),
            ..ConditionSpec::default()
        };
        let r = WeatherReading {
            temperature: Some(22.0),
            ..WeatherReading::empty()
        };

        let err = evaluator()
            .evaluate(&spec, &r, &CriticalityPolicy::new())
            .unwrap_err();

        match err {
            AppError::MissingData(msg) => assert!(msg.contains("humidity")),
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_deduplicated() {
        // wind range and no_strong_wind both need wind_speed
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(10.0, 20.0)),
            no_strong_wind: true,
            ..ConditionSpec::default()
        };

        let err = evaluator()
            .evaluate(&spec, &WeatherReading::empty(), &CriticalityPolicy::new())
            .unwrap_err();

        match err {
            AppError::MissingData(msg) => {
                assert_eq!(msg.matches("wind_speed").count(), 1);
            }
            other => panic!("expected MissingData, got {other:?}"),
        }
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(30.0, 15.0)),
            ..ConditionSpec::default()
        };

        let err = evaluator()
            .evaluate(&spec, &reading(), &CriticalityPolicy::new())
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidSpec(_)));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let spec = ConditionSpec {
            temperature: Some(BoundedRange::at_most(f64::NAN)),
            ..ConditionSpec::default()
        };
        assert!(spec.validate().is_err());

        let spec = ConditionSpec {
            pressure: Some(BoundedRange::at_least(f64::INFINITY)),
            ..ConditionSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn findings_describe_the_constraint() {
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(15.0, 30.0)),
            ..ConditionSpec::default()
        };
        let r = WeatherReading { wind_speed: Some(50.0), ..WeatherReading::empty() };

        let eval = evaluator()
            .evaluate(&spec, &r, &CriticalityPolicy::new())
            .unwrap();

        assert_eq!(eval.findings[0].expected, "within 15..30 km/h");
        assert_eq!(eval.findings[0].observed, 50.0);
    }

    #[test]
    fn verdicts_order_by_severity() {
        assert!(Verdict::Ideal < Verdict::Monitoring);
        assert!(Verdict::Monitoring < Verdict::Alert);
    }

    #[test]
    fn policy_defaults_to_soft() {
        let policy = CriticalityPolicy::new();
        assert_eq!(policy.classify(Criterion::NoRain), Criticality::Soft);

        let policy = CriticalityPolicy::safety_default();
        assert_eq!(policy.classify(Criterion::NoStorms), Criticality::Critical);
        assert_eq!(policy.classify(Criterion::NoRain), Criticality::Soft);
    }

    #[test]
    fn soft_override_downgrades_a_critical_criterion() {
        let spec = ConditionSpec { no_strong_wind: true, ..ConditionSpec::default() };
        let r = WeatherReading { wind_speed: Some(80.0), ..WeatherReading::empty() };

        let strict = CriticalityPolicy::safety_default();
        let eval = evaluator().evaluate(&spec, &r, &strict).unwrap();
        assert_eq!(eval.verdict, Verdict::Alert);

        let relaxed = CriticalityPolicy::safety_default().soft(Criterion::NoStrongWind);
        assert_eq!(relaxed.classify(Criterion::NoStrongWind), Criticality::Soft);

        let eval = evaluator().evaluate(&spec, &r, &relaxed).unwrap();
        assert_eq!(eval.verdict, Verdict::Monitoring);
        assert_eq!(eval.findings[0].status, CriterionStatus::Violated);
    }

    #[test]
    fn spec_serializes_sparse() {
        let spec = ConditionSpec {
            wind: Some(BoundedRange::between(15.0, 30.0)),
            no_rain: true,
            ..ConditionSpec::default()
        };

        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["wind"]["min"], 15.0);
        assert!(json.get("temperature").is_none());

        let parsed: ConditionSpec = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, spec);
    }
}
