//! Presentation helpers
//!
//! Pure formatting utilities with no dependency on the evaluator: participant
//! initials and avatar colors, verdict badge text/colors, date and unit
//! rendering. Readings are stored in fixed units (km/h, °C); conversion for
//! display happens here and only here.

use chrono::{DateTime, Utc};

use crate::evaluator::Verdict;
use crate::models::{SpeedUnit, TempUnit};

/// Participant avatar palette. Colors are assigned by name hash so the same
/// name always gets the same color, instead of a random pick per insertion.
pub const PARTICIPANT_PALETTE: [&str; 6] = [
    "#4A90E2", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899",
];

/// Neutral fallback when a palette is empty
const FALLBACK_COLOR: &str = "#9CA3AF";

/// Uppercase initials for an avatar badge: first letter of the first two
/// words, or the first two letters of a single-word name.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words[..] {
        [] => String::new(),
        [only] => only.chars().take(2).flat_map(char::to_uppercase).collect(),
        [first, second, ..] => first
            .chars()
            .take(1)
            .chain(second.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect(),
    }
}

/// Stable palette pick keyed by a fold over the name bytes.
pub fn palette_color<'a>(palette: &'a [&'a str], name: &str) -> &'a str {
    if palette.is_empty() {
        return FALLBACK_COLOR;
    }
    let hash = name
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    palette[hash % palette.len()]
}

/// Badge label for a verdict.
pub fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Ideal => "Ideal conditions",
        Verdict::Monitoring => "Monitoring",
        Verdict::Alert => "Alert",
    }
}

/// Badge color for a verdict.
pub fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Ideal => "#10B981",
        Verdict::Monitoring => "#F59E0B",
        Verdict::Alert => "#EF4444",
    }
}

/// dd/mm/yyyy rendering used in notification texts.
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y").to_string()
}

/// HH:MM rendering used in notification texts.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

/// Convert a km/h wind speed into the preferred unit.
pub fn convert_speed(kmh: f64, unit: SpeedUnit) -> f64 {
    match unit {
        SpeedUnit::Kmh => kmh,
        SpeedUnit::Knots => kmh / 1.852,
        SpeedUnit::Ms => kmh / 3.6,
    }
}

/// Convert a Celsius temperature into the preferred unit.
pub fn convert_temperature(celsius: f64, unit: TempUnit) -> f64 {
    match unit {
        TempUnit::Celsius => celsius,
        TempUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Render a stored km/h speed with the preferred unit's suffix.
pub fn format_speed(kmh: f64, unit: SpeedUnit) -> String {
    let suffix = match unit {
        SpeedUnit::Kmh => "km/h",
        SpeedUnit::Knots => "kn",
        SpeedUnit::Ms => "m/s",
    };
    format!("{:.1} {suffix}", convert_speed(kmh, unit))
}

/// Render a stored Celsius temperature with the preferred unit's suffix.
pub fn format_temperature(celsius: f64, unit: TempUnit) -> String {
    let suffix = match unit {
        TempUnit::Celsius => "°C",
        TempUnit::Fahrenheit => "°F",
    };
    format!("{:.1}{suffix}", convert_temperature(celsius, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_initials_two_words() {
        assert_eq!(initials("Maria Costa"), "MC");
        assert_eq!(initials("pedro santos"), "PS");
        assert_eq!(initials("Ana Flavia Souza"), "AF");
    }

    #[test]
    fn test_initials_single_word() {
        assert_eq!(initials("Ana"), "AN");
        assert_eq!(initials("x"), "X");
    }

    #[test]
    fn test_initials_empty() {
        assert_eq!(initials(""), "");
        assert_eq!(initials("   "), "");
    }

    #[test]
    fn test_palette_color_is_stable() {
        let a = palette_color(&PARTICIPANT_PALETTE, "Maria Costa");
        let b = palette_color(&PARTICIPANT_PALETTE, "Maria Costa");
        assert_eq!(a, b);
        assert!(PARTICIPANT_PALETTE.contains(&a));
    }

    #[test]
    fn test_empty_palette_falls_back() {
        assert_eq!(palette_color(&[], "anyone"), FALLBACK_COLOR);
    }

    #[test]
    fn test_speed_conversion() {
        assert_eq!(convert_speed(36.0, SpeedUnit::Kmh), 36.0);
        assert_eq!(convert_speed(36.0, SpeedUnit::Ms), 10.0);
        assert!((convert_speed(18.52, SpeedUnit::Knots) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_conversion() {
        assert_eq!(convert_temperature(0.0, TempUnit::Fahrenheit), 32.0);
        assert_eq!(convert_temperature(100.0, TempUnit::Fahrenheit), 212.0);
        assert_eq!(convert_temperature(25.0, TempUnit::Celsius), 25.0);
    }

    #[test]
    fn test_formatting_suffixes() {
        assert_eq!(format_speed(18.0, SpeedUnit::Kmh), "18.0 km/h");
        assert_eq!(format_speed(36.0, SpeedUnit::Ms), "10.0 m/s");
        assert_eq!(format_temperature(24.0, TempUnit::Celsius), "24.0°C");
        assert_eq!(format_temperature(0.0, TempUnit::Fahrenheit), "32.0°F");
    }

    #[test]
    fn test_date_rendering() {
        let ts = Utc.with_ymd_and_hms(2025, 10, 15, 14, 0, 0).unwrap();
        assert_eq!(format_date(ts), "15/10/2025");
        assert_eq!(format_time(ts), "14:00");
    }

    #[test]
    fn test_verdict_badges() {
        assert_eq!(verdict_label(Verdict::Ideal), "Ideal conditions");
        assert_eq!(verdict_color(Verdict::Alert), "#EF4444");
        assert_ne!(verdict_color(Verdict::Ideal), verdict_color(Verdict::Monitoring));
    }
}
