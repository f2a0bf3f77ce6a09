//! Alert dispatch
//!
//! The notification seam. Verdict transitions become [`AlertEvent`]s; the
//! [`Notifier`] trait carries them out of the process. The only builtin
//! implementation logs through `tracing`; WhatsApp or email delivery plugs
//! in behind the same trait without touching the watcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::display;
use crate::error::AppResult;
use crate::evaluator::{Criterion, Finding, Verdict};
use crate::models::{NotificationPrefs, UserSettings};
use crate::plans::VerdictTransition;

/// A verdict transition, frozen for the alert feed and for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub plan_name: String,
    /// `None` when this is the plan's first verdict
    pub from: Option<Verdict>,
    pub to: Verdict,
    /// Findings from the evaluation that caused the transition
    pub findings: Vec<Finding>,
    /// Rendered summary, ready for any delivery channel
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        transition: &VerdictTransition,
        starts_at: DateTime<Utc>,
        findings: Vec<Finding>,
    ) -> Self {
        let message = build_message(&transition.plan_name, starts_at, transition.to, &findings);
        Self {
            id: Uuid::new_v4(),
            plan_id: transition.plan_id,
            plan_name: transition.plan_name.clone(),
            from: transition.from,
            to: transition.to,
            findings,
            message,
            timestamp: Utc::now(),
        }
    }
}

fn build_message(
    plan_name: &str,
    starts_at: DateTime<Utc>,
    to: Verdict,
    findings: &[Finding],
) -> String {
    let when = format!(
        "{} at {}",
        display::format_date(starts_at),
        display::format_time(starts_at)
    );
    let mut message = match to {
        Verdict::Alert => format!("{plan_name} ({when}): conditions violate the plan requirements"),
        Verdict::Monitoring => format!("{plan_name} ({when}): conditions are degrading, keep watching"),
        Verdict::Ideal => format!("{plan_name} ({when}): conditions are ideal"),
    };

    let details: Vec<String> = findings
        .iter()
        .take(3)
        .map(|f| format!("{} is {}, expected {}", f.criterion, f.observed, f.expected))
        .collect();
    if !details.is_empty() {
        message.push_str(" - ");
        message.push_str(&details.join("; "));
    }
    message
}

/// Whether the stored preferences allow delivering this event at all.
/// Events filtered out here still land in the in-app alert feed.
pub fn should_dispatch(event: &AlertEvent, prefs: &NotificationPrefs) -> bool {
    if !prefs.whatsapp && !prefs.email {
        return false;
    }
    if prefs.critical_only && event.to != Verdict::Alert {
        return false;
    }
    true
}

/// Delivery seam consumed by the watcher. Implementations own their channel
/// and their failure reporting.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, event: &AlertEvent, settings: &UserSettings) -> AppResult<()>;
}

/// Logs what would be sent, and where, instead of delivering.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn dispatch(&self, event: &AlertEvent, settings: &UserSettings) -> AppResult<()> {
        let mut channels = Vec::new();
        if settings.notifications.whatsapp {
            channels.push("whatsapp");
        }
        if settings.notifications.email {
            channels.push("email");
        }

        let observed: Vec<String> = event
            .findings
            .iter()
            .map(|f| observed_in_preferred_units(f, settings))
            .collect();

        info!(
            plan_id = %event.plan_id,
            verdict = %event.to,
            channels = ?channels,
            recipient = %settings.profile.email,
            observed = ?observed,
            "{}",
            event.message
        );
        Ok(())
    }
}

/// Render a finding's observed value in the user's preferred units.
fn observed_in_preferred_units(finding: &Finding, settings: &UserSettings) -> String {
    let prefs = &settings.preferences;
    let value = match finding.criterion {
        Criterion::Wind | Criterion::NoStrongWind => {
            display::format_speed(finding.observed, prefs.speed_unit)
        }
        Criterion::Temperature | Criterion::FeelsLike => {
            display::format_temperature(finding.observed, prefs.temp_unit)
        }
        _ => format!("{}", finding.observed),
    };
    format!("{}: {value}", finding.criterion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::CriterionStatus;
    use crate::models::{SpeedUnit, TempUnit};

    fn transition(to: Verdict) -> VerdictTransition {
        VerdictTransition {
            plan_id: Uuid::new_v4(),
            plan_name: "Kitesurf Championship".to_string(),
            from: Some(Verdict::Ideal),
            to,
        }
    }

    fn wind_finding(observed: f64) -> Finding {
        Finding {
            criterion: Criterion::Wind,
            status: CriterionStatus::Violated,
            expected: "within 15..30 km/h".to_string(),
            observed,
        }
    }

    fn prefs(whatsapp: bool, email: bool, critical_only: bool) -> NotificationPrefs {
        NotificationPrefs { whatsapp, email, critical_only, reminders: false }
    }

    #[test]
    fn test_critical_only_blocks_monitoring_transitions() {
        let event = AlertEvent::new(&transition(Verdict::Monitoring), Utc::now(), vec![]);
        assert!(!should_dispatch(&event, &prefs(true, true, true)));
        assert!(should_dispatch(&event, &prefs(true, true, false)));
    }

    #[test]
    fn test_alerts_pass_the_critical_only_gate() {
        let event = AlertEvent::new(&transition(Verdict::Alert), Utc::now(), vec![]);
        assert!(should_dispatch(&event, &prefs(true, false, true)));
        assert!(should_dispatch(&event, &prefs(false, true, true)));
    }

    #[test]
    fn test_no_channel_means_no_dispatch() {
        let event = AlertEvent::new(&transition(Verdict::Alert), Utc::now(), vec![]);
        assert!(!should_dispatch(&event, &prefs(false, false, false)));
    }

    #[test]
    fn test_recovery_respects_critical_only() {
        let event = AlertEvent::new(&transition(Verdict::Ideal), Utc::now(), vec![]);
        assert!(!should_dispatch(&event, &prefs(true, true, true)));
        assert!(should_dispatch(&event, &prefs(true, true, false)));
    }

    #[test]
    fn test_message_names_plan_date_and_findings() {
        use chrono::TimeZone;
        let starts_at = Utc.with_ymd_and_hms(2025, 10, 15, 14, 0, 0).unwrap();
        let event = AlertEvent::new(
            &transition(Verdict::Alert),
            starts_at,
            vec![wind_finding(50.0)],
        );

        assert!(event.message.contains("Kitesurf Championship"));
        assert!(event.message.contains("15/10/2025"));
        assert!(event.message.contains("wind is 50"));
        assert!(event.message.contains("within 15..30 km/h"));
    }

    #[test]
    fn test_observed_values_honor_unit_preferences() {
        let mut settings = UserSettings::default();
        settings.preferences.speed_unit = SpeedUnit::Ms;
        settings.preferences.temp_unit = TempUnit::Fahrenheit;

        let rendered = observed_in_preferred_units(&wind_finding(36.0), &settings);
        assert_eq!(rendered, "wind: 10.0 m/s");

        let temp_finding = Finding {
            criterion: Criterion::Temperature,
            status: CriterionStatus::Marginal,
            expected: "within 20..30 °C".to_string(),
            observed: 0.0,
        };
        let rendered = observed_in_preferred_units(&temp_finding, &settings);
        assert_eq!(rendered, "temperature: 32.0°F");
    }

    #[test]
    fn test_log_notifier_dispatch_succeeds() {
        let event = AlertEvent::new(
            &transition(Verdict::Alert),
            Utc::now(),
            vec![wind_finding(55.0)],
        );
        let notifier = LogNotifier;
        assert!(notifier.dispatch(&event, &UserSettings::default()).is_ok());
    }
}
