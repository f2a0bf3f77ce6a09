//! Plan watcher
//!
//! Background task that turns readings into verdicts. Whenever the feed
//! stores a reading the watcher has not seen, every plan is evaluated
//! against it, the verdict is appended to the plan's history, and verdict
//! transitions become alert events: pushed onto the in-app feed and, when
//! the notification preferences allow it, handed to the notifier.
//!
//! The watcher is the only writer of verdict history, which keeps each
//! plan's records in reading order without any per-plan locking.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::evaluator::ConditionEvaluator;
use crate::notify::{self, AlertEvent, Notifier};
use crate::plans::VerdictRecord;
use crate::state::AppState;

/// Periodically sweeps all plans against the newest reading
pub struct PlanWatcher {
    /// Interval between sweeps in milliseconds
    interval_ms: u64,
    evaluator: ConditionEvaluator,
    notifier: Arc<dyn Notifier>,
}

impl PlanWatcher {
    pub fn new(
        interval_ms: u64,
        evaluator: ConditionEvaluator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        info!(interval_ms = interval_ms, "Initializing plan watcher");
        Self { interval_ms, evaluator, notifier }
    }

    /// Run the watcher loop continuously.
    pub async fn run(self, state: Arc<RwLock<AppState>>) {
        info!("Starting plan watcher loop");

        let mut tick_interval = interval(Duration::from_millis(self.interval_ms));
        let mut last_seen: Option<Uuid> = None;

        loop {
            tick_interval.tick().await;
            self.sweep(&state, &mut last_seen).await;
        }
    }

    /// One sweep: evaluate every plan against the latest unseen reading.
    async fn sweep(&self, state: &Arc<RwLock<AppState>>, last_seen: &mut Option<Uuid>) {
        let mut app_state = state.write().await;

        let Some(reading) = app_state.get_latest().cloned() else {
            return;
        };
        if *last_seen == Some(reading.id) {
            return;
        }
        *last_seen = Some(reading.id);

        let settings = app_state.settings.clone();

        for plan_id in app_state.plan_store.ids() {
            let Some(plan) = app_state.plan_store.get(plan_id) else {
                continue;
            };
            let spec = plan.spec;
            let policy = plan.policy.clone();
            let starts_at = plan.starts_at;
            let plan_name = plan.name.clone();

            let evaluation = match self.evaluator.evaluate(&spec, &reading, &policy) {
                Ok(evaluation) => evaluation,
                Err(AppError::MissingData(msg)) => {
                    // Surfaced, never defaulted: the plan keeps its previous
                    // verdict and no history record is appended.
                    warn!(
                        plan_id = %plan_id,
                        plan = %plan_name,
                        reading_id = %reading.id,
                        %msg,
                        "Reading lacks data required by plan criteria"
                    );
                    continue;
                }
                Err(e) => {
                    error!(plan_id = %plan_id, error = %e, "Plan evaluation failed");
                    continue;
                }
            };

            let record = VerdictRecord {
                reading_id: reading.id,
                verdict: evaluation.verdict,
                findings: evaluation.findings.clone(),
                timestamp: reading.timestamp,
            };

            match app_state.plan_store.append_verdict(plan_id, record) {
                Ok(Some(transition)) => {
                    info!(
                        plan_id = %plan_id,
                        plan = %plan_name,
                        from = ?transition.from,
                        to = %transition.to,
                        "Plan verdict transition"
                    );

                    let event = AlertEvent::new(&transition, starts_at, evaluation.findings);
                    if notify::should_dispatch(&event, &settings.notifications) {
                        if let Err(e) = self.notifier.dispatch(&event, &settings) {
                            warn!(plan_id = %plan_id, error = %e, "Alert dispatch failed");
                        }
                    }
                    app_state.push_alert(event);
                }
                Ok(None) => {}
                Err(e) => {
                    // Plan deleted between snapshot and append
                    warn!(plan_id = %plan_id, error = %e, "Could not record verdict");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::evaluator::{BoundedRange, ConditionSpec, Criterion, CriticalityPolicy, Verdict};
    use crate::models::{UserSettings, WeatherReading};
    use crate::plans::PlanInput;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<AlertEvent>>,
    }

    impl Notifier for RecordingNotifier {
        fn dispatch(&self, event: &AlertEvent, _settings: &UserSettings) -> AppResult<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn watcher(notifier: Arc<RecordingNotifier>) -> PlanWatcher {
        PlanWatcher::new(1000, ConditionEvaluator::default(), notifier)
    }

    async fn state_with_plan(
        spec: ConditionSpec,
        policy: Option<CriticalityPolicy>,
    ) -> Arc<RwLock<AppState>> {
        let state = Arc::new(RwLock::new(AppState::new()));
        state
            .write()
            .await
            .plan_store
            .create(PlanInput {
                name: "Kitesurf Trip".to_string(),
                kind: None,
                template: None,
                starts_at: Utc::now(),
                spec: Some(spec),
                policy,
            })
            .unwrap();
        state
    }

    fn wind_spec() -> ConditionSpec {
        ConditionSpec {
            wind: Some(BoundedRange::between(15.0, 30.0)),
            ..ConditionSpec::default()
        }
    }

    fn wind_reading(wind: f64) -> WeatherReading {
        WeatherReading {
            wind_speed: Some(wind),
            ..WeatherReading::empty()
        }
    }

    #[tokio::test]
    async fn test_sweep_appends_history_once_per_reading() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(notifier);
        let state = state_with_plan(wind_spec(), None).await;
        let mut last_seen = None;

        state.write().await.add_reading(wind_reading(20.0));

        watcher.sweep(&state, &mut last_seen).await;
        // second sweep sees the same reading id and does nothing
        watcher.sweep(&state, &mut last_seen).await;

        let app_state = state.read().await;
        let plan = &app_state.plan_store.list()[0];
        assert_eq!(plan.history.len(), 1);
        assert_eq!(plan.latest_verdict(), Some(Verdict::Ideal));
    }

    #[tokio::test]
    async fn test_transition_reaches_feed_and_notifier() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(notifier.clone());
        let policy = CriticalityPolicy::new().critical(Criterion::Wind);
        let state = state_with_plan(wind_spec(), Some(policy)).await;
        let mut last_seen = None;

        state.write().await.add_reading(wind_reading(20.0));
        watcher.sweep(&state, &mut last_seen).await;

        state.write().await.add_reading(wind_reading(80.0));
        watcher.sweep(&state, &mut last_seen).await;

        let app_state = state.read().await;
        let alerts = app_state.recent_alerts();
        // both transitions (None -> ideal, ideal -> alert) land in the feed
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].to, Verdict::Alert);
        assert_eq!(alerts[0].from, Some(Verdict::Ideal));

        // critical_only is on by default: only the alert is dispatched
        let dispatched = notifier.events.lock().unwrap();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].to, Verdict::Alert);
    }

    #[tokio::test]
    async fn test_missing_data_appends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(notifier);
        let spec = ConditionSpec {
            humidity: Some(BoundedRange::between(40.0, 70.0)),
            ..ConditionSpec::default()
        };
        let state = state_with_plan(spec, None).await;
        let mut last_seen = None;

        // reading carries wind but not the humidity the plan needs
        state.write().await.add_reading(wind_reading(20.0));
        watcher.sweep(&state, &mut last_seen).await;

        let app_state = state.read().await;
        let plan = &app_state.plan_store.list()[0];
        assert!(plan.history.is_empty());
        assert!(app_state.recent_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_without_readings_is_a_no_op() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = watcher(notifier);
        let state = state_with_plan(wind_spec(), None).await;
        let mut last_seen = None;

        watcher.sweep(&state, &mut last_seen).await;

        let app_state = state.read().await;
        assert!(app_state.plan_store.list()[0].history.is_empty());
    }
}
