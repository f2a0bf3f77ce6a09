//! Plan repository
//!
//! Owns the plans (events) being watched, their condition specs, participant
//! rosters and verdict histories. Create/delete are guarded by validation;
//! the evaluator only ever reads plans, it never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;
use validator::Validate;

use crate::display;
use crate::error::{AppError, AppResult};
use crate::evaluator::{ConditionSpec, CriticalityPolicy, Finding, Verdict};
use crate::templates;
use crate::validation;

/// Verdict records kept per plan before the oldest are dropped
pub const MAX_PLAN_HISTORY: usize = 1000;

/// Broad plan category, used to pick sensible template defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Sport,
    Wedding,
    Festival,
    Photography,
    Other,
}

impl Default for PlanKind {
    fn default() -> Self {
        PlanKind::Other
    }
}

/// Someone attending a plan, with the avatar fields the roster UI shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub initials: String,
    pub color: String,
    pub alerts_enabled: bool,
}

/// One verdict per reading the watcher evaluated for this plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub reading_id: Uuid,
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted by [`PlanStore::append_verdict`] when a plan's verdict changed
/// from the previous record. `from` is `None` for the first record.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictTransition {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub from: Option<Verdict>,
    pub to: Verdict,
}

/// A watched plan: one condition spec, one criticality policy, a roster and
/// a capped verdict history.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub kind: PlanKind,
    pub starts_at: DateTime<Utc>,
    pub spec: ConditionSpec,
    pub policy: CriticalityPolicy,
    pub participants: Vec<Participant>,
    /// Served by the history endpoint, not inlined into plan payloads
    #[serde(skip)]
    pub history: VecDeque<VerdictRecord>,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn latest_verdict(&self) -> Option<Verdict> {
        self.history.back().map(|r| r.verdict)
    }

    /// Compact listing shape with the latest verdict badge folded in.
    pub fn overview(&self) -> PlanOverview {
        let latest = self.latest_verdict();
        PlanOverview {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            starts_at: self.starts_at,
            participant_count: self.participants.len(),
            latest_verdict: latest,
            status_label: latest.map(display::verdict_label),
            status_color: latest.map(display::verdict_color),
        }
    }
}

/// Listing row for `GET /api/plans`.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOverview {
    pub id: Uuid,
    pub name: String,
    pub kind: PlanKind,
    pub starts_at: DateTime<Utc>,
    pub participant_count: usize,
    pub latest_verdict: Option<Verdict>,
    pub status_label: Option<&'static str>,
    pub status_color: Option<&'static str>,
}

/// Request body for plan creation. A template slug supplies preset
/// spec/policy/kind; explicit fields win over the preset.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlanInput {
    #[validate(length(min = 1, max = 120, message = "Plan name must be 1-120 characters"))]
    pub name: String,
    pub kind: Option<PlanKind>,
    pub template: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub spec: Option<ConditionSpec>,
    pub policy: Option<CriticalityPolicy>,
}

/// Request body for adding a participant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ParticipantInput {
    #[validate(length(min = 1, max = 120, message = "Participant name must be 1-120 characters"))]
    pub name: String,
    #[validate(length(max = 30, message = "Phone number too long"))]
    pub phone: Option<String>,
    /// Explicit avatar color; assigned from the palette when absent
    pub color: Option<String>,
    pub alerts_enabled: Option<bool>,
}

/// In-memory plan repository. Kept behind the application state lock; the
/// watcher is the single writer of verdict history, so records for a plan
/// always land in reading order.
#[derive(Debug, Default)]
pub struct PlanStore {
    plans: HashMap<Uuid, Plan>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plan. The name must be non-empty and the effective spec must
    /// be internally consistent; storing never admits an invalid spec.
    pub fn create(&mut self, input: PlanInput) -> AppResult<Plan> {
        validation::validate_name(&input.name, "plan")?;

        let template = match input.template.as_deref() {
            Some(slug) => Some(templates::find(slug).ok_or_else(|| {
                AppError::BadRequest(format!("unknown template: {slug}"))
            })?),
            None => None,
        };

        let spec = input
            .spec
            .or_else(|| template.as_ref().map(|t| t.spec))
            .unwrap_or_default();
        let policy = input
            .policy
            .or_else(|| template.as_ref().map(|t| t.policy.clone()))
            .unwrap_or_else(CriticalityPolicy::safety_default);
        let kind = input
            .kind
            .or_else(|| template.as_ref().map(|t| t.kind))
            .unwrap_or_default();

        spec.validate()?;

        let plan = Plan {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            kind,
            starts_at: input.starts_at,
            spec,
            policy,
            participants: Vec::new(),
            history: VecDeque::new(),
            created_at: Utc::now(),
        };
        self.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    pub fn get(&self, id: Uuid) -> Option<&Plan> {
        self.plans.get(&id)
    }

    /// All plans ordered by start time.
    pub fn list(&self) -> Vec<Plan> {
        let mut plans: Vec<Plan> = self.plans.values().cloned().collect();
        plans.sort_by_key(|p| p.starts_at);
        plans
    }

    /// Plan ids, in no particular order. Snapshot for the watcher so it can
    /// mutate the store while walking the plans.
    pub fn ids(&self) -> Vec<Uuid> {
        self.plans.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.plans.len()
    }

    pub fn delete(&mut self, id: Uuid) -> AppResult<Plan> {
        self.plans
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("plan {id}")))
    }

    /// Add a participant with initials and a stable palette color assigned
    /// at creation.
    pub fn add_participant(
        &mut self,
        plan_id: Uuid,
        input: ParticipantInput,
    ) -> AppResult<Participant> {
        validation::validate_name(&input.name, "participant")?;
        let plan = self
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| AppError::NotFound(format!("plan {plan_id}")))?;

        let name = input.name.trim().to_string();
        let participant = Participant {
            id: Uuid::new_v4(),
            initials: display::initials(&name),
            color: input.color.unwrap_or_else(|| {
                display::palette_color(&display::PARTICIPANT_PALETTE, &name).to_string()
            }),
            phone: input.phone.unwrap_or_default(),
            alerts_enabled: input.alerts_enabled.unwrap_or(true),
            name,
        };
        plan.participants.push(participant.clone());
        Ok(participant)
    }

    pub fn remove_participant(
        &mut self,
        plan_id: Uuid,
        participant_id: Uuid,
    ) -> AppResult<Participant> {
        let plan = self
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| AppError::NotFound(format!("plan {plan_id}")))?;

        let index = plan
            .participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or_else(|| AppError::NotFound(format!("participant {participant_id}")))?;
        Ok(plan.participants.remove(index))
    }

    /// Append a verdict record, drop history beyond the cap and report
    /// whether the verdict changed from the previous record. Must be called
    /// in reading order for each plan.
    pub fn append_verdict(
        &mut self,
        plan_id: Uuid,
        record: VerdictRecord,
    ) -> AppResult<Option<VerdictTransition>> {
        let plan = self
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| AppError::NotFound(format!("plan {plan_id}")))?;

        let previous = plan.history.back().map(|r| r.verdict);
        let to = record.verdict;
        plan.history.push_back(record);
        if plan.history.len() > MAX_PLAN_HISTORY {
            plan.history.pop_front();
        }

        Ok((previous != Some(to)).then(|| VerdictTransition {
            plan_id,
            plan_name: plan.name.clone(),
            from: previous,
            to,
        }))
    }
}
