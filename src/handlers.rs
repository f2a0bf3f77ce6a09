//! HTTP request handlers
//!
//! Implements the REST API: weather data access, the evaluation boundary,
//! plan and participant management, templates, alerts and settings.

use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::display;
use crate::error::AppError;
use crate::evaluator::{ConditionEvaluator, ConditionSpec, CriticalityPolicy, Finding, Verdict};
use crate::models::{HealthCheck, UserSettings, WeatherInput, WeatherReading};
use crate::plans::{ParticipantInput, PlanInput};
use crate::state::AppState;
use crate::templates;
use crate::validation::{validate_minutes, validate_pagination, validate_reading};
use crate::websocket::WsSession;

/// Configure all application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Health check
            .route("/health", web::get().to(health_check))
            // Weather data endpoints
            .route("/weather/ingest", web::post().to(ingest_weather_data))
            .route("/weather/latest", web::get().to(get_latest_reading))
            .route("/weather/history", web::get().to(get_reading_history))
            .route("/weather/statistics", web::get().to(get_statistics))
            // Stateless evaluation boundary
            .route("/evaluate", web::post().to(evaluate_adhoc))
            // Plan endpoints
            .route("/plans", web::get().to(list_plans))
            .route("/plans", web::post().to(create_plan))
            .route("/plans/{id}", web::get().to(get_plan))
            .route("/plans/{id}", web::delete().to(delete_plan))
            .route("/plans/{id}/history", web::get().to(get_plan_history))
            .route("/plans/{id}/evaluate", web::post().to(evaluate_plan))
            .route("/plans/{id}/participants", web::post().to(add_participant))
            .route(
                "/plans/{id}/participants/{pid}",
                web::delete().to(remove_participant),
            )
            // Catalog, alert feed and settings
            .route("/templates", web::get().to(list_templates))
            .route("/alerts", web::get().to(list_alerts))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::put().to(update_settings)),
    )
    // WebSocket endpoint
    .route("/ws", web::get().to(websocket_handler));
}

/// Health check endpoint
///
/// GET /api/health
///
/// Returns system health status including uptime, last reading time and the
/// number of watched plans.
pub async fn health_check(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;

    let health = HealthCheck {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        last_reading: state.last_reading_time(),
        plan_count: state.plan_store.count(),
    };

    Ok(HttpResponse::Ok().json(health))
}

/// Ingest a weather reading
///
/// POST /api/weather/ingest
///
/// Accepts readings from external sources (for future provider integration).
pub async fn ingest_weather_data(
    state: web::Data<Arc<RwLock<AppState>>>,
    body: web::Json<WeatherInput>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);

    info!(
        correlation_id = %correlation_id,
        "Received weather ingestion request"
    );

    let mut reading: WeatherReading = body.into_inner().into();
    reading.correlation_id = Some(correlation_id.clone());

    // Reject non-finite or physically impossible values
    validate_reading(&reading)?;

    {
        let mut state = state.write().await;
        state.add_reading(reading.clone());
    }

    info!(
        correlation_id = %correlation_id,
        reading_id = %reading.id,
        "Weather reading ingested successfully"
    );

    Ok(HttpResponse::Created().json(IngestResponse {
        success: true,
        reading_id: reading.id.to_string(),
        correlation_id,
    }))
}

#[derive(Serialize)]
struct IngestResponse {
    success: bool,
    reading_id: String,
    correlation_id: String,
}

/// Get the latest weather reading
///
/// GET /api/weather/latest
pub async fn get_latest_reading(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;

    match state.get_latest() {
        Some(reading) => Ok(HttpResponse::Ok().json(reading)),
        None => Err(AppError::NotFound("No weather readings available".to_string())),
    }
}

/// Query parameters for reading history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub minutes: Option<i64>,
}

/// Get reading history
///
/// GET /api/weather/history?page=1&limit=100&minutes=60
pub async fn get_reading_history(
    state: web::Data<Arc<RwLock<AppState>>>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = validate_pagination(query.page, query.limit)?;
    let minutes = validate_minutes(query.minutes)?;

    let state = state.read().await;
    let readings: Vec<&WeatherReading> = state.get_last_minutes(minutes);

    // Apply pagination; the offset is computed in u64 so a huge page number
    // falls through to an empty slice instead of overflowing
    let total = readings.len();
    let start = (page as u64 - 1) * limit as u64;

    let paginated: Vec<_> = if start < total as u64 {
        let start = start as usize;
        let end = (start + limit as usize).min(total);
        readings[start..end].to_vec()
    } else {
        Vec::new()
    };

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        data: paginated,
        page,
        limit,
        total: total as u32,
        total_pages: ((total as f64) / (limit as f64)).ceil() as u32,
    }))
}

#[derive(Serialize)]
struct PaginatedResponse<T> {
    data: Vec<T>,
    page: u32,
    limit: u32,
    total: u32,
    total_pages: u32,
}

/// Get reading statistics
///
/// GET /api/weather/statistics
pub async fn get_statistics(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    let stats = state.get_statistics();

    Ok(HttpResponse::Ok().json(stats))
}

/// Request body for the stateless evaluation boundary
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub spec: ConditionSpec,
    pub reading: WeatherReading,
    /// Defaults to the safety policy when omitted
    pub policy: Option<CriticalityPolicy>,
}

/// Evaluate an arbitrary spec against an arbitrary reading
///
/// POST /api/evaluate
///
/// Touches no stored state and records nothing. Returns the verdict and
/// one finding per non-satisfied criterion.
pub async fn evaluate_adhoc(
    evaluator: web::Data<ConditionEvaluator>,
    body: web::Json<EvaluateRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let correlation_id = extract_correlation_id(&req);
    let EvaluateRequest { spec, reading, policy } = body.into_inner();

    validate_reading(&reading)?;
    let policy = policy.unwrap_or_else(CriticalityPolicy::safety_default);

    let evaluation = evaluator.evaluate(&spec, &reading, &policy)?;

    info!(
        correlation_id = %correlation_id,
        verdict = %evaluation.verdict,
        findings = evaluation.findings.len(),
        "Ad-hoc evaluation complete"
    );

    Ok(HttpResponse::Ok().json(evaluation))
}

/// List all plans, ordered by start time
///
/// GET /api/plans
pub async fn list_plans(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    let overviews: Vec<_> = state.plan_store.list().iter().map(|p| p.overview()).collect();

    Ok(HttpResponse::Ok().json(overviews))
}

/// Create a plan
///
/// POST /api/plans
pub async fn create_plan(
    state: web::Data<Arc<RwLock<AppState>>>,
    body: web::Json<PlanInput>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let mut state = state.write().await;
    let plan = state.plan_store.create(body.into_inner())?;

    info!(plan_id = %plan.id, plan = %plan.name, "Plan created");

    Ok(HttpResponse::Created().json(plan))
}

/// Get one plan
///
/// GET /api/plans/{id}
pub async fn get_plan(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let state = state.read().await;

    match state.plan_store.get(id) {
        Some(plan) => Ok(HttpResponse::Ok().json(plan)),
        None => Err(AppError::NotFound(format!("plan {id}"))),
    }
}

/// Delete a plan
///
/// DELETE /api/plans/{id}
pub async fn delete_plan(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut state = state.write().await;
    let plan = state.plan_store.delete(id)?;

    info!(plan_id = %id, plan = %plan.name, "Plan deleted");

    Ok(HttpResponse::Ok().json(plan))
}

/// Get a plan's verdict history, newest first
///
/// GET /api/plans/{id}/history
pub async fn get_plan_history(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let state = state.read().await;

    let plan = state
        .plan_store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("plan {id}")))?;

    let records: Vec<_> = plan.history.iter().rev().collect();
    Ok(HttpResponse::Ok().json(records))
}

#[derive(Serialize)]
struct PlanEvaluationResponse {
    plan_id: Uuid,
    reading_id: Uuid,
    verdict: Verdict,
    status_label: &'static str,
    status_color: &'static str,
    findings: Vec<Finding>,
}

/// Evaluate a plan against the latest stored reading
///
/// POST /api/plans/{id}/evaluate
///
/// On-demand check that appends nothing to the plan's history; the watcher
/// owns history in reading order.
pub async fn evaluate_plan(
    state: web::Data<Arc<RwLock<AppState>>>,
    evaluator: web::Data<ConditionEvaluator>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let state = state.read().await;

    let plan = state
        .plan_store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("plan {id}")))?;
    let reading = state
        .get_latest()
        .ok_or_else(|| AppError::NotFound("No weather readings available".to_string()))?;

    let evaluation = evaluator.evaluate(&plan.spec, reading, &plan.policy)?;

    Ok(HttpResponse::Ok().json(PlanEvaluationResponse {
        plan_id: plan.id,
        reading_id: reading.id,
        verdict: evaluation.verdict,
        status_label: display::verdict_label(evaluation.verdict),
        status_color: display::verdict_color(evaluation.verdict),
        findings: evaluation.findings,
    }))
}

/// Add a participant to a plan
///
/// POST /api/plans/{id}/participants
pub async fn add_participant(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<Uuid>,
    body: web::Json<ParticipantInput>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let id = path.into_inner();
    let mut state = state.write().await;
    let participant = state.plan_store.add_participant(id, body.into_inner())?;

    info!(
        plan_id = %id,
        participant_id = %participant.id,
        "Participant added"
    );

    Ok(HttpResponse::Created().json(participant))
}

/// Remove a participant from a plan
///
/// DELETE /api/plans/{id}/participants/{pid}
pub async fn remove_participant(
    state: web::Data<Arc<RwLock<AppState>>>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (plan_id, participant_id) = path.into_inner();
    let mut state = state.write().await;
    let participant = state.plan_store.remove_participant(plan_id, participant_id)?;

    info!(
        plan_id = %plan_id,
        participant_id = %participant_id,
        "Participant removed"
    );

    Ok(HttpResponse::Ok().json(participant))
}

/// List the builtin plan templates
///
/// GET /api/templates
pub async fn list_templates() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(templates::catalog()))
}

/// Alert feed, newest first
///
/// GET /api/alerts
pub async fn list_alerts(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    Ok(HttpResponse::Ok().json(state.recent_alerts()))
}

/// Get user settings
///
/// GET /api/settings
pub async fn get_settings(
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, AppError> {
    let state = state.read().await;
    Ok(HttpResponse::Ok().json(&state.settings))
}

/// Replace user settings
///
/// PUT /api/settings
pub async fn update_settings(
    state: web::Data<Arc<RwLock<AppState>>>,
    body: web::Json<UserSettings>,
) -> Result<HttpResponse, AppError> {
    let mut state = state.write().await;
    state.settings = body.into_inner();

    info!(
        critical_only = state.settings.notifications.critical_only,
        temp_unit = ?state.settings.preferences.temp_unit,
        "Settings updated"
    );

    Ok(HttpResponse::Ok().json(&state.settings))
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<Arc<RwLock<AppState>>>,
) -> Result<HttpResponse, actix_web::Error> {
    let client_id = Uuid::new_v4().to_string();

    info!(client_id = %client_id, "WebSocket connection request");

    // Register client
    {
        let mut state = state.write().await;
        state.add_client(client_id.clone());
    }

    let ws_session = WsSession::new(client_id, state.get_ref().clone());

    actix_web_actors::ws::start(ws_session, &req, stream)
}

/// Extract or generate correlation ID from request headers
fn extract_correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
