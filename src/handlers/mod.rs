/// HTTP request handlers
use crate::domain::{
    AnalysisParams, AnalysisReport, DashboardMetrics, DepartureInput, ExportedRequest, Health,
    PredictionResponse, Recommendation, RecommendationRequest, TrainRecord, Zone,
};
use crate::errors::ApiError;
use crate::repo::TrainStore;
use crate::services::normalizer::normalize;
use crate::services::{DefaultProvider, LifecycleManager, MetricsService, PredictionService};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: TrainStore,
    pub lifecycle: Arc<LifecycleManager<DefaultProvider>>,
    pub metrics: Arc<MetricsService>,
    pub prediction: Arc<PredictionService>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrainQuery {
    pub zone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LiveToggle {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct PredictBody {
    pub trains: Vec<DepartureInput>,
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// List trains, optionally filtered by zone ("All Zones" means no filter)
pub async fn list_trains(
    Query(query): Query<TrainQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let zone = match query.zone.as_deref().map(str::trim) {
        None | Some("") | Some("All Zones") => None,
        Some(raw) => Some(raw.parse::<Zone>().map_err(ApiError::Validation)?),
    };

    let trains = state.store.list(zone);
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "trains": trains
        })
    ))))
}

/// Replace the whole fleet
pub async fn replace_trains(
    State(state): State<AppState>,
    Json(trains): Json<Vec<TrainRecord>>,
) -> Result<Json<Value>, ApiError> {
    info!("Replacing fleet with {} trains", trains.len());
    let count = state.store.replace_all(trains)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "count": count
        })
    ))))
}

/// Current simulated metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<SuccessResponse<DashboardMetrics>> {
    Json(SuccessResponse::new(state.metrics.current()))
}

/// Switch between live and static metrics
pub async fn set_live_metrics(
    State(state): State<AppState>,
    Json(toggle): Json<LiveToggle>,
) -> Json<SuccessResponse<DashboardMetrics>> {
    Json(SuccessResponse::new(state.metrics.set_live(toggle.enabled)))
}

/// Show the model request a form would produce
pub async fn preview_analysis(
    State(state): State<AppState>,
    Json(params): Json<AnalysisParams>,
) -> Result<Json<SuccessResponse<RecommendationRequest>>, ApiError> {
    let request = normalize(&state.store.snapshot(), params)?;
    Ok(Json(SuccessResponse::new(request)))
}

/// Download the model request as a pretty-printed JSON file
pub async fn export_analysis(
    State(state): State<AppState>,
    Json(params): Json<AnalysisParams>,
) -> Result<impl IntoResponse, ApiError> {
    let exported = ExportedRequest {
        request: normalize(&state.store.snapshot(), params)?,
        exported_at: Utc::now(),
    };
    let body = serde_json::to_string_pretty(&exported)?;
    let disposition = format!("attachment; filename=\"{}\"", exported.file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Normalize the form and run an analysis
pub async fn run_analysis(
    State(state): State<AppState>,
    Json(params): Json<AnalysisParams>,
) -> Result<Json<SuccessResponse<AnalysisReport>>, ApiError> {
    let request = normalize(&state.store.snapshot(), params)?;
    let report = state.lifecycle.run_analysis(request).await?;
    Ok(Json(SuccessResponse::new(report)))
}

/// Current result set with its summary
pub async fn get_analysis(State(state): State<AppState>) -> Json<SuccessResponse<AnalysisReport>> {
    Json(SuccessResponse::new(state.lifecycle.report()))
}

pub async fn apply_recommendation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<Recommendation>>, ApiError> {
    let rec = state.lifecycle.apply(&id)?;
    Ok(Json(SuccessResponse::new(rec)))
}

pub async fn reject_recommendation(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<Recommendation>>, ApiError> {
    let rec = state.lifecycle.reject(&id)?;
    Ok(Json(SuccessResponse::new(rec)))
}

/// Forward departure inputs to the backend predictor
pub async fn predict(
    State(state): State<AppState>,
    Json(body): Json<PredictBody>,
) -> Result<Json<SuccessResponse<PredictionResponse>>, ApiError> {
    let response = state.prediction.submit(&body.trains).await?;
    Ok(Json(SuccessResponse::new(response)))
}
