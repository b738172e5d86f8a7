// HTTP request handlers
use crate::application::error::HubError;
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use crate::domain::insight::{AnalysisResult, Insight};
use crate::presentation::app_state::AppState;
use crate::presentation::extract::ApiJson;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default, rename = "dashboardId", alias = "visualizationId")]
    pub dashboard_id: String,
    #[serde(default)]
    pub image: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_visualizations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Dashboard>>, HubError> {
    Ok(Json(state.dashboard_service.list().await?))
}

pub async fn create_visualization(
    State(state): State<Arc<AppState>>,
    ApiJson(draft): ApiJson<DashboardDraft>,
) -> Result<(StatusCode, Json<Dashboard>), HubError> {
    let dashboard = state.dashboard_service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(dashboard)))
}

pub async fn update_visualization(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    ApiJson(patch): ApiJson<DashboardPatch>,
) -> Result<Json<Dashboard>, HubError> {
    Ok(Json(state.dashboard_service.update(&id, patch).await?))
}

pub async fn delete_visualization(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HubError> {
    state.dashboard_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Past analyses for a dashboard, newest first
pub async fn list_insights(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Insight>>, HubError> {
    Ok(Json(state.analysis_service.insights_for(&id).await?))
}

pub async fn generate_analysis(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, HubError> {
    let result = state
        .analysis_service
        .analyze_and_persist(&request.dashboard_id, &request.image)
        .await?;
    Ok(Json(result))
}
