//! Request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use sentinel_core::{
    Alert, AlertId, Camera, CameraId, CameraStatus, DemographicData, Detection, Error, Timestamp,
};
use sentinel_engine::{AiSettings, HeatPoint, HourlyDensity};

use crate::error::ApiResult;
use crate::settings::{DetectionTypeSettings, NotificationSettings, ServerSettings};
use crate::state::AppState;
use crate::views::{AlertFilter, AlertQuery, AlertReport, DashboardSummary, LiveView};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub running: bool,
    pub processing: bool,
    pub cameras: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        running: state.engine.is_running(),
        processing: state.engine.is_processing(),
        cameras: state.engine.registry().len(),
    })
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardSummary> {
    Json(DashboardSummary::build(&state.engine))
}

pub async fn live(State(state): State<AppState>) -> Json<LiveView> {
    Json(LiveView::build(&state.engine))
}

/// Hourly crowd counts for the density chart
pub async fn crowd_density(State(state): State<AppState>) -> Json<Vec<HourlyDensity>> {
    Json(state.engine.crowd_density())
}

pub async fn heatmap(State(state): State<AppState>) -> Json<Vec<HeatPoint>> {
    Json(state.engine.heatmap())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionQuery {
    pub camera_id: Option<String>,
}

/// Current detections, newest first
pub async fn detections(
    State(state): State<AppState>,
    Query(query): Query<DetectionQuery>,
) -> Json<Vec<Detection>> {
    let store = state.engine.detections();
    Json(match query.camera_id {
        Some(id) => store.for_camera(&CameraId::new(id)),
        None => store.snapshot(),
    })
}

// ── Cameras ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraList {
    pub cameras: Vec<Camera>,
    pub active_camera_id: Option<CameraId>,
    pub loading: bool,
}

fn camera_list(state: &AppState) -> CameraList {
    let registry = state.engine.registry();
    CameraList {
        cameras: registry.cameras(),
        active_camera_id: registry.active_camera_id(),
        loading: registry.is_loading(),
    }
}

pub async fn list_cameras(State(state): State<AppState>) -> Json<CameraList> {
    Json(camera_list(&state))
}

/// Manually added camera
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCamera {
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub stream_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub status: Option<CameraStatus>,
}

pub async fn add_camera(
    State(state): State<AppState>,
    Json(request): Json<NewCamera>,
) -> ApiResult<(StatusCode, Json<Camera>)> {
    if request.name.trim().is_empty() {
        return Err(Error::InvalidInput("camera name is required".into()).into());
    }
    if request.stream_url.trim().is_empty() {
        return Err(Error::InvalidInput("stream url is required".into()).into());
    }

    let camera = Camera {
        id: CameraId::new(Timestamp::now().as_millis().to_string()),
        name: request.name.trim().to_string(),
        location: request.location,
        stream_url: request.stream_url,
        thumbnail_url: request
            .thumbnail_url
            .unwrap_or_else(|| state.engine.config().placeholder_thumbnail.clone()),
        status: request.status.unwrap_or(CameraStatus::Online),
    };
    state.engine.registry().add_camera(camera.clone());
    Ok((StatusCode::CREATED, Json(camera)))
}

pub async fn remove_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.engine.registry().remove_camera(&CameraId::new(id.clone())) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::CameraNotFound(id).into())
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub count: usize,
}

pub async fn refresh_cameras(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let count = state.engine.refresh_cameras().await?;
    Ok(Json(RefreshResponse { count }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCameraRequest {
    pub camera_id: Option<String>,
}

/// Set the active camera; the id is not checked against the list
pub async fn set_active_camera(
    State(state): State<AppState>,
    Json(request): Json<ActiveCameraRequest>,
) -> Json<CameraList> {
    state
        .engine
        .registry()
        .set_active_camera_id(request.camera_id.map(CameraId::new));
    Json(camera_list(&state))
}

#[derive(Debug, Deserialize)]
pub struct PlaybackErrorReport {
    pub message: String,
}

pub async fn report_playback_error(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(report): Json<PlaybackErrorReport>,
) -> ApiResult<StatusCode> {
    let id = CameraId::new(id);
    if state.engine.registry().camera(&id).is_none() {
        return Err(Error::CameraNotFound(id.to_string()).into());
    }
    state.engine.registry().report_playback_error(&id, report.message);
    Ok(StatusCode::NO_CONTENT)
}

/// Manual retry: clear playback and processing errors
pub async fn retry_camera(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = CameraId::new(id);
    if state.engine.registry().camera(&id).is_none() {
        return Err(Error::CameraNotFound(id.to_string()).into());
    }
    state.engine.retry_camera(&id);
    Ok(StatusCode::NO_CONTENT)
}

// ── Alerts & reports ─────────────────────────────────────────────────────────

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> ApiResult<Json<Vec<Alert>>> {
    let filter = AlertFilter::from_query(&query, Timestamp::now())?;
    Ok(Json(filter.apply(state.engine.alerts().snapshot())))
}

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Alert>> {
    let id = AlertId(id);
    let alerts = state.engine.alerts();
    if !alerts.acknowledge_alert(&id) {
        return Err(Error::AlertNotFound(id.to_string()).into());
    }
    alerts
        .get(&id)
        .map(Json)
        .ok_or_else(|| Error::AlertNotFound(id.to_string()).into())
}

pub async fn remove_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = AlertId(id);
    if state.engine.alerts().remove_alert(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::AlertNotFound(id.to_string()).into())
    }
}

pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> ApiResult<Json<AlertReport>> {
    let filter = AlertFilter::from_query(&query, Timestamp::now())?;
    Ok(Json(AlertReport::build(state.engine.alerts().snapshot(), filter)))
}

pub async fn demographics(State(state): State<AppState>) -> Json<DemographicData> {
    Json(state.engine.demographics().snapshot())
}

// ── Settings ─────────────────────────────────────────────────────────────────

pub async fn get_ai_settings(State(state): State<AppState>) -> Json<AiSettings> {
    Json(state.engine.ai_settings())
}

pub async fn put_ai_settings(
    State(state): State<AppState>,
    Json(settings): Json<AiSettings>,
) -> Json<AiSettings> {
    Json(state.engine.set_ai_settings(settings))
}

pub async fn get_notifications(State(state): State<AppState>) -> Json<NotificationSettings> {
    Json(state.settings.notifications())
}

pub async fn put_notifications(
    State(state): State<AppState>,
    Json(settings): Json<NotificationSettings>,
) -> ApiResult<Json<NotificationSettings>> {
    Ok(Json(state.settings.set_notifications(settings)?))
}

pub async fn get_servers(State(state): State<AppState>) -> Json<ServerSettings> {
    Json(state.settings.servers())
}

pub async fn put_servers(
    State(state): State<AppState>,
    Json(settings): Json<ServerSettings>,
) -> Json<ServerSettings> {
    Json(state.settings.set_servers(settings))
}

pub async fn get_detection_types(State(state): State<AppState>) -> Json<DetectionTypeSettings> {
    Json(state.settings.detection_types())
}

pub async fn put_detection_types(
    State(state): State<AppState>,
    Json(settings): Json<DetectionTypeSettings>,
) -> Json<DetectionTypeSettings> {
    Json(state.settings.set_detection_types(settings))
}

// ── Landing ──────────────────────────────────────────────────────────────────

const LANDING_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sentinel</title></head>
<body>
<h1>Sentinel security monitoring</h1>
<p>AI-assisted camera monitoring: live detections, alerts, reports and crowd demographics.</p>
<ul>
<li><a href="/api/v1/health">/api/v1/health</a></li>
<li><a href="/api/v1/dashboard">/api/v1/dashboard</a></li>
<li><a href="/api/v1/live">/api/v1/live</a></li>
<li><a href="/api/v1/cameras">/api/v1/cameras</a></li>
<li><a href="/api/v1/alerts">/api/v1/alerts</a></li>
<li><a href="/api/v1/reports">/api/v1/reports</a></li>
<li><a href="/api/v1/demographics">/api/v1/demographics</a></li>
<li><a href="/api/v1/analytics/crowd-density">/api/v1/analytics/crowd-density</a></li>
<li><a href="/api/v1/analytics/heatmap">/api/v1/analytics/heatmap</a></li>
<li><a href="/api/v1/settings/ai">/api/v1/settings/ai</a></li>
</ul>
</body>
</html>
"#;

pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
