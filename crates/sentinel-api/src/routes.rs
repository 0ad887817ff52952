//! Route table.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/dashboard", get(handlers::dashboard))
        .route("/live", get(handlers::live))
        .route("/detections", get(handlers::detections))
        .route("/demographics", get(handlers::demographics))
        .route("/analytics/crowd-density", get(handlers::crowd_density))
        .route("/analytics/heatmap", get(handlers::heatmap))
        // Cameras
        .route(
            "/cameras",
            get(handlers::list_cameras).post(handlers::add_camera),
        )
        .route("/cameras/refresh", post(handlers::refresh_cameras))
        .route("/cameras/active", put(handlers::set_active_camera))
        .route("/cameras/:id", delete(handlers::remove_camera))
        .route(
            "/cameras/:id/playback-error",
            post(handlers::report_playback_error).delete(handlers::retry_camera),
        )
        // Alerts
        .route("/alerts", get(handlers::list_alerts))
        .route("/alerts/:id", delete(handlers::remove_alert))
        .route("/alerts/:id/acknowledge", post(handlers::acknowledge_alert))
        .route("/reports", get(handlers::report))
        // Settings
        .route(
            "/settings/ai",
            get(handlers::get_ai_settings).put(handlers::put_ai_settings),
        )
        .route(
            "/settings/notifications",
            get(handlers::get_notifications).put(handlers::put_notifications),
        )
        .route(
            "/settings/servers",
            get(handlers::get_servers).put(handlers::put_servers),
        )
        .route(
            "/settings/detection-types",
            get(handlers::get_detection_types).put(handlers::put_detection_types),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentinelConfig;

    #[test]
    fn test_router_builds() {
        let state = AppState::from_config(&SentinelConfig::default()).unwrap();
        let _router = router(state);
    }
}
