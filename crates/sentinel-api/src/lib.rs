//! # Sentinel-API
//!
//! HTTP dashboard API for the security-monitoring engine.
//!
//! ## Endpoints
//!
//! ### Monitoring
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/dashboard` - Camera grid, recent alerts and special detections
//! - `GET /api/v1/live` - Active camera view with threshold-filtered detections
//! - `GET /api/v1/detections?camera_id=` - Live detections
//! - `GET /api/v1/demographics` - Crowd demographic estimate
//! - `GET /api/v1/analytics/crowd-density` - Hourly crowd counts
//! - `GET /api/v1/analytics/heatmap` - Crowd heatmap points
//!
//! ### Cameras
//! - `GET|POST /api/v1/cameras` - List or add cameras
//! - `POST /api/v1/cameras/refresh` - Reload cameras from the video source
//! - `PUT /api/v1/cameras/active` - Select the active camera
//! - `DELETE /api/v1/cameras/:id` - Remove a camera
//! - `POST|DELETE /api/v1/cameras/:id/playback-error` - Report or retry a playback failure
//!
//! ### Alerts
//! - `GET /api/v1/alerts` - Filtered alert list
//! - `POST /api/v1/alerts/:id/acknowledge` - Acknowledge an alert
//! - `DELETE /api/v1/alerts/:id` - Delete an alert
//! - `GET /api/v1/reports` - Type distribution and daily timeline
//!
//! ### Settings
//! - `GET|PUT /api/v1/settings/{ai,notifications,servers,detection-types}`

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;
pub mod views;

pub use config::*;
pub use server::*;
pub use state::*;
