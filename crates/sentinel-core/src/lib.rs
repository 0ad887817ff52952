//! # Sentinel-Core
//!
//! Core types and utilities for the Sentinel security-monitoring backend:
//! cameras, AI detections, alerts and the demographic estimate shared by the
//! engine and the dashboard API.

pub mod demographics;
pub mod error;
pub mod types;

pub use demographics::*;
pub use error::{Error, Result};
pub use types::*;
