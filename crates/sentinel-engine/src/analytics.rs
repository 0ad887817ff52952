//! Synthesized crowd analytics for the dashboard charts.
//!
//! Neither series is backed by detections: the density chart follows a
//! daily pattern with morning, lunch and evening peaks, and the heatmap
//! places jittered points on fixed floor-plan hotspots.

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// People counted in one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyDensity {
    pub hour: u8,
    pub count: u32,
}

/// Count range for an hour of the day
pub fn density_band(hour: u8) -> Range<u32> {
    match hour {
        8..=10 => 50..90,
        12..=14 => 60..90,
        17..=19 => 70..100,
        0..=6 | 22..=u8::MAX => 5..20,
        _ => 20..50,
    }
}

/// One random count per hour, 0 through 23
pub fn crowd_density_series<R: Rng>(rng: &mut R) -> Vec<HourlyDensity> {
    (0..24u8)
        .map(|hour| HourlyDensity {
            hour,
            count: rng.gen_range(density_band(hour)),
        })
        .collect()
}

/// Heatmap point in percent of the floor plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub x: f64,
    pub y: f64,
    /// 0-1
    pub intensity: f64,
    /// Rendered diameter
    pub size: f64,
}

/// Floor-plan hotspots as (x, y, base intensity)
pub const HOTSPOTS: [(f64, f64, f64); 5] = [
    (25.0, 25.0, 0.8),
    (75.0, 25.0, 0.6),
    (25.0, 75.0, 0.4),
    (65.0, 65.0, 0.9),
    (50.0, 50.0, 0.7),
];

/// The five hotspots, jittered, followed by 8 to 12 scattered points
pub fn heatmap<R: Rng>(rng: &mut R) -> Vec<HeatPoint> {
    let scattered = rng.gen_range(8..=12);
    let mut points = Vec::with_capacity(HOTSPOTS.len() + scattered);

    for (x, y, base) in HOTSPOTS {
        points.push(HeatPoint {
            x: x + rng.gen_range(-5.0..5.0),
            y: y + rng.gen_range(-5.0..5.0),
            intensity: base + rng.gen_range(-0.1..0.1),
            size: rng.gen_range(40.0..70.0),
        });
    }

    for _ in 0..scattered {
        points.push(HeatPoint {
            x: rng.gen_range(10.0..90.0),
            y: rng.gen_range(10.0..90.0),
            intensity: rng.gen_range(0.0..0.7),
            size: rng.gen_range(15.0..35.0),
        });
    }
    points
}
