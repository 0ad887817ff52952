//! Demographic estimator.
//!
//! A bounded random walk nudged by face detections. Gender is rescaled so
//! it always sums to 100. Age brackets and nationality are clamped per field
//! and not renormalized, so their totals drift.

use parking_lot::RwLock;
use rand::Rng;

use sentinel_core::{AgeBreakdown, DemographicData, GenderBreakdown, NationalityBreakdown};

/// Probability that a face detection moves the estimate
const UPDATE_PROBABILITY: f64 = 0.3;

/// Share of the gender split given to male/female before rounding
const BINARY_GENDER_SHARE: f64 = 98.0;

const AGE_BANDS: [(f64, f64); 6] = [
    (5.0, 20.0),
    (15.0, 35.0),
    (20.0, 40.0),
    (10.0, 30.0),
    (5.0, 20.0),
    (2.0, 15.0),
];

const DOMESTIC_BAND: (f64, f64) = (60.0, 90.0);
const INTERNATIONAL_BAND: (f64, f64) = (10.0, 40.0);

pub struct DemographicEstimator {
    data: RwLock<DemographicData>,
}

impl DemographicEstimator {
    pub fn new() -> Self {
        Self::with_data(DemographicData::default())
    }

    pub fn with_data(data: DemographicData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn snapshot(&self) -> DemographicData {
        *self.data.read()
    }

    /// Roll the 30% gate and update on success
    pub fn maybe_update<R: Rng>(&self, rng: &mut R) -> bool {
        if rng.gen_bool(UPDATE_PROBABILITY) {
            self.update(rng);
            true
        } else {
            false
        }
    }

    /// Apply one random-walk step in place
    pub fn update<R: Rng>(&self, rng: &mut R) {
        let mut data = self.data.write();
        data.gender = step_gender(&data.gender, rng);
        data.age = step_age(&data.age, rng);
        data.nationality = step_nationality(&data.nationality, rng);
        tracing::debug!(
            male = data.gender.male,
            female = data.gender.female,
            age_total = data.age.total(),
            "demographics updated"
        );
    }
}

impl Default for DemographicEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn jitter<R: Rng>(rng: &mut R, amplitude: f64) -> f64 {
    rng.gen_range(-amplitude..=amplitude)
}

fn step_gender<R: Rng>(gender: &GenderBreakdown, rng: &mut R) -> GenderBreakdown {
    let male = (gender.male + jitter(rng, 2.0)).max(0.0);
    let female = (gender.female + jitter(rng, 2.0)).max(0.0);
    let total = male + female;
    if total <= 0.0 {
        return *gender;
    }

    let male = (male / total * BINARY_GENDER_SHARE).round();
    let female = (female / total * BINARY_GENDER_SHARE).round();
    GenderBreakdown {
        male,
        female,
        other: 100.0 - male - female,
    }
}

fn step_age<R: Rng>(age: &AgeBreakdown, rng: &mut R) -> AgeBreakdown {
    let values = [
        age.under18,
        age.age18to24,
        age.age25to34,
        age.age35to44,
        age.age45to54,
        age.age55plus,
    ];
    let mut next = [0.0; 6];
    for (i, (value, (lo, hi))) in values.iter().zip(AGE_BANDS).enumerate() {
        next[i] = (*value + jitter(rng, 2.0)).clamp(lo, hi);
    }

    AgeBreakdown {
        under18: next[0],
        age18to24: next[1],
        age25to34: next[2],
        age35to44: next[3],
        age45to54: next[4],
        age55plus: next[5],
    }
}

fn step_nationality<R: Rng>(
    nationality: &NationalityBreakdown,
    rng: &mut R,
) -> NationalityBreakdown {
    NationalityBreakdown {
        domestic: (nationality.domestic + jitter(rng, 3.0))
            .clamp(DOMESTIC_BAND.0, DOMESTIC_BAND.1),
        international: (nationality.international + jitter(rng, 3.0))
            .clamp(INTERNATIONAL_BAND.0, INTERNATIONAL_BAND.1),
    }
}
