//! Demographic estimate shown on the dashboard.
//!
//! All values are percentages. Gender always sums to 100; the age and
//! nationality groups are clamped per field and may drift away from 100.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenderBreakdown {
    pub male: f64,
    pub female: f64,
    pub other: f64,
}

impl GenderBreakdown {
    pub fn total(&self) -> f64 {
        self.male + self.female + self.other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeBreakdown {
    pub under18: f64,
    pub age18to24: f64,
    pub age25to34: f64,
    pub age35to44: f64,
    pub age45to54: f64,
    pub age55plus: f64,
}

impl AgeBreakdown {
    pub fn total(&self) -> f64 {
        self.under18
            + self.age18to24
            + self.age25to34
            + self.age35to44
            + self.age45to54
            + self.age55plus
    }

    /// Brackets paired with their display labels, youngest first
    pub fn brackets(&self) -> [(&'static str, f64); 6] {
        [
            ("Under 18", self.under18),
            ("18-24", self.age18to24),
            ("25-34", self.age25to34),
            ("35-44", self.age35to44),
            ("45-54", self.age45to54),
            ("55+", self.age55plus),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NationalityBreakdown {
    pub domestic: f64,
    pub international: f64,
}

impl NationalityBreakdown {
    pub fn total(&self) -> f64 {
        self.domestic + self.international
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemographicData {
    pub gender: GenderBreakdown,
    pub age: AgeBreakdown,
    pub nationality: NationalityBreakdown,
}

impl Default for DemographicData {
    fn default() -> Self {
        Self {
            gender: GenderBreakdown {
                male: 58.0,
                female: 40.0,
                other: 2.0,
            },
            age: AgeBreakdown {
                under18: 12.0,
                age18to24: 25.0,
                age25to34: 30.0,
                age35to44: 18.0,
                age45to54: 10.0,
                age55plus: 5.0,
            },
            nationality: NationalityBreakdown {
                domestic: 75.0,
                international: 25.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups_sum_to_100() {
        let data = DemographicData::default();
        assert_eq!(data.gender.total(), 100.0);
        assert_eq!(data.age.total(), 100.0);
        assert_eq!(data.nationality.total(), 100.0);
    }

    #[test]
    fn test_age_wire_names() {
        let json = serde_json::to_value(DemographicData::default()).unwrap();
        assert_eq!(json["age"]["age18to24"], 25.0);
        assert_eq!(json["age"]["age55plus"], 5.0);
        assert_eq!(json["nationality"]["domestic"], 75.0);
    }
}
