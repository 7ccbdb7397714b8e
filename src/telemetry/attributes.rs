use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use super::position::PositionSample;
use crate::orbit::{IlluminationOracle, OrbitalElements};

/// Civil twilight: the Sun counts as up until it is 6 degrees below the horizon.
pub const DAYLIGHT_ELEVATION_DEG: f64 = -6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
pub enum Illumination {
    Daylight,
    Night,
}

impl Illumination {
    pub fn from_solar_elevation(elevation_deg: f64) -> Self {
        if elevation_deg > DAYLIGHT_ELEVATION_DEG {
            Illumination::Daylight
        } else {
            Illumination::Night
        }
    }
}

/// Whether the object itself is in sunlight, independent of the ground below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
pub enum Visibility {
    Visible,
    #[strum(serialize = "Not Visible")]
    #[serde(rename = "Not Visible")]
    NotVisible,
}

impl From<bool> for Visibility {
    fn from(sunlit: bool) -> Self {
        if sunlit {
            Visibility::Visible
        } else {
            Visibility::NotVisible
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct DerivedAttributes {
    pub daylight: Illumination,
    pub visibility: Visibility,
    /// Degrees.
    pub inclination: f64,
    /// Minutes per revolution.
    pub period: f64,
}

/// Attributes derived from one sample and the element set of the same cycle.
/// `None` while no element set has been fetched.
pub fn compute(
    elements: Option<&OrbitalElements>,
    sample: &PositionSample,
    at: DateTime<Utc>,
    oracle: &dyn IlluminationOracle,
) -> Option<DerivedAttributes> {
    let elements = elements?;
    let elevation = oracle.solar_elevation_deg(sample.latitude, sample.longitude, at);

    Some(DerivedAttributes {
        daylight: Illumination::from_solar_elevation(elevation),
        visibility: oracle.is_sunlit(elements, at).into(),
        inclination: elements.inclination_deg(),
        period: elements.orbital_period_min(),
    })
}
