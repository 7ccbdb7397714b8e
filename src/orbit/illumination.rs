use chrono::{DateTime, Utc};

use super::elements::OrbitalElements;
use super::sun::{in_earth_shadow, solar_elevation_deg, sun_direction};

/// Source of the two lighting facts the relay publishes: how high the Sun
/// stands over a ground location, and whether the tracked object itself is
/// in sunlight.
pub trait IlluminationOracle: Send + Sync {
    fn solar_elevation_deg(&self, latitude_deg: f64, longitude_deg: f64, at: DateTime<Utc>) -> f64;

    fn is_sunlit(&self, elements: &OrbitalElements, at: DateTime<Utc>) -> bool;
}

/// Analytic Sun position with a cylindrical Earth shadow.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarEphemeris;

impl IlluminationOracle for SolarEphemeris {
    fn solar_elevation_deg(&self, latitude_deg: f64, longitude_deg: f64, at: DateTime<Utc>) -> f64 {
        solar_elevation_deg(latitude_deg, longitude_deg, at)
    }

    fn is_sunlit(&self, elements: &OrbitalElements, at: DateTime<Utc>) -> bool {
        match elements.propagate(at) {
            Ok(prediction) => !in_earth_shadow(prediction.position, sun_direction(at)),
            Err(e) => {
                log::debug!("sunlit check failed at {}: {}", at, e);
                false
            }
        }
    }
}
