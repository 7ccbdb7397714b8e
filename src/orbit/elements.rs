use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements, Prediction};

use super::error::OrbitError;

const MINUTES_PER_DAY: f64 = 1440.0;

/// A parsed two-line element set together with the SGP4 constants derived
/// from it. Immutable once built; the cache swaps whole instances.
pub struct OrbitalElements {
    elements: Elements,
    constants: Constants,
}

impl OrbitalElements {
    pub fn from_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, OrbitError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    /// Parse the text served by an element-set endpoint. The first line names
    /// the object and is discarded; lines two and three carry the elements.
    pub fn from_response(text: &str) -> Result<Self, OrbitError> {
        let lines: Vec<&str> = text
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        if lines.len() < 3 {
            return Err(OrbitError::InvalidTleFormat(lines.len()));
        }

        Self::from_lines(None, lines[1], lines[2])
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    pub fn inclination_deg(&self) -> f64 {
        self.elements.inclination
    }

    /// Minutes per revolution.
    pub fn orbital_period_min(&self) -> f64 {
        orbital_period_min(self.elements.mean_motion)
    }

    /// Propagate to `timestamp`, returning TEME position (km) and velocity (km/s).
    pub fn propagate(&self, timestamp: DateTime<Utc>) -> Result<Prediction, OrbitError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| OrbitError::Propagation(e.to_string()))?;

        Ok(self.constants.propagate(minutes)?)
    }
}

pub fn orbital_period_min(mean_motion_rev_per_day: f64) -> f64 {
    MINUTES_PER_DAY / mean_motion_rev_per_day
}
