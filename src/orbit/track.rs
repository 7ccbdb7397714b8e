use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::elements::OrbitalElements;
use super::geodesy::teme_to_geodetic;

/// A point of the ground track, serialized as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GroundTrackPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GroundTrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<[f64; 2]> for GroundTrackPoint {
    fn from([latitude, longitude]: [f64; 2]) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<GroundTrackPoint> for [f64; 2] {
    fn from(point: GroundTrackPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

/// Upper bound on samples either side of the center: a day at one-minute steps.
pub const MAX_TRACK_STEPS: u32 = 1440;

/// Symmetric window around a center time: `steps` samples before and after,
/// `step` apart.
#[derive(Debug, Clone, Copy)]
pub struct TrackWindow {
    pub steps: u32,
    pub step: Duration,
}

impl Default for TrackWindow {
    fn default() -> Self {
        Self {
            steps: 90,
            step: Duration::minutes(1),
        }
    }
}

impl TrackWindow {
    /// Number of samples either side, never more than [`MAX_TRACK_STEPS`].
    pub fn bounded_steps(&self) -> u32 {
        self.steps.min(MAX_TRACK_STEPS)
    }

    pub fn offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        let steps = self.bounded_steps() as i32;
        (-steps..=steps).map(move |i| self.step * i)
    }
}

/// Ground track centered on `center`, ordered by time. Steps that fail to
/// propagate are left out; missing elements yield an empty track.
pub fn track_since(
    elements: Option<&OrbitalElements>,
    center: DateTime<Utc>,
    window: TrackWindow,
) -> Vec<GroundTrackPoint> {
    let Some(elements) = elements else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(2 * window.bounded_steps() as usize + 1);
    for offset in window.offsets() {
        let timestamp = center + offset;
        match elements.propagate(timestamp) {
            Ok(prediction) => {
                let geo = teme_to_geodetic(prediction.position, timestamp);
                points.push(GroundTrackPoint::new(geo.latitude_deg, geo.longitude_deg));
            }
            Err(e) => {
                log::debug!("skipping track step at {}: {}", timestamp, e);
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::elements::tests::iss_elements;

    #[test]
    fn missing_elements_give_empty_track() {
        assert!(track_since(None, Utc::now(), TrackWindow::default()).is_empty());
    }

    #[test]
    fn full_window_around_epoch() {
        let elements = iss_elements();
        let track = track_since(Some(&elements), elements.epoch(), TrackWindow::default());
        assert_eq!(track.len(), 181);
        for point in &track {
            assert!(point.latitude.abs() <= 52.5, "{point:?}");
            assert!((-180.0..180.0).contains(&point.longitude), "{point:?}");
        }
    }

    #[test]
    fn consecutive_points_are_a_minute_apart() {
        let elements = iss_elements();
        let window = TrackWindow {
            steps: 5,
            step: Duration::minutes(1),
        };
        let track = track_since(Some(&elements), elements.epoch(), window);
        assert_eq!(track.len(), 11);
        // ~7.7 km/s ground speed is about 4 degrees of arc per minute
        for pair in track.windows(2) {
            let dlat = (pair[1].latitude - pair[0].latitude).abs();
            assert!(dlat < 5.0, "{pair:?}");
        }
    }

    #[test]
    fn oversized_window_is_bounded() {
        let window = TrackWindow {
            steps: u32::MAX,
            step: Duration::minutes(1),
        };
        let offsets: Vec<_> = window.offsets().collect();
        assert_eq!(offsets.len(), 2 * MAX_TRACK_STEPS as usize + 1);
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(offsets[0], -Duration::minutes(i64::from(MAX_TRACK_STEPS)));
    }

    #[test]
    fn serializes_as_pairs() {
        let json = serde_json::to_string(&vec![GroundTrackPoint::new(51.2, 179.5)]).unwrap();
        assert_eq!(json, "[[51.2,179.5]]");
    }
}
