use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::attributes::{DerivedAttributes, Illumination, Visibility};
use super::position::PositionSample;
use crate::orbit::GroundTrackPoint;

/// Serialized wire message, shared by every subscriber of one cycle.
pub type Payload = Arc<str>;

/// The published unit of one broadcast cycle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub velocity: f64,
    #[schema(value_type = Vec<Vec<f64>>)]
    pub orbit_points: Vec<GroundTrackPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daylight: Option<Illumination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclination: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    pub crew_count: u32,
    #[serde(skip)]
    pub generated_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    pub fn assemble(
        sample: PositionSample,
        track: Vec<GroundTrackPoint>,
        attributes: Option<DerivedAttributes>,
        crew_count: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lat: sample.latitude,
            lng: sample.longitude,
            altitude: sample.altitude_km,
            velocity: sample.velocity,
            orbit_points: track,
            daylight: attributes.map(|a| a.daylight),
            visibility: attributes.map(|a| a.visibility),
            inclination: attributes.map(|a| a.inclination),
            period: attributes.map(|a| a.period),
            crew_count,
            generated_at,
        }
    }
}

/// Envelope pushed to consumers: `{"iss": {...}}`.
#[derive(Debug, Serialize)]
pub struct TelemetryMessage<'a> {
    pub iss: &'a TelemetrySnapshot,
}

/// A snapshot together with its serialized form.
#[derive(Debug)]
pub struct Published {
    pub snapshot: TelemetrySnapshot,
    pub payload: Payload,
}

impl Published {
    pub fn new(snapshot: TelemetrySnapshot) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_string(&TelemetryMessage { iss: &snapshot })?;
        Ok(Self {
            snapshot,
            payload: payload.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PositionSample {
        PositionSample {
            latitude: 51.2,
            longitude: 179.5,
            altitude_km: 420.1,
            velocity: 7.66,
        }
    }

    #[test]
    fn wire_shape_with_attributes() {
        let attributes = DerivedAttributes {
            daylight: Illumination::Night,
            visibility: Visibility::NotVisible,
            inclination: 51.64,
            period: 92.5,
        };
        let snapshot = TelemetrySnapshot::assemble(
            sample(),
            vec![GroundTrackPoint::new(51.0, 178.0)],
            Some(attributes),
            7,
            Utc::now(),
        );
        let published = Published::new(snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&published.payload).unwrap();
        assert_eq!(
            value,
            json!({
                "iss": {
                    "lat": 51.2,
                    "lng": 179.5,
                    "altitude": 420.1,
                    "velocity": 7.66,
                    "orbitPoints": [[51.0, 178.0]],
                    "daylight": "Night",
                    "visibility": "Not Visible",
                    "inclination": 51.64,
                    "period": 92.5,
                    "crewCount": 7
                }
            })
        );
    }

    #[test]
    fn attributes_omitted_without_elements() {
        let snapshot = TelemetrySnapshot::assemble(sample(), Vec::new(), None, 7, Utc::now());
        let published = Published::new(snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&published.payload).unwrap();
        let iss = value["iss"].as_object().unwrap();
        assert!(!iss.contains_key("daylight"));
        assert!(!iss.contains_key("period"));
        assert_eq!(iss["orbitPoints"], json!([]));
        assert_eq!(iss["crewCount"], json!(7));
    }
}
