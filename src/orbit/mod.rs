mod elements;
mod error;
mod geodesy;
mod illumination;
mod sun;
mod track;

pub use elements::OrbitalElements;
pub use error::OrbitError;
pub use illumination::{IlluminationOracle, SolarEphemeris};
pub use track::{track_since, GroundTrackPoint, TrackWindow, MAX_TRACK_STEPS};

#[cfg(test)]
pub(crate) use elements::tests as fixtures;
