//! Low-precision solar ephemeris (Astronomical Almanac approximation, good
//! to about 0.01 degrees between 1950 and 2050).

use chrono::{DateTime, Utc};

use super::geodesy::gmst;

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const EARTH_RADIUS_KM: f64 = 6378.137;

fn julian_date(timestamp: DateTime<Utc>) -> f64 {
    let seconds = timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / SECONDS_PER_DAY
}

/// Right ascension and declination of the Sun in radians.
fn equatorial(timestamp: DateTime<Utc>) -> (f64, f64) {
    let n = julian_date(timestamp) - J2000_JD;
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    let ra = (obliquity.cos() * ecliptic_longitude.sin()).atan2(ecliptic_longitude.cos());
    let dec = (obliquity.sin() * ecliptic_longitude.sin()).asin();
    (ra, dec)
}

/// Unit vector towards the Sun in an Earth-centred inertial frame.
pub fn sun_direction(timestamp: DateTime<Utc>) -> [f64; 3] {
    let (ra, dec) = equatorial(timestamp);
    [dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()]
}

/// Geometric elevation of the Sun above the horizon at a ground location, in degrees.
pub fn solar_elevation_deg(latitude_deg: f64, longitude_deg: f64, timestamp: DateTime<Utc>) -> f64 {
    let (ra, dec) = equatorial(timestamp);
    let lat = latitude_deg.to_radians();
    let hour_angle = gmst(timestamp) + longitude_deg.to_radians() - ra;
    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Cylindrical shadow test: the object is eclipsed when it is on the night
/// side of the Earth and within one Earth radius of the Sun-Earth axis.
pub fn in_earth_shadow(position_km: [f64; 3], sun_unit: [f64; 3]) -> bool {
    let along = position_km[0] * sun_unit[0] + position_km[1] * sun_unit[1] + position_km[2] * sun_unit[2];
    if along >= 0.0 {
        return false;
    }
    let perpendicular = [
        position_km[0] - along * sun_unit[0],
        position_km[1] - along * sun_unit[1],
        position_km[2] - along * sun_unit[2],
    ];
    let distance = (perpendicular[0] * perpendicular[0]
        + perpendicular[1] * perpendicular[1]
        + perpendicular[2] * perpendicular[2])
        .sqrt();
    distance < EARTH_RADIUS_KM
}
