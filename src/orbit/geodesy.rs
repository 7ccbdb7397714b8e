use chrono::{DateTime, Utc};

// WGS-84
const EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Greenwich mean sidereal time in radians.
pub fn gmst(timestamp: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&timestamp.naive_utc()))
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Iterative ECEF to geodetic conversion on the WGS-84 ellipsoid.
pub fn ecef_to_geodetic(pos: [f64; 3]) -> Geodetic {
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let r = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    let longitude = pos[1].atan2(pos[0]);

    let mut latitude = pos[2].atan2(r);
    for _ in 0..10 {
        let previous = latitude;
        let sin_lat = previous.sin();
        let c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (pos[2] + EQUATORIAL_RADIUS_KM * c * e2 * sin_lat).atan2(r);
        if (latitude - previous).abs() < 1e-10 {
            break;
        }
    }

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: wrap_longitude_deg(longitude.to_degrees()),
    }
}

/// Geodetic position under a TEME vector at `timestamp`.
pub fn teme_to_geodetic(pos_teme: [f64; 3], timestamp: DateTime<Utc>) -> Geodetic {
    ecef_to_geodetic(teme_to_ecef_position(pos_teme, gmst(timestamp)))
}

/// Normalize to [-180, 180).
pub fn wrap_longitude_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
