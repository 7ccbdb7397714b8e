use crate::orbit::GroundTrackPoint;

/// Longitude step above which two neighbouring points are taken to straddle
/// the antimeridian.
const WRAP_THRESHOLD_DEG: f64 = 180.0;

/// Split a time-ordered track into runs that can each be drawn as one
/// polyline. Concatenating the runs gives back the input.
pub fn segment(track: &[GroundTrackPoint]) -> Vec<Vec<GroundTrackPoint>> {
    let mut segments = Vec::new();
    let Some((first, rest)) = track.split_first() else {
        return segments;
    };

    let mut current = vec![*first];
    let mut previous = first;
    for point in rest {
        if (point.longitude - previous.longitude).abs() > WRAP_THRESHOLD_DEG {
            segments.push(std::mem::take(&mut current));
        }
        current.push(*point);
        previous = point;
    }
    segments.push(current);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> GroundTrackPoint {
        GroundTrackPoint::new(lat, lng)
    }

    #[test]
    fn empty_and_single() {
        assert!(segment(&[]).is_empty());
        assert_eq!(segment(&[p(1.0, 2.0)]), vec![vec![p(1.0, 2.0)]]);
    }

    #[test]
    fn splits_at_antimeridian() {
        let track = [p(51.2, 179.5), p(51.1, -179.7)];
        assert_eq!(
            segment(&track),
            vec![vec![p(51.2, 179.5)], vec![p(51.1, -179.7)]]
        );
    }

    #[test]
    fn exactly_180_is_not_a_wrap() {
        let track = [p(0.0, -90.0), p(0.0, 90.0)];
        assert_eq!(segment(&track).len(), 1);
    }

    #[test]
    fn multiple_crossings_preserve_order() {
        let track = [
            p(0.0, 170.0),
            p(1.0, 176.0),
            p(2.0, -178.0),
            p(3.0, -172.0),
            p(4.0, 179.0),
            p(5.0, 10.0),
        ];
        let segments = segment(&track);
        assert_eq!(segments.len(), 3);

        for run in &segments {
            for pair in run.windows(2) {
                assert!((pair[1].longitude - pair[0].longitude).abs() <= WRAP_THRESHOLD_DEG);
            }
        }
        let flattened: Vec<_> = segments.concat();
        assert_eq!(flattened, track);
    }
}
