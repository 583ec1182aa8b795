//! Pure derivation of trip summary fields from a recorded point list.
//!
//! Spherical-earth haversine is accepted accuracy for recreational-trip
//! logging, not navigation-grade.

use chrono::{DateTime, Utc};
use geo_types::Rect;

use crate::{
    track_point::TrackPoint,
    trip::{NamedPoint, TripDraft},
};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const METERS_PER_NM: f64 = 1852.0;

/// Great-circle distance between two points in meters.
pub fn haversine_meters(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Sum of consecutive haversine segments, in nautical miles. Empty and
/// single-point routes have length zero.
pub fn route_distance_nm(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_meters(&pair[0], &pair[1]))
        .sum::<f64>()
        / METERS_PER_NM
}

/// Axis-aligned bounding box of a route, `None` for an empty one.
pub fn route_bounds(points: &[TrackPoint]) -> Option<Rect<f64>> {
    let first = points.first()?;

    let mut min = first.coord();
    let mut max = min;
    for point in &points[1..] {
        min.x = min.x.min(point.lng);
        min.y = min.y.min(point.lat);
        max.x = max.x.max(point.lng);
        max.y = max.y.max(point.lat);
    }

    Some(Rect::new(min, max))
}

/// Whole minutes between the session bounds, clamped to at least one.
/// The floor guards against zero or negative durations from clock skew and
/// sub-minute sessions.
pub fn clamped_duration_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> i64 {
    let minutes = (ended_at - started_at).num_seconds() as f64 / 60.0;
    (minutes.round() as i64).max(1)
}

/// Turns a recorded point list into a submittable trip draft.
///
/// Deterministic and idempotent. `points` must be non-empty, rejecting empty
/// sessions is a boundary policy and happens before this is called.
pub fn derive_trip(
    points: &[TrackPoint],
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    title: Option<String>,
) -> TripDraft {
    let first = &points[0];
    let last = &points[points.len() - 1];

    TripDraft {
        boat_id: None,
        title: title.unwrap_or_else(|| format!("Unnamed {}", started_at.date_naive())),
        date: started_at,
        duration_minutes: clamped_duration_minutes(started_at, ended_at),
        start: NamedPoint::unnamed(first.lat, first.lng),
        end: NamedPoint::unnamed(last.lat, last.lng),
        route: points.to_vec(),
        distance_nm: route_distance_nm(points),
        photos: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        "2024-06-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn stockholm_segment_matches_expected_distance() {
        let points = vec![
            TrackPoint::new(59.3293, 18.0686, t0()),
            TrackPoint::new(59.3326, 18.0649, t0() + Duration::seconds(600)),
        ];

        let draft = derive_trip(&points, t0(), t0() + Duration::seconds(600), None);

        assert!((draft.distance_nm - 0.22).abs() < 0.03, "{}", draft.distance_nm);
        assert_eq!(draft.duration_minutes, 10);
    }

    #[test]
    fn distance_is_nonnegative_and_equals_segment_sum() {
        let points: Vec<TrackPoint> = (0..5)
            .map(|i| {
                TrackPoint::new(
                    56.0 + i as f64 * 0.01,
                    10.2 + i as f64 * 0.01,
                    t0() + Duration::seconds(i * 60),
                )
            })
            .collect();

        let total = route_distance_nm(&points);
        assert!(total >= 0.0);

        let segment_sum: f64 = points
            .windows(2)
            .map(|pair| haversine_meters(&pair[0], &pair[1]) / METERS_PER_NM)
            .sum();
        assert!((total - segment_sum).abs() < 1e-9);
    }

    #[test]
    fn duration_clamps_to_one_minute() {
        // Clock skew, end before start.
        assert_eq!(
            clamped_duration_minutes(t0(), t0() - Duration::seconds(30)),
            1
        );
        // Sub-minute session.
        assert_eq!(
            clamped_duration_minutes(t0(), t0() + Duration::seconds(10)),
            1
        );
        assert_eq!(
            clamped_duration_minutes(t0(), t0() + Duration::seconds(150)),
            3
        );
    }

    #[test]
    fn single_point_session() {
        let points = vec![TrackPoint::new(59.3293, 18.0686, t0())];
        let draft = derive_trip(&points, t0(), t0() + Duration::minutes(5), None);

        assert_eq!(draft.distance_nm, 0.0);
        assert_eq!(draft.start, draft.end);
    }

    #[test]
    fn identical_consecutive_points_add_no_distance() {
        let points = vec![
            TrackPoint::new(59.3293, 18.0686, t0()),
            TrackPoint::new(59.3293, 18.0686, t0() + Duration::seconds(5)),
        ];
        assert_eq!(route_distance_nm(&points), 0.0);
    }

    #[test]
    fn derivation_is_idempotent() {
        let points = vec![
            TrackPoint::new(59.3293, 18.0686, t0()),
            TrackPoint::new(59.3326, 18.0649, t0() + Duration::seconds(600)),
        ];

        let a = derive_trip(&points, t0(), t0() + Duration::seconds(600), None);
        let b = derive_trip(&points, t0(), t0() + Duration::seconds(600), None);
        assert_eq!(a, b);
    }

    #[test]
    fn default_title_composed_from_start_time() {
        let points = vec![TrackPoint::new(55.0, 12.0, t0())];
        let draft = derive_trip(&points, t0(), t0() + Duration::minutes(1), None);
        assert_eq!(draft.title, "Unnamed 2024-06-01");
    }

    #[test]
    fn bounds_cover_all_points() {
        let points = vec![
            TrackPoint::new(56.0, 10.2, t0()),
            TrackPoint::new(55.5, 10.8, t0() + Duration::minutes(1)),
            TrackPoint::new(56.2, 10.5, t0() + Duration::minutes(2)),
        ];

        let bounds = route_bounds(&points).unwrap();
        assert_eq!(bounds.min().y, 55.5);
        assert_eq!(bounds.max().y, 56.2);
        assert_eq!(bounds.min().x, 10.2);
        assert_eq!(bounds.max().x, 10.8);

        assert!(route_bounds(&[]).is_none());
    }
}
