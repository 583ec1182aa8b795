use chrono::{DateTime, Utc};
use geo_types::Rect;
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::{
    derive::{route_bounds, route_distance_nm},
    track_point::{parse_point_blob, write_point_blob, TrackPoint},
};

/// A coordinate with a user-facing name. Derivation leaves the name blank,
/// naming is a UI concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl NamedPoint {
    pub fn unnamed(lat: f64, lng: f64) -> Self {
        Self {
            name: String::new(),
            lat,
            lng,
        }
    }
}

/// A persisted voyage record, authored manually or derived from a stopped
/// tracking session. When `route` is non-empty it is the authoritative source
/// for `distance_nm` and `bounds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub trip_id: i64,
    pub user_id: i64,
    pub boat_id: Option<i64>,
    pub title: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub start: NamedPoint,
    pub end: NamedPoint,
    pub route: Vec<TrackPoint>,
    pub distance_nm: f64,
    pub bounds: Option<Rect<f64>>,
    pub photos: Vec<String>,
}

/// Caller-supplied trip fields. Ids are assigned by the store; distance and
/// bounds are recomputed from the route whenever one is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub boat_id: Option<i64>,
    pub title: String,
    pub date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub start: NamedPoint,
    pub end: NamedPoint,
    #[serde(default)]
    pub route: Vec<TrackPoint>,
    #[serde(default)]
    pub distance_nm: f64,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Trip {
    pub fn from_draft(trip_id: i64, user_id: i64, draft: TripDraft) -> Self {
        let (distance_nm, bounds) = if draft.route.is_empty() {
            (draft.distance_nm, None)
        } else {
            (route_distance_nm(&draft.route), route_bounds(&draft.route))
        };

        Self {
            trip_id,
            user_id,
            boat_id: draft.boat_id,
            title: draft.title,
            date: draft.date,
            duration_minutes: draft.duration_minutes,
            start: draft.start,
            end: draft.end,
            route: draft.route,
            distance_nm,
            bounds,
            photos: draft.photos,
        }
    }

    pub fn get_route_blob(&self) -> Vec<u8> {
        write_point_blob(&self.route)
    }

    pub fn get_photos_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.photos).expect("photo refs always serialize")
    }
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for Trip {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let route_blob: Vec<u8> = row.try_get("route")?;
        let route =
            parse_point_blob(&route_blob).map_err(|err| sqlx::Error::Decode(err.into()))?;

        let photos_blob: Vec<u8> = row.try_get("photos")?;
        let photos = if photos_blob.is_empty() {
            Vec::new()
        } else {
            bincode::deserialize(&photos_blob)
                .map_err(|_| sqlx::Error::Decode("Failed to deserialize photo refs".into()))?
        };

        // Bounds are not stored, the route is authoritative.
        let bounds = route_bounds(&route);

        Ok(Self {
            trip_id: row.try_get("trip_id")?,
            user_id: row.try_get("user_id")?,
            boat_id: row.try_get("boat_id")?,
            title: row.try_get("title")?,
            date: row.try_get("date")?,
            duration_minutes: row.try_get("duration_minutes")?,
            start: NamedPoint {
                name: row.try_get("start_name")?,
                lat: row.try_get("start_lat")?,
                lng: row.try_get("start_lng")?,
            },
            end: NamedPoint {
                name: row.try_get("end_name")?,
                lat: row.try_get("end_lat")?,
                lng: row.try_get("end_lng")?,
            },
            route,
            distance_nm: row.try_get("distance_nm")?,
            bounds,
            photos,
        })
    }
}
