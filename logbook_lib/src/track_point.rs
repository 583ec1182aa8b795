use chrono::{DateTime, Utc};
use geo_types::{coord, Coord};
use serde::{Deserialize, Serialize};

/// One GPS sample. Wire and at-rest form is `{ lat, lng, t }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat,
            lng,
            timestamp,
        }
    }

    pub fn coord(&self) -> Coord {
        coord! { x: self.lng, y: self.lat }
    }
}

/// Encodes a point list into the blob form stored in the session row
/// and in buffer files.
pub fn write_point_blob(points: &[TrackPoint]) -> Vec<u8> {
    bincode::serialize(points).expect("track points always serialize")
}

pub fn parse_point_blob(blob: &[u8]) -> Result<Vec<TrackPoint>, &'static str> {
    if blob.is_empty() {
        return Ok(Vec::new());
    }
    bincode::deserialize(blob).map_err(|_| "Failed to deserialize track points")
}
