use std::{path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use logbook_lib::track_point::TrackPoint;

use crate::DataManagerError;

/// Reads a GPX file into a point list, in file order. Points without a
/// timestamp are skipped. Returns the metadata name when one is present.
pub fn read_gpx(path: &Path) -> Result<(Option<String>, Vec<TrackPoint>), DataManagerError> {
    let file = std::fs::File::open(path)
        .map_err(|_| DataManagerError::InvalidInput(format!("Failed to open GPX file: {path:?}")))?;
    let reader = std::io::BufReader::new(file);
    let gpx = gpx::read(reader)
        .map_err(|err| DataManagerError::InvalidInput(format!("Failed to parse GPX: {err}")))?;

    let title = gpx.metadata.and_then(|meta| meta.name);

    let mut track_points = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let Some(time) = point.time else {
                    continue;
                };
                let formatted = time.format().map_err(|_| {
                    DataManagerError::InvalidInput("Unreadable GPX timestamp".to_string())
                })?;
                let timestamp = DateTime::<Utc>::from_str(&formatted).map_err(|_| {
                    DataManagerError::InvalidInput("Unreadable GPX timestamp".to_string())
                })?;

                let position = point.point();
                track_points.push(TrackPoint::new(position.y(), position.x(), timestamp));
            }
        }
    }

    Ok((title, track_points))
}
