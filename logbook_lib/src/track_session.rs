use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::track_point::{parse_point_blob, write_point_blob, TrackPoint};

/// Lifecycle of a recording session. The stop transition is one-way, so an
/// active session with an end time is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Active {
        started_at: DateTime<Utc>,
    },
    Stopped {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        match self {
            SessionState::Active { started_at } => *started_at,
            SessionState::Stopped { started_at, .. } => *started_at,
        }
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionState::Active { .. } => None,
            SessionState::Stopped { ended_at, .. } => Some(*ended_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord", into = "SessionRecord")]
pub struct TrackSession {
    pub session_id: i64,
    pub user_id: i64,
    pub state: SessionState,
    pub track_points: Vec<TrackPoint>,
}

impl TrackSession {
    pub fn new_active(session_id: i64, user_id: i64, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            user_id,
            state: SessionState::Active { started_at },
            track_points: Vec::new(),
        }
    }

    /// One-way transition to `Stopped`. Fails if the session already stopped.
    pub fn stop(&mut self, ended_at: DateTime<Utc>) -> Result<(), &'static str> {
        match self.state {
            SessionState::Active { started_at } => {
                self.state = SessionState::Stopped {
                    started_at,
                    ended_at,
                };
                Ok(())
            }
            SessionState::Stopped { .. } => Err("Session is already stopped"),
        }
    }

    pub fn get_track_points_blob(&self) -> Vec<u8> {
        write_point_blob(&self.track_points)
    }
}

/// Flat wire/at-rest form: `{ isActive, startedAt, endedAt? }` plus the ids
/// and points. Conversion into [`TrackSession`] rejects inconsistent records.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    session_id: i64,
    user_id: i64,
    is_active: bool,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
    track_points: Vec<TrackPoint>,
}

impl From<TrackSession> for SessionRecord {
    fn from(session: TrackSession) -> Self {
        SessionRecord {
            session_id: session.session_id,
            user_id: session.user_id,
            is_active: session.state.is_active(),
            started_at: session.state.started_at(),
            ended_at: session.state.ended_at(),
            track_points: session.track_points,
        }
    }
}

impl TryFrom<SessionRecord> for TrackSession {
    type Error = String;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        let state = match (record.is_active, record.ended_at) {
            (true, None) => SessionState::Active {
                started_at: record.started_at,
            },
            (false, Some(ended_at)) => SessionState::Stopped {
                started_at: record.started_at,
                ended_at,
            },
            (true, Some(_)) => {
                return Err(format!(
                    "Session {} is active but has an end time",
                    record.session_id
                ))
            }
            (false, None) => {
                return Err(format!(
                    "Session {} is stopped but has no end time",
                    record.session_id
                ))
            }
        };

        Ok(TrackSession {
            session_id: record.session_id,
            user_id: record.user_id,
            state,
            track_points: record.track_points,
        })
    }
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for TrackSession {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let active: bool = row.try_get("active")?;
        let started_at: DateTime<Utc> = row.try_get("started_at")?;
        let ended_at: Option<DateTime<Utc>> = row.try_get("ended_at")?;

        let state = match (active, ended_at) {
            (true, None) => SessionState::Active { started_at },
            (false, Some(ended_at)) => SessionState::Stopped {
                started_at,
                ended_at,
            },
            _ => {
                return Err(sqlx::Error::Decode(
                    "Inconsistent session state columns".into(),
                ))
            }
        };

        let blob: Vec<u8> = row.try_get("track_points")?;
        let track_points =
            parse_point_blob(&blob).map_err(|err| sqlx::Error::Decode(err.into()))?;

        Ok(TrackSession {
            session_id: row.try_get("session_id")?,
            user_id: row.try_get("user_id")?,
            state,
            track_points,
        })
    }
}
