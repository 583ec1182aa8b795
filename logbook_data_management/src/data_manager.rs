use std::path::{Path, PathBuf};

use chrono::Utc;
use logbook_lib::{
    boat::{Boat, BoatDraft},
    derive::derive_trip,
    track_point::TrackPoint,
    track_session::{SessionState, TrackSession},
    trip::{Trip, TripDraft},
    user::User,
};

use crate::{
    BUFFER_FILE_DIR, DATA_DIR, DATABASE_FILENAME, DataManagerError, buffer::BufferManager,
    database::db::LogbookDatabase, gpx_util::read_gpx,
};

/// The public interface for all logbook data management. Every session
/// mutation is ownership checked, a mismatch surfaces as `SessionNotFound`.
#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: LogbookDatabase,
    pub(crate) buffer_manager: BufferManager,
}

impl DataManager {
    pub async fn start() -> Result<Self, DataManagerError> {
        let root = project_root::get_project_root()
            .map_err(|_| DataManagerError::Database("Failed to locate project root".to_string()))?;
        Self::start_at(root.join(DATA_DIR)).await
    }

    /// Starts against an explicit data directory. Buffer files found there
    /// are reopened, so sessions that were active before a restart keep
    /// their points.
    pub async fn start_at(data_dir: PathBuf) -> Result<Self, DataManagerError> {
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|_| {
                DataManagerError::Database(format!("Failed to create data directory: {:?}", data_dir))
            })?;
        }

        let buffer_manager = BufferManager::start(data_dir.join(BUFFER_FILE_DIR)).await?;
        let database = LogbookDatabase::connect_at(&data_dir.join(DATABASE_FILENAME)).await?;

        Ok(DataManager {
            database,
            buffer_manager,
        })
    }

    pub async fn register_user(&self, name: String) -> Result<User, DataManagerError> {
        let api_token = hex::encode(rand::random::<[u8; 32]>());
        self.database.insert_user(name, api_token, Utc::now()).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, DataManagerError> {
        self.database.get_user_by_token(token).await
    }

    /// Creates an Active session and opens its point buffer.
    pub async fn start_session(&self, user_id: i64) -> Result<TrackSession, DataManagerError> {
        let started_at = Utc::now();
        let session_id = self.database.insert_track_session(user_id, started_at).await?;
        self.buffer_manager.open_session(session_id).await?;

        tracing::info!("Started tracking session {} for user {}", session_id, user_id);
        Ok(TrackSession::new_active(session_id, user_id, started_at))
    }

    /// Appends one point to an active, owned session. A stopped, missing or
    /// foreign session is a no-op reported as `SessionNotFound`.
    pub async fn append_point(
        &self,
        session_id: i64,
        user_id: i64,
        point: TrackPoint,
    ) -> Result<(), DataManagerError> {
        match self.database.session_is_active(session_id, user_id).await? {
            Some(true) => self.buffer_manager.append_track_point(session_id, point).await,
            Some(false) | None => Err(DataManagerError::SessionNotFound),
        }
    }

    /// One-way stop. Buffered points are folded into the session row and the
    /// stopped session is returned with them. Stopping an already stopped
    /// session fails with `SessionNotFound`.
    pub async fn stop_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<TrackSession, DataManagerError> {
        let Some(session) = self.database.get_session(session_id, user_id).await? else {
            return Err(DataManagerError::SessionNotFound);
        };
        if !session.state.is_active() {
            return Err(DataManagerError::SessionNotFound);
        }

        let track_points = match self.buffer_manager.close_session(session_id).await {
            Ok(points) => points,
            Err(DataManagerError::SessionNotFound) => {
                // Row is active but the buffer is gone. Stop with what the
                // row holds rather than refusing to stop at all.
                tracing::warn!("No buffer for active session {}", session_id);
                session.track_points.clone()
            }
            Err(err) => return Err(err),
        };

        let ended_at = Utc::now();
        self.database
            .finalize_session(session_id, &track_points, ended_at)
            .await?;

        tracing::info!(
            "Stopped session {} with {} points",
            session_id,
            track_points.len()
        );

        Ok(TrackSession {
            session_id,
            user_id,
            state: SessionState::Stopped {
                started_at: session.state.started_at(),
                ended_at,
            },
            track_points,
        })
    }

    /// For an active session the buffered points are the live view.
    pub async fn get_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<TrackSession, DataManagerError> {
        let Some(mut session) = self.database.get_session(session_id, user_id).await? else {
            return Err(DataManagerError::SessionNotFound);
        };

        if session.state.is_active() {
            if let Ok(points) = self.buffer_manager.read_buffer(session_id).await {
                session.track_points = points;
            }
        }

        Ok(session)
    }

    pub async fn insert_trip(
        &self,
        user_id: i64,
        draft: TripDraft,
    ) -> Result<Trip, DataManagerError> {
        let mut trip = Trip::from_draft(-1, user_id, draft);
        trip.trip_id = self.database.insert_trip(&trip).await?;
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: i64, user_id: i64) -> Result<Trip, DataManagerError> {
        self.database
            .get_trip(trip_id, user_id)
            .await?
            .ok_or(DataManagerError::NotFound)
    }

    pub async fn get_trips(&self, user_id: i64) -> Result<Vec<Trip>, DataManagerError> {
        self.database.get_trips(user_id).await
    }

    pub async fn update_trip(
        &self,
        trip_id: i64,
        user_id: i64,
        draft: TripDraft,
    ) -> Result<Trip, DataManagerError> {
        let trip = Trip::from_draft(trip_id, user_id, draft);
        match self.database.update_trip(&trip).await? {
            0 => Err(DataManagerError::NotFound),
            _ => Ok(trip),
        }
    }

    pub async fn delete_trip(&self, trip_id: i64, user_id: i64) -> Result<(), DataManagerError> {
        match self.database.delete_trip(trip_id, user_id).await? {
            0 => Err(DataManagerError::NotFound),
            _ => Ok(()),
        }
    }

    /// Imports a GPX file as a completed trip, deriving distance and duration
    /// from its points.
    pub async fn import_gpx_trip(
        &self,
        user_id: i64,
        path: &Path,
        title: Option<String>,
    ) -> Result<Trip, DataManagerError> {
        let (gpx_title, points) = read_gpx(path)?;
        if points.is_empty() {
            return Err(DataManagerError::InvalidInput(
                "GPX file contains no timestamped points".to_string(),
            ));
        }

        let started_at = points[0].timestamp;
        let ended_at = points[points.len() - 1].timestamp;
        let draft = derive_trip(&points, started_at, ended_at, title.or(gpx_title));

        self.insert_trip(user_id, draft).await
    }

    pub async fn insert_boat(
        &self,
        user_id: i64,
        draft: BoatDraft,
    ) -> Result<Boat, DataManagerError> {
        self.database.insert_boat(user_id, draft.name, draft.model).await
    }

    pub async fn get_boats(&self, user_id: i64) -> Result<Vec<Boat>, DataManagerError> {
        self.database.get_boats(user_id).await
    }

    pub async fn update_boat(
        &self,
        boat_id: i64,
        user_id: i64,
        draft: BoatDraft,
    ) -> Result<Boat, DataManagerError> {
        let boat = Boat {
            boat_id,
            user_id,
            name: draft.name,
            model: draft.model,
        };
        match self.database.update_boat(&boat).await? {
            0 => Err(DataManagerError::NotFound),
            _ => Ok(boat),
        }
    }

    pub async fn delete_boat(&self, boat_id: i64, user_id: i64) -> Result<(), DataManagerError> {
        match self.database.delete_boat(boat_id, user_id).await? {
            0 => Err(DataManagerError::NotFound),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use logbook_lib::trip::NamedPoint;

    async fn test_manager(tag: &str) -> DataManager {
        let root = std::env::temp_dir().join(format!("logbook_test_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        DataManager::start_at(root).await.unwrap()
    }

    fn point(lat: f64, lng: f64) -> TrackPoint {
        TrackPoint::new(lat, lng, Utc::now())
    }

    #[tokio::test]
    async fn append_to_stopped_session_is_not_found() {
        let manager = test_manager("append_stopped").await;
        let user = manager.register_user("Joachim".to_string()).await.unwrap();

        let session = manager.start_session(user.user_id).await.unwrap();
        manager
            .append_point(session.session_id, user.user_id, point(56.0, 10.2))
            .await
            .unwrap();
        manager
            .append_point(session.session_id, user.user_id, point(56.01, 10.21))
            .await
            .unwrap();

        let stopped = manager
            .stop_session(session.session_id, user.user_id)
            .await
            .unwrap();
        assert_eq!(stopped.track_points.len(), 2);
        assert!(!stopped.state.is_active());

        let result = manager
            .append_point(session.session_id, user.user_id, point(56.02, 10.22))
            .await;
        assert!(matches!(result, Err(DataManagerError::SessionNotFound)));

        // The stored point list is unchanged.
        let reread = manager
            .get_session(session.session_id, user.user_id)
            .await
            .unwrap();
        assert_eq!(reread.track_points, stopped.track_points);
    }

    #[tokio::test]
    async fn double_stop_is_not_found() {
        let manager = test_manager("double_stop").await;
        let user = manager.register_user("Joachim".to_string()).await.unwrap();

        let session = manager.start_session(user.user_id).await.unwrap();
        manager
            .stop_session(session.session_id, user.user_id)
            .await
            .unwrap();

        let result = manager.stop_session(session.session_id, user.user_id).await;
        assert!(matches!(result, Err(DataManagerError::SessionNotFound)));
    }

    #[tokio::test]
    async fn foreign_sessions_look_missing() {
        let manager = test_manager("ownership").await;
        let owner = manager.register_user("Owner".to_string()).await.unwrap();
        let other = manager.register_user("Other".to_string()).await.unwrap();

        let session = manager.start_session(owner.user_id).await.unwrap();

        let append = manager
            .append_point(session.session_id, other.user_id, point(56.0, 10.2))
            .await;
        assert!(matches!(append, Err(DataManagerError::SessionNotFound)));

        let stop = manager.stop_session(session.session_id, other.user_id).await;
        assert!(matches!(stop, Err(DataManagerError::SessionNotFound)));

        // Still intact for the owner.
        let session = manager
            .get_session(session.session_id, owner.user_id)
            .await
            .unwrap();
        assert!(session.state.is_active());
        assert!(session.track_points.is_empty());
    }

    #[tokio::test]
    async fn active_session_points_survive_restart() {
        let root = std::env::temp_dir().join(format!("logbook_test_restart_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);

        let manager = DataManager::start_at(root.clone()).await.unwrap();
        let user = manager.register_user("Joachim".to_string()).await.unwrap();
        let session = manager.start_session(user.user_id).await.unwrap();
        manager
            .append_point(session.session_id, user.user_id, point(56.0, 10.2))
            .await
            .unwrap();
        manager
            .append_point(session.session_id, user.user_id, point(56.01, 10.21))
            .await
            .unwrap();
        drop(manager);

        let manager = DataManager::start_at(root).await.unwrap();
        let stopped = manager
            .stop_session(session.session_id, user.user_id)
            .await
            .unwrap();
        assert_eq!(stopped.track_points.len(), 2);
    }

    #[tokio::test]
    async fn trip_distance_follows_route() {
        let manager = test_manager("trip_crud").await;
        let user = manager.register_user("Joachim".to_string()).await.unwrap();

        let t0 = Utc::now();
        let draft = TripDraft {
            boat_id: None,
            title: "Kattegat crossing".to_string(),
            date: t0,
            duration_minutes: 240,
            start: NamedPoint::unnamed(56.0, 10.2),
            end: NamedPoint::unnamed(56.1, 10.4),
            route: vec![
                TrackPoint::new(56.0, 10.2, t0),
                TrackPoint::new(56.1, 10.4, t0 + Duration::hours(4)),
            ],
            distance_nm: 999.0, // Ignored, the route is authoritative.
            photos: vec!["photo-1".to_string()],
        };

        let trip = manager.insert_trip(user.user_id, draft).await.unwrap();
        assert!(trip.distance_nm > 0.0 && trip.distance_nm < 999.0);

        let loaded = manager.get_trip(trip.trip_id, user.user_id).await.unwrap();
        assert_eq!(loaded, trip);

        manager.delete_trip(trip.trip_id, user.user_id).await.unwrap();
        let missing = manager.get_trip(trip.trip_id, user.user_id).await;
        assert!(matches!(missing, Err(DataManagerError::NotFound)));
    }
}
