use std::path::Path;

use chrono::{DateTime, Utc};
use const_format::concatcp;
use logbook_lib::{
    boat::Boat,
    track_point::{write_point_blob, TrackPoint},
    track_session::TrackSession,
    trip::Trip,
    user::User,
};
use sqlx::{Executor, Pool, Sqlite, SqlitePool, query, query_as, sqlite::SqliteConnectOptions};

use crate::DataManagerError;

use super::constants::*;

#[derive(Clone)]
pub struct LogbookDatabase {
    pool: Pool<Sqlite>,
}

impl LogbookDatabase {
    pub async fn connect_at(path: &Path) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|_| DataManagerError::Database("Failed to connect to database".to_string()))?;

        let db = Self { pool };

        db.init().await?;

        Ok(db)
    }

    async fn init(&self) -> Result<(), DataManagerError> {
        self.pool
            .execute(concatcp!(
                "
            CREATE TABLE IF NOT EXISTS ", USERS_TABLE_NAME, "(",
                USER_ID,   " INTEGER PRIMARY KEY AUTOINCREMENT,",
                NAME,      " TEXT NOT NULL,",
                API_TOKEN, " TEXT NOT NULL UNIQUE,",
                JOINED_AT, " TIMESTAMP NOT NULL);

            CREATE TABLE IF NOT EXISTS ", BOATS_TABLE_NAME, "(",
                BOAT_ID, " INTEGER PRIMARY KEY AUTOINCREMENT,",
                USER_ID, " INTEGER NOT NULL,",
                NAME,    " TEXT NOT NULL,",
                MODEL,   " TEXT,
                FOREIGN KEY(", USER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ") ON DELETE CASCADE);

            CREATE TABLE IF NOT EXISTS ", TRIPS_TABLE_NAME, "(",
                TRIP_ID,          " INTEGER PRIMARY KEY AUTOINCREMENT,",
                USER_ID,          " INTEGER NOT NULL,",
                BOAT_ID,          " INTEGER,",
                TITLE,            " TEXT NOT NULL,",
                DATE,             " TIMESTAMP NOT NULL,",
                DURATION_MINUTES, " INTEGER NOT NULL,",
                START_NAME,       " TEXT NOT NULL,",
                START_LAT,        " REAL NOT NULL,",
                START_LNG,        " REAL NOT NULL,",
                END_NAME,         " TEXT NOT NULL,",
                END_LAT,          " REAL NOT NULL,",
                END_LNG,          " REAL NOT NULL,",
                ROUTE,            " BLOB NOT NULL,",
                DISTANCE_NM,      " REAL NOT NULL,",
                PHOTOS,           " BLOB NOT NULL,
                FOREIGN KEY(", USER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ") ON DELETE CASCADE,
                FOREIGN KEY(", BOAT_ID, ") REFERENCES ", BOATS_TABLE_NAME, "(", BOAT_ID, ") ON DELETE SET NULL);

            CREATE TABLE IF NOT EXISTS ", TRACK_SESSIONS_TABLE_NAME, "(",
                SESSION_ID,   " INTEGER PRIMARY KEY AUTOINCREMENT,",
                USER_ID,      " INTEGER NOT NULL,",
                STARTED_AT,   " TIMESTAMP NOT NULL,",
                ENDED_AT,     " TIMESTAMP,",
                ACTIVE,       " BOOLEAN NOT NULL,",
                TRACK_POINTS, " BLOB NOT NULL,
                FOREIGN KEY(", USER_ID, ") REFERENCES ", USERS_TABLE_NAME, "(", USER_ID, ") ON DELETE CASCADE
            )"
            ))
            .await
            .map_err(|err| DataManagerError::Database(format!("Failed to init schema: {err}")))?;

        Ok(())
    }

    pub async fn insert_user(
        &self,
        name: String,
        api_token: String,
        joined_at: DateTime<Utc>,
    ) -> Result<User, DataManagerError> {
        let user_id = query_as::<_, (i64,)>(concatcp!(
            "INSERT INTO ", USERS_TABLE_NAME, "(", USER_ID, ", ", NAME, ", ", API_TOKEN, ", ", JOINED_AT, ")
             VALUES (NULL, ?1, ?2, ?3) RETURNING ", USER_ID
        ))
        .bind(&name)
        .bind(&api_token)
        .bind(joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to insert user".to_string()))?
        .0;

        Ok(User {
            user_id,
            name,
            api_token,
            joined_at,
        })
    }

    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>, DataManagerError> {
        query_as::<_, User>(concatcp!(
            "SELECT * FROM ", USERS_TABLE_NAME, " WHERE ", API_TOKEN, " = ?1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to look up user".to_string()))
    }

    pub async fn insert_track_session(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<i64, DataManagerError> {
        query_as::<_, (i64,)>(concatcp!(
            "INSERT INTO ", TRACK_SESSIONS_TABLE_NAME,
            "(", SESSION_ID, ", ", USER_ID, ", ", STARTED_AT, ", ", ENDED_AT, ", ", ACTIVE, ", ", TRACK_POINTS, ")
             VALUES (NULL, ?1, ?2, NULL, TRUE, ?3) RETURNING ", SESSION_ID
        ))
        .bind(user_id)
        .bind(started_at)
        .bind(Vec::<u8>::new())
        .fetch_one(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to insert track session".to_string()))
        .map(|row| row.0)
    }

    /// Fetches a session row only if it belongs to `user_id`.
    pub async fn get_session(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<TrackSession>, DataManagerError> {
        query_as::<_, TrackSession>(concatcp!(
            "SELECT * FROM ", TRACK_SESSIONS_TABLE_NAME,
            " WHERE ", SESSION_ID, " = ?1 AND ", USER_ID, " = ?2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to get session".to_string()))
    }

    /// `None` when the session does not exist or is not owned by `user_id`.
    pub async fn session_is_active(
        &self,
        session_id: i64,
        user_id: i64,
    ) -> Result<Option<bool>, DataManagerError> {
        query_as::<_, (bool,)>(concatcp!(
            "SELECT ", ACTIVE, " FROM ", TRACK_SESSIONS_TABLE_NAME,
            " WHERE ", SESSION_ID, " = ?1 AND ", USER_ID, " = ?2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to check session state".to_string()))
        .map(|row| row.map(|(active,)| active))
    }

    /// Folds the final point list into the row and flips it inactive in one
    /// statement, so a stopped session is never observed without its points.
    pub async fn finalize_session(
        &self,
        session_id: i64,
        track_points: &[TrackPoint],
        ended_at: DateTime<Utc>,
    ) -> Result<(), DataManagerError> {
        query(concatcp!(
            "UPDATE ", TRACK_SESSIONS_TABLE_NAME,
            " SET ", TRACK_POINTS, " = ?1, ", ENDED_AT, " = ?2, ", ACTIVE, " = FALSE",
            " WHERE ", SESSION_ID, " = ?3"
        ))
        .bind(write_point_blob(track_points))
        .bind(ended_at)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to finalize session".to_string()))
        .map(|_| ())
    }

    pub async fn insert_trip(&self, trip: &Trip) -> Result<i64, DataManagerError> {
        query_as::<_, (i64,)>(concatcp!(
            "INSERT INTO ", TRIPS_TABLE_NAME,
            "(", TRIP_ID, ", ", USER_ID, ", ", BOAT_ID, ", ", TITLE, ", ", DATE, ", ", DURATION_MINUTES, ", ",
            START_NAME, ", ", START_LAT, ", ", START_LNG, ", ",
            END_NAME, ", ", END_LAT, ", ", END_LNG, ", ",
            ROUTE, ", ", DISTANCE_NM, ", ", PHOTOS, ")
             VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) RETURNING ", TRIP_ID
        ))
        .bind(trip.user_id)
        .bind(trip.boat_id)
        .bind(&trip.title)
        .bind(trip.date)
        .bind(trip.duration_minutes)
        .bind(&trip.start.name)
        .bind(trip.start.lat)
        .bind(trip.start.lng)
        .bind(&trip.end.name)
        .bind(trip.end.lat)
        .bind(trip.end.lng)
        .bind(trip.get_route_blob())
        .bind(trip.distance_nm)
        .bind(trip.get_photos_blob())
        .fetch_one(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to insert trip".to_string()))
        .map(|row| row.0)
    }

    pub async fn get_trip(
        &self,
        trip_id: i64,
        user_id: i64,
    ) -> Result<Option<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!(
            "SELECT * FROM ", TRIPS_TABLE_NAME,
            " WHERE ", TRIP_ID, " = ?1 AND ", USER_ID, " = ?2"
        ))
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to get trip".to_string()))
    }

    pub async fn get_trips(&self, user_id: i64) -> Result<Vec<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!(
            "SELECT * FROM ", TRIPS_TABLE_NAME,
            " WHERE ", USER_ID, " = ?1 ORDER BY ", DATE, " DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to get trips".to_string()))
    }

    /// Returns the number of rows updated, zero when the trip is missing or
    /// not owned.
    pub async fn update_trip(&self, trip: &Trip) -> Result<u64, DataManagerError> {
        query(concatcp!(
            "UPDATE ", TRIPS_TABLE_NAME, " SET ",
            BOAT_ID, " = ?1, ", TITLE, " = ?2, ", DATE, " = ?3, ", DURATION_MINUTES, " = ?4, ",
            START_NAME, " = ?5, ", START_LAT, " = ?6, ", START_LNG, " = ?7, ",
            END_NAME, " = ?8, ", END_LAT, " = ?9, ", END_LNG, " = ?10, ",
            ROUTE, " = ?11, ", DISTANCE_NM, " = ?12, ", PHOTOS, " = ?13",
            " WHERE ", TRIP_ID, " = ?14 AND ", USER_ID, " = ?15"
        ))
        .bind(trip.boat_id)
        .bind(&trip.title)
        .bind(trip.date)
        .bind(trip.duration_minutes)
        .bind(&trip.start.name)
        .bind(trip.start.lat)
        .bind(trip.start.lng)
        .bind(&trip.end.name)
        .bind(trip.end.lat)
        .bind(trip.end.lng)
        .bind(trip.get_route_blob())
        .bind(trip.distance_nm)
        .bind(trip.get_photos_blob())
        .bind(trip.trip_id)
        .bind(trip.user_id)
        .execute(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to update trip".to_string()))
        .map(|res| res.rows_affected())
    }

    pub async fn delete_trip(&self, trip_id: i64, user_id: i64) -> Result<u64, DataManagerError> {
        query(concatcp!(
            "DELETE FROM ", TRIPS_TABLE_NAME,
            " WHERE ", TRIP_ID, " = ?1 AND ", USER_ID, " = ?2"
        ))
        .bind(trip_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to delete trip".to_string()))
        .map(|res| res.rows_affected())
    }

    pub async fn insert_boat(
        &self,
        user_id: i64,
        name: String,
        model: String,
    ) -> Result<Boat, DataManagerError> {
        let boat_id = query_as::<_, (i64,)>(concatcp!(
            "INSERT INTO ", BOATS_TABLE_NAME, "(", BOAT_ID, ", ", USER_ID, ", ", NAME, ", ", MODEL, ")
             VALUES (NULL, ?1, ?2, ?3) RETURNING ", BOAT_ID
        ))
        .bind(user_id)
        .bind(&name)
        .bind(&model)
        .fetch_one(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to insert boat".to_string()))?
        .0;

        Ok(Boat {
            boat_id,
            user_id,
            name,
            model,
        })
    }

    pub async fn get_boats(&self, user_id: i64) -> Result<Vec<Boat>, DataManagerError> {
        query_as::<_, Boat>(concatcp!(
            "SELECT * FROM ", BOATS_TABLE_NAME, " WHERE ", USER_ID, " = ?1"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to get boats".to_string()))
    }

    pub async fn update_boat(&self, boat: &Boat) -> Result<u64, DataManagerError> {
        query(concatcp!(
            "UPDATE ", BOATS_TABLE_NAME, " SET ", NAME, " = ?1, ", MODEL, " = ?2",
            " WHERE ", BOAT_ID, " = ?3 AND ", USER_ID, " = ?4"
        ))
        .bind(&boat.name)
        .bind(&boat.model)
        .bind(boat.boat_id)
        .bind(boat.user_id)
        .execute(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to update boat".to_string()))
        .map(|res| res.rows_affected())
    }

    pub async fn delete_boat(&self, boat_id: i64, user_id: i64) -> Result<u64, DataManagerError> {
        query(concatcp!(
            "DELETE FROM ", BOATS_TABLE_NAME,
            " WHERE ", BOAT_ID, " = ?1 AND ", USER_ID, " = ?2"
        ))
        .bind(boat_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|_| DataManagerError::Database("Failed to delete boat".to_string()))
        .map(|res| res.rows_affected())
    }
}
