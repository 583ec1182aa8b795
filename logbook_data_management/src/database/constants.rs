pub const USERS_TABLE_NAME: &str = "Users";
pub const BOATS_TABLE_NAME: &str = "Boats";
pub const TRIPS_TABLE_NAME: &str = "Trips";
pub const TRACK_SESSIONS_TABLE_NAME: &str = "TrackSessions";

pub const USER_ID: &str = "user_id";
pub const NAME: &str = "name";
pub const API_TOKEN: &str = "api_token";
pub const JOINED_AT: &str = "joined_at";

pub const BOAT_ID: &str = "boat_id";
pub const MODEL: &str = "model";

pub const TRIP_ID: &str = "trip_id";
pub const TITLE: &str = "title";
pub const DATE: &str = "date";
pub const DURATION_MINUTES: &str = "duration_minutes";
pub const START_NAME: &str = "start_name";
pub const START_LAT: &str = "start_lat";
pub const START_LNG: &str = "start_lng";
pub const END_NAME: &str = "end_name";
pub const END_LAT: &str = "end_lat";
pub const END_LNG: &str = "end_lng";
pub const ROUTE: &str = "route";
pub const DISTANCE_NM: &str = "distance_nm";
pub const PHOTOS: &str = "photos";

pub const SESSION_ID: &str = "session_id";
pub const STARTED_AT: &str = "started_at";
pub const ENDED_AT: &str = "ended_at";
pub const ACTIVE: &str = "active";
pub const TRACK_POINTS: &str = "track_points";
