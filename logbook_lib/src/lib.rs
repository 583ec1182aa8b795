pub mod track_point;
pub mod track_session;
pub mod trip;
pub mod boat;
pub mod user;
pub mod derive;
