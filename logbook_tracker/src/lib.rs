//! Client-side recording of live tracking sessions.
//!
//! A [`TrackingManager`] bridges a [`LocationSource`] to the session store
//! behind a [`SessionClient`]: each fix is kept locally and submitted
//! fire-and-forget, so a flaky connection never halts recording. Stopping
//! prefers the server's stored points and falls back to the local buffer.

mod error;
mod location;
mod manager;
mod session_client;

pub use error::{LocationError, TrackerError};
pub use location::{
    ACQUISITION_TIMEOUT, LocationFix, LocationSource, LocationSubscription,
    SimulatedLocationSource,
};
pub use manager::{StoppedRecording, TrackerEvent, TrackingManager};
pub use session_client::{HttpSessionClient, SessionClient};
