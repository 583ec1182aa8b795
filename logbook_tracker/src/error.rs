use std::fmt;

/// Why the location source could not produce a fix.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    Timeout,
    Unavailable(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "Location permission denied"),
            LocationError::Timeout => write!(f, "Timed out waiting for a location fix"),
            LocationError::Unavailable(msg) => write!(f, "Location unavailable: {msg}"),
        }
    }
}

#[derive(Debug)]
pub enum TrackerError {
    /// No location capability exists. Fatal to `start()`, no retry.
    UnsupportedEnvironment,
    /// The manager already holds an active recording.
    AlreadyRecording,
    /// `stop()` was called while idle.
    NotRecording,
    /// The store rejected session creation.
    SessionCreate(String),
    /// The source failed to produce a fix. Recording does not begin, or
    /// continues with gaps.
    LocationAcquisition(LocationError),
    /// Transient submission failure, recovered locally.
    PointSubmission(String),
    /// The session is already stopped or not owned by this caller.
    SessionNotFound,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::UnsupportedEnvironment => write!(f, "No location capability available"),
            TrackerError::AlreadyRecording => write!(f, "A recording session is already active"),
            TrackerError::NotRecording => write!(f, "No recording session is active"),
            TrackerError::SessionCreate(msg) => write!(f, "Failed to create session: {msg}"),
            TrackerError::LocationAcquisition(err) => write!(f, "{err}"),
            TrackerError::PointSubmission(msg) => write!(f, "Failed to submit point: {msg}"),
            TrackerError::SessionNotFound => write!(f, "Session not found"),
        }
    }
}

impl std::error::Error for TrackerError {}
