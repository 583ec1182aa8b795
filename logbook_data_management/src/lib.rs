use std::fmt;

pub mod buffer;
pub mod database;
mod data_manager;
mod gpx_util;

pub use data_manager::*;
pub use gpx_util::read_gpx;

pub const DATA_DIR: &str = "data/";
pub const DATABASE_FILENAME: &str = "logbook.db";
pub const BUFFER_FILE_DIR: &str = "buffer_files";

#[derive(Debug)]
pub enum DataManagerError {
    Database(String),
    BufferManager(String),
    /// The session does not exist, is already stopped, or belongs to another
    /// user. Ownership mismatches are deliberately indistinguishable from
    /// missing sessions.
    SessionNotFound,
    /// A trip or boat that does not exist or is not owned by the caller.
    NotFound,
    InvalidInput(String),
}

impl fmt::Display for DataManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataManagerError::Database(msg) => write!(f, "Database error: {msg}"),
            DataManagerError::BufferManager(msg) => write!(f, "Buffer error: {msg}"),
            DataManagerError::SessionNotFound => write!(f, "Session not found"),
            DataManagerError::NotFound => write!(f, "Not found"),
            DataManagerError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

impl std::error::Error for DataManagerError {}
