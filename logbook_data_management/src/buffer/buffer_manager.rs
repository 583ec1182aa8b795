use std::{collections::HashMap, path::PathBuf, sync::Arc};

use logbook_lib::track_point::TrackPoint;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
    sync::Mutex,
};

use crate::DataManagerError;

/// Append-only point buffer for one active session. The file is the crash
/// record, the vec mirrors it so reads never re-parse the file.
struct Buffer {
    file: File,
    points: Vec<TrackPoint>,
}

impl Buffer {
    async fn load(mut file: File) -> Result<Self, DataManagerError> {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(|_| DataManagerError::BufferManager("Failed to read buffer file".to_string()))?;

        let mut points = Vec::new();
        let mut cursor = std::io::Cursor::new(bytes);
        while let Ok(point) = bincode::deserialize_from::<_, TrackPoint>(&mut cursor) {
            points.push(point);
        }

        Ok(Self { file, points })
    }

    async fn append(&mut self, point: TrackPoint) -> Result<(), DataManagerError> {
        let bytes = bincode::serialize(&point)
            .map_err(|_| DataManagerError::BufferManager("Failed to serialize track point".to_string()))?;

        self.file
            .write_all(&bytes)
            .await
            .map_err(|_| DataManagerError::BufferManager("Failed to write track point".to_string()))?;
        self.file
            .flush()
            .await
            .map_err(|_| DataManagerError::BufferManager("Failed to flush buffer file".to_string()))?;

        self.points.push(point);
        Ok(())
    }
}

/// Manages the point buffers of all currently active sessions. Buffers found
/// on disk at startup are reopened, so active sessions survive a server
/// restart.
#[derive(Clone)]
pub struct BufferManager {
    buffer_dir: PathBuf,
    buffer_map: Arc<Mutex<HashMap<i64, Buffer>>>,
}

impl BufferManager {
    pub async fn start(buffer_dir: PathBuf) -> Result<Self, DataManagerError> {
        if !buffer_dir.exists() {
            tokio::fs::create_dir_all(&buffer_dir).await.map_err(|_| {
                DataManagerError::BufferManager(format!(
                    "Failed to create buffer file directory: {:?}",
                    buffer_dir
                ))
            })?;
        }

        let mut buffer_map = HashMap::new();
        for entry in buffer_dir.read_dir().map_err(|_| {
            DataManagerError::BufferManager(format!(
                "Failed to read buffer files from {:?}",
                buffer_dir
            ))
        })? {
            let path = entry.map(|entry| entry.path()).map_err(|_| {
                DataManagerError::BufferManager(format!(
                    "Failed to read buffer files from {:?}",
                    buffer_dir
                ))
            })?;

            let Some(session_id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok())
            else {
                return Err(DataManagerError::BufferManager(format!(
                    "Buffer file had illegal path: {:?}",
                    path
                )));
            };

            let file = OpenOptions::new()
                .read(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|_| {
                    DataManagerError::BufferManager(format!("Failed to open buffer file: {:?}", path))
                })?;

            tracing::info!("Reopened buffer for active session {}", session_id);
            buffer_map.insert(session_id, Buffer::load(file).await?);
        }

        Ok(BufferManager {
            buffer_dir,
            buffer_map: Arc::new(Mutex::new(buffer_map)),
        })
    }

    fn buffer_path(&self, session_id: i64) -> PathBuf {
        self.buffer_dir.join(format!("{session_id}.buf"))
    }

    pub async fn open_session(&self, session_id: i64) -> Result<(), DataManagerError> {
        let path = self.buffer_path(session_id);

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|_| {
                DataManagerError::BufferManager(format!("Failed to create buffer file: {:?}", path))
            })?;

        let mut buffer_map = self.buffer_map.lock().await;
        buffer_map.insert(session_id, Buffer::load(file).await?);

        Ok(())
    }

    pub async fn append_track_point(
        &self,
        session_id: i64,
        point: TrackPoint,
    ) -> Result<(), DataManagerError> {
        let mut buffer_map = self.buffer_map.lock().await;
        let buffer = buffer_map
            .get_mut(&session_id)
            .ok_or(DataManagerError::SessionNotFound)?;
        buffer.append(point).await
    }

    pub async fn read_buffer(&self, session_id: i64) -> Result<Vec<TrackPoint>, DataManagerError> {
        let buffer_map = self.buffer_map.lock().await;
        let buffer = buffer_map
            .get(&session_id)
            .ok_or(DataManagerError::SessionNotFound)?;
        Ok(buffer.points.clone())
    }

    /// Removes the buffer and its file, returning the accumulated points.
    pub async fn close_session(
        &self,
        session_id: i64,
    ) -> Result<Vec<TrackPoint>, DataManagerError> {
        let mut buffer_map = self.buffer_map.lock().await;
        let buffer = buffer_map
            .remove(&session_id)
            .ok_or(DataManagerError::SessionNotFound)?;

        let path = self.buffer_path(session_id);
        tokio::fs::remove_file(&path).await.map_err(|_| {
            DataManagerError::BufferManager(format!("Failed to remove buffer file: {:?}", path))
        })?;

        Ok(buffer.points)
    }
}
