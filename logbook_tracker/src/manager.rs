use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use logbook_lib::{
    derive::derive_trip,
    track_point::TrackPoint,
    trip::TripDraft,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};

use crate::{
    error::{LocationError, TrackerError},
    location::{ACQUISITION_TIMEOUT, LocationSource, LocationSubscription},
    session_client::SessionClient,
};

/// Submission and acquisition outcomes, observable instead of being logged
/// and forgotten.
#[derive(Debug)]
pub enum TrackerEvent {
    /// A fix was appended to the local buffer. `total` is the buffer length
    /// afterwards.
    PointRecorded { total: usize },
    /// A fire-and-forget submission failed. Recording continues.
    SubmissionFailed {
        session_id: i64,
        error: TrackerError,
    },
    /// The source produced an error or no fix within the bounded wait.
    /// Recording continues with gaps.
    AcquisitionError(LocationError),
}

/// The reconciled result of a stopped recording.
#[derive(Debug, Clone)]
pub struct StoppedRecording {
    pub session_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub points: Vec<TrackPoint>,
}

impl StoppedRecording {
    /// Derives a submittable trip draft. `None` for an empty recording,
    /// which has nothing worth saving.
    pub fn derive(&self, title: Option<String>) -> Option<TripDraft> {
        if self.points.is_empty() {
            return None;
        }
        Some(derive_trip(
            &self.points,
            self.started_at,
            self.ended_at,
            title,
        ))
    }
}

struct ActiveRecording {
    session_id: i64,
    started_at: DateTime<Utc>,
    pump: JoinHandle<()>,
}

/// Coordinates the lifetime of exactly one recording session.
///
/// Fixes are appended to the local buffer immediately and submitted to the
/// store best-effort, so a transient network failure never halts recording.
/// The local buffer stays readable after `stop()` as the fallback source.
pub struct TrackingManager<C: SessionClient> {
    client: Arc<C>,
    points: Arc<Mutex<Vec<TrackPoint>>>,
    events_tx: mpsc::UnboundedSender<TrackerEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<TrackerEvent>>,
    active: Option<ActiveRecording>,
}

impl<C: SessionClient> TrackingManager<C> {
    pub fn new(client: C) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            client: Arc::new(client),
            points: Arc::new(Mutex::new(Vec::new())),
            events_tx,
            events_rx: Some(events_rx),
            active: None,
        }
    }

    /// The outcome stream. Can be taken once, before the first `start()`;
    /// an untaken stream is discarded there so nothing queues for an
    /// observer that never comes.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TrackerEvent>> {
        self.events_rx.take()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_id(&self) -> Option<i64> {
        self.active.as_ref().map(|active| active.session_id)
    }

    /// Snapshot of the locally accumulated points. After `stop()` this still
    /// holds the last recording's buffer.
    pub fn recorded_points(&self) -> Vec<TrackPoint> {
        self.points.lock().unwrap().clone()
    }

    /// Creates a session and begins recording. The location subscription is
    /// live before this returns.
    pub async fn start<L: LocationSource>(&mut self, source: &mut L) -> Result<i64, TrackerError> {
        if self.active.is_some() {
            return Err(TrackerError::AlreadyRecording);
        }
        if !source.is_available() {
            return Err(TrackerError::UnsupportedEnvironment);
        }

        let session_id = self.client.create_session().await?;
        let subscription = source
            .subscribe()
            .map_err(TrackerError::LocationAcquisition)?;

        // Caller never asked for events, drop the receiver so the queue
        // cannot grow unobserved. Sends into a closed channel are ignored.
        self.events_rx = None;

        self.points.lock().unwrap().clear();

        let pump = tokio::spawn(pump_fixes(
            self.client.clone(),
            session_id,
            subscription,
            self.points.clone(),
            self.events_tx.clone(),
        ));

        self.active = Some(ActiveRecording {
            session_id,
            started_at: Utc::now(),
            pump,
        });

        tracing::info!("Recording session {}", session_id);
        Ok(session_id)
    }

    /// Unsubscribes first to bound the point set, then stops the session in
    /// the store. The server's point list wins when it is non-empty; a failed
    /// or empty stop falls back to the local buffer. `SessionNotFound` means
    /// the session was already stopped elsewhere: nothing to save, though the
    /// local buffer remains readable via [`Self::recorded_points`].
    pub async fn stop(&mut self) -> Result<StoppedRecording, TrackerError> {
        let Some(active) = self.active.take() else {
            return Err(TrackerError::NotRecording);
        };

        active.pump.abort();
        let _ = active.pump.await;

        let local_points = self.points.lock().unwrap().clone();

        match self.client.stop_session(active.session_id).await {
            Ok(session) => {
                let ended_at = session.state.ended_at().unwrap_or_else(Utc::now);
                let points = if session.track_points.is_empty() {
                    local_points
                } else {
                    session.track_points
                };
                Ok(StoppedRecording {
                    session_id: active.session_id,
                    started_at: session.state.started_at(),
                    ended_at,
                    points,
                })
            }
            Err(TrackerError::SessionNotFound) => Err(TrackerError::SessionNotFound),
            Err(err) => {
                // Transport failure after unsubscription. Local state is
                // authoritative, no data is silently lost.
                tracing::warn!(
                    "Stop request for session {} failed ({}), using local buffer",
                    active.session_id,
                    err
                );
                Ok(StoppedRecording {
                    session_id: active.session_id,
                    started_at: active.started_at,
                    ended_at: Utc::now(),
                    points: local_points,
                })
            }
        }
    }
}

impl<C: SessionClient> Drop for TrackingManager<C> {
    fn drop(&mut self) {
        // Unsubscribe without a stop request. The session stays active
        // server-side until stopped explicitly.
        if let Some(active) = self.active.take() {
            active.pump.abort();
        }
    }
}

/// Bridges the subscription to the store. Each fix is timestamped at
/// receipt, appended locally, and submitted without awaiting the result so
/// the next fix is never blocked by a submission in flight.
async fn pump_fixes<C: SessionClient>(
    client: Arc<C>,
    session_id: i64,
    mut subscription: LocationSubscription,
    points: Arc<Mutex<Vec<TrackPoint>>>,
    events: mpsc::UnboundedSender<TrackerEvent>,
) {
    loop {
        match timeout(ACQUISITION_TIMEOUT, subscription.next()).await {
            Err(_) => {
                let _ = events.send(TrackerEvent::AcquisitionError(LocationError::Timeout));
            }
            Ok(None) => break,
            Ok(Some(Err(err))) => {
                let _ = events.send(TrackerEvent::AcquisitionError(err));
            }
            Ok(Some(Ok(fix))) => {
                let point = TrackPoint::new(fix.lat, fix.lng, Utc::now());

                let total = {
                    let mut points = points.lock().unwrap();
                    points.push(point);
                    points.len()
                };
                let _ = events.send(TrackerEvent::PointRecorded { total });

                let client = client.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Err(error) = client.append_point(session_id, point).await {
                        tracing::warn!(
                            "Failed to submit point for session {}: {}",
                            session_id,
                            error
                        );
                        let _ = events.send(TrackerEvent::SubmissionFailed { session_id, error });
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicBool, AtomicI64, Ordering},
        time::Duration,
    };

    use logbook_lib::track_session::TrackSession;

    use super::*;
    use crate::location::{LocationFix, SimulatedLocationSource};

    #[derive(Default)]
    struct MockState {
        fail_create: AtomicBool,
        fail_appends: AtomicBool,
        next_id: AtomicI64,
        sessions: Mutex<HashMap<i64, TrackSession>>,
    }

    #[derive(Clone, Default)]
    struct MockClient {
        state: Arc<MockState>,
    }

    impl SessionClient for MockClient {
        async fn create_session(&self) -> Result<i64, TrackerError> {
            if self.state.fail_create.load(Ordering::SeqCst) {
                return Err(TrackerError::SessionCreate("store rejected".to_string()));
            }
            let id = self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let session = TrackSession::new_active(id, 1, Utc::now());
            self.state.sessions.lock().unwrap().insert(id, session);
            Ok(id)
        }

        async fn append_point(&self, session_id: i64, point: TrackPoint) -> Result<(), TrackerError> {
            if self.state.fail_appends.load(Ordering::SeqCst) {
                return Err(TrackerError::PointSubmission("network down".to_string()));
            }
            let mut sessions = self.state.sessions.lock().unwrap();
            match sessions.get_mut(&session_id) {
                Some(session) if session.state.is_active() => {
                    session.track_points.push(point);
                    Ok(())
                }
                _ => Err(TrackerError::SessionNotFound),
            }
        }

        async fn stop_session(&self, session_id: i64) -> Result<TrackSession, TrackerError> {
            let mut sessions = self.state.sessions.lock().unwrap();
            match sessions.get_mut(&session_id) {
                Some(session) if session.state.is_active() => {
                    session.stop(Utc::now()).unwrap();
                    Ok(session.clone())
                }
                _ => Err(TrackerError::SessionNotFound),
            }
        }
    }

    fn fixes(count: usize) -> Vec<Result<LocationFix, LocationError>> {
        (0..count)
            .map(|i| {
                Ok(LocationFix {
                    lat: 56.0 + i as f64 * 0.001,
                    lng: 10.2 + i as f64 * 0.001,
                })
            })
            .collect()
    }

    async fn wait_for_points(events: &mut mpsc::UnboundedReceiver<TrackerEvent>, wanted: usize) {
        timeout(Duration::from_secs(5), async {
            while let Some(event) = events.recv().await {
                if let TrackerEvent::PointRecorded { total } = event {
                    if total == wanted {
                        return;
                    }
                }
            }
            panic!("event stream closed early");
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn unavailable_source_is_unsupported_environment() {
        let mut manager = TrackingManager::new(MockClient::default());
        let mut source = SimulatedLocationSource::unavailable();

        let result = manager.start(&mut source).await;
        assert!(matches!(result, Err(TrackerError::UnsupportedEnvironment)));
        assert!(!manager.is_recording());
    }

    #[tokio::test]
    async fn denied_permission_surfaces_as_acquisition_error() {
        let mut manager = TrackingManager::new(MockClient::default());
        let mut source = SimulatedLocationSource::denied();

        let result = manager.start(&mut source).await;
        assert!(matches!(
            result,
            Err(TrackerError::LocationAcquisition(
                LocationError::PermissionDenied
            ))
        ));
        assert!(!manager.is_recording());
    }

    #[tokio::test]
    async fn untaken_event_stream_is_discarded_on_start() {
        let mut manager = TrackingManager::new(MockClient::default());

        manager
            .start(&mut SimulatedLocationSource::new(fixes(3)))
            .await
            .unwrap();

        // Recording proceeds without an observer.
        timeout(Duration::from_secs(5), async {
            while manager.recorded_points().len() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(manager.take_events().is_none());
        let stopped = manager.stop().await.unwrap();
        assert_eq!(stopped.points.len(), 3);
    }

    #[tokio::test]
    async fn create_failure_returns_to_idle() {
        let client = MockClient::default();
        client.state.fail_create.store(true, Ordering::SeqCst);

        let mut manager = TrackingManager::new(client);
        let mut source = SimulatedLocationSource::new(fixes(1));

        let result = manager.start(&mut source).await;
        assert!(matches!(result, Err(TrackerError::SessionCreate(_))));
        assert!(!manager.is_recording());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let mut manager = TrackingManager::new(MockClient::default());
        manager
            .start(&mut SimulatedLocationSource::new(fixes(1)))
            .await
            .unwrap();

        let result = manager.start(&mut SimulatedLocationSource::new(fixes(1))).await;
        assert!(matches!(result, Err(TrackerError::AlreadyRecording)));
    }

    #[tokio::test]
    async fn recorded_timestamps_are_assigned_at_receipt_in_order() {
        let mut manager = TrackingManager::new(MockClient::default());
        let mut events = manager.take_events().unwrap();

        let before = Utc::now();
        manager
            .start(&mut SimulatedLocationSource::new(fixes(3)))
            .await
            .unwrap();
        wait_for_points(&mut events, 3).await;

        let points = manager.recorded_points();
        assert_eq!(points.len(), 3);
        for pair in points.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert!(points[0].timestamp >= before);
    }

    #[tokio::test]
    async fn stop_prefers_server_points() {
        let client = MockClient::default();
        let mut manager = TrackingManager::new(client.clone());
        let mut events = manager.take_events().unwrap();

        manager
            .start(&mut SimulatedLocationSource::new(fixes(4)))
            .await
            .unwrap();
        wait_for_points(&mut events, 4).await;

        // Let the fire-and-forget submissions land.
        timeout(Duration::from_secs(5), async {
            loop {
                let id = manager.session_id().unwrap();
                let stored = client.state.sessions.lock().unwrap()[&id].track_points.len();
                if stored == 4 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let stopped = manager.stop().await.unwrap();
        assert_eq!(stopped.points.len(), 4);
        assert!(!manager.is_recording());
    }

    #[tokio::test]
    async fn all_submissions_failing_still_yields_full_trip_from_local_buffer() {
        let client = MockClient::default();
        client.state.fail_appends.store(true, Ordering::SeqCst);

        let mut manager = TrackingManager::new(client);
        let mut events = manager.take_events().unwrap();

        manager
            .start(&mut SimulatedLocationSource::new(fixes(5)))
            .await
            .unwrap();
        wait_for_points(&mut events, 5).await;

        // Server never stored a point, stop falls back to the local buffer.
        let stopped = manager.stop().await.unwrap();
        assert_eq!(stopped.points.len(), 5);

        let draft = stopped.derive(Some("Stormy evening".to_string())).unwrap();
        assert_eq!(draft.route.len(), 5);
        assert!(draft.distance_nm > 0.0);
        assert!(draft.duration_minutes >= 1);
    }

    #[tokio::test]
    async fn submission_failures_are_observable() {
        let client = MockClient::default();
        client.state.fail_appends.store(true, Ordering::SeqCst);

        let mut manager = TrackingManager::new(client);
        let mut events = manager.take_events().unwrap();

        manager
            .start(&mut SimulatedLocationSource::new(fixes(2)))
            .await
            .unwrap();

        let mut failures = 0;
        timeout(Duration::from_secs(5), async {
            while let Some(event) = events.recv().await {
                if matches!(event, TrackerEvent::SubmissionFailed { .. }) {
                    failures += 1;
                    if failures == 2 {
                        break;
                    }
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn acquisition_errors_do_not_end_the_session() {
        let mut manager = TrackingManager::new(MockClient::default());
        let mut events = manager.take_events().unwrap();

        let script = vec![
            Ok(LocationFix { lat: 56.0, lng: 10.2 }),
            Err(LocationError::PermissionDenied),
            Ok(LocationFix { lat: 56.001, lng: 10.201 }),
        ];
        manager
            .start(&mut SimulatedLocationSource::new(script))
            .await
            .unwrap();

        let mut saw_error = false;
        timeout(Duration::from_secs(5), async {
            while let Some(event) = events.recv().await {
                match event {
                    TrackerEvent::AcquisitionError(_) => saw_error = true,
                    TrackerEvent::PointRecorded { total: 2 } => break,
                    _ => {}
                }
            }
        })
        .await
        .unwrap();

        assert!(saw_error);
        assert_eq!(manager.recorded_points().len(), 2);
        assert!(manager.is_recording());
    }

    #[tokio::test]
    async fn stopping_an_already_stopped_session_is_not_found_but_keeps_the_buffer() {
        let client = MockClient::default();
        let mut manager = TrackingManager::new(client.clone());
        let mut events = manager.take_events().unwrap();

        manager
            .start(&mut SimulatedLocationSource::new(fixes(3)))
            .await
            .unwrap();
        wait_for_points(&mut events, 3).await;

        // Session stopped out from under the manager.
        let id = manager.session_id().unwrap();
        client
            .state
            .sessions
            .lock()
            .unwrap()
            .get_mut(&id)
            .unwrap()
            .stop(Utc::now())
            .unwrap();

        let result = manager.stop().await;
        assert!(matches!(result, Err(TrackerError::SessionNotFound)));
        assert!(!manager.is_recording());

        // The local buffer remains the fallback source.
        assert_eq!(manager.recorded_points().len(), 3);
    }

    #[tokio::test]
    async fn stop_while_idle_is_not_recording() {
        let mut manager = TrackingManager::new(MockClient::default());
        let result = manager.stop().await;
        assert!(matches!(result, Err(TrackerError::NotRecording)));
    }
}
