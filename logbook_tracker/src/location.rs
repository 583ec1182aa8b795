use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::LocationError;

/// Bounded wait for a single fix before an acquisition error is surfaced.
/// An already-active session is not terminated by it.
pub const ACQUISITION_TIMEOUT: Duration = Duration::from_secs(10);

/// A raw position sample from the location source. Timestamps are assigned
/// by the subscriber at receipt, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
}

/// A live stream of fixes. Dropping it closes the channel, which is how the
/// producer observes the unsubscribe.
pub struct LocationSubscription {
    receiver: mpsc::Receiver<Result<LocationFix, LocationError>>,
}

impl LocationSubscription {
    /// Pairs a subscription with the sender a source feeds fixes into.
    pub fn channel() -> (
        mpsc::Sender<Result<LocationFix, LocationError>>,
        LocationSubscription,
    ) {
        let (tx, receiver) = mpsc::channel(32);
        (tx, LocationSubscription { receiver })
    }

    pub async fn next(&mut self) -> Option<Result<LocationFix, LocationError>> {
        self.receiver.recv().await
    }
}

/// Produces at most one live subscription per manager instance.
pub trait LocationSource {
    /// Whether any location capability exists at all.
    fn is_available(&self) -> bool;

    fn subscribe(&mut self) -> Result<LocationSubscription, LocationError>;
}

/// Replays a scripted list of fixes, for tests and dry runs.
pub struct SimulatedLocationSource {
    fixes: Vec<Result<LocationFix, LocationError>>,
    available: bool,
    denied: bool,
}

impl SimulatedLocationSource {
    pub fn new(fixes: Vec<Result<LocationFix, LocationError>>) -> Self {
        Self {
            fixes,
            available: true,
            denied: false,
        }
    }

    /// A source reporting no location capability.
    pub fn unavailable() -> Self {
        Self {
            fixes: Vec::new(),
            available: false,
            denied: false,
        }
    }

    /// A capable source whose permission prompt was rejected.
    pub fn denied() -> Self {
        Self {
            fixes: Vec::new(),
            available: true,
            denied: true,
        }
    }
}

impl LocationSource for SimulatedLocationSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn subscribe(&mut self) -> Result<LocationSubscription, LocationError> {
        if !self.available {
            return Err(LocationError::Unavailable(
                "no location capability".to_string(),
            ));
        }
        if self.denied {
            return Err(LocationError::PermissionDenied);
        }

        let (tx, subscription) = LocationSubscription::channel();
        let fixes = std::mem::take(&mut self.fixes);
        tokio::spawn(async move {
            for fix in fixes {
                if tx.send(fix).await.is_err() {
                    // Subscriber unsubscribed.
                    break;
                }
            }
        });

        Ok(subscription)
    }
}
