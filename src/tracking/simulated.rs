//! In-process stand-ins for the device location services.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::background::{handle_background_locations, BackgroundTaskHost, BackgroundTaskOptions, RouteRelay};
use super::permissions::PermissionProvider;
use super::provider::{LocationProvider, LocationRequest, LocationStream};
use crate::error::TrackingError;
use crate::geo::Coordinate;

/// Replays a fixed path, one fix per `step`.
pub struct SimulatedLocationProvider {
    points: Arc<Vec<Coordinate>>,
    step: Duration,
    failures: Arc<HashSet<usize>>,
    available: bool,
}

impl SimulatedLocationProvider {
    pub fn new(points: Vec<Coordinate>, step: Duration) -> Self {
        Self {
            points: Arc::new(points),
            step,
            failures: Arc::new(HashSet::new()),
            available: true,
        }
    }

    /// The fixes at these positions fail instead of reporting a point.
    pub fn with_failures(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failures = Arc::new(indices.into_iter().collect());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

#[async_trait]
impl LocationProvider for SimulatedLocationProvider {
    async fn watch_position(&self, request: LocationRequest) -> Result<LocationStream, TrackingError> {
        if !self.available {
            return Err(TrackingError::ProviderUnavailable("location services are off".into()));
        }
        debug!("Simulated watch started with {:?}", request);
        let points = self.points.clone();
        let failures = self.failures.clone();
        let step = self.step;
        Ok(stream::unfold(0usize, move |index| {
            let points = points.clone();
            let failures = failures.clone();
            async move {
                let point = *points.get(index)?;
                tokio::time::sleep(step).await;
                let fix = if failures.contains(&index) {
                    Err(TrackingError::ProviderTransient(format!("no fix at sample {index}")))
                } else {
                    Ok(point)
                };
                Some((fix, index + 1))
            }
        })
        .boxed())
    }
}

/// Answers permission requests with fixed results.
pub struct StaticPermissions {
    foreground: bool,
    background: bool,
    foreground_requests: AtomicUsize,
    background_requests: AtomicUsize,
}

impl StaticPermissions {
    pub fn new(foreground: bool, background: bool) -> Self {
        Self {
            foreground,
            background,
            foreground_requests: AtomicUsize::new(0),
            background_requests: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(true, true)
    }

    pub fn denied() -> Self {
        Self::new(false, false)
    }

    pub fn foreground_requests(&self) -> usize {
        self.foreground_requests.load(Ordering::SeqCst)
    }

    pub fn background_requests(&self) -> usize {
        self.background_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissions {
    async fn request_foreground(&self) -> Result<bool, TrackingError> {
        self.foreground_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.foreground)
    }

    async fn request_background(&self) -> Result<bool, TrackingError> {
        self.background_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.background)
    }
}

/// Runs the "OS" background task as a tokio task writing into the relay.
pub struct SimulatedBackgroundHost {
    relay: RouteRelay,
    points: Arc<Vec<Coordinate>>,
    step: Duration,
    cursor: Arc<AtomicUsize>,
    registered: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    registrations: Mutex<Vec<BackgroundTaskOptions>>,
}

impl SimulatedBackgroundHost {
    pub fn new(relay: RouteRelay, points: Vec<Coordinate>, step: Duration) -> Self {
        Self {
            relay,
            points: Arc::new(points),
            step,
            cursor: Arc::new(AtomicUsize::new(0)),
            registered: AtomicBool::new(false),
            task: Mutex::new(None),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Every set of options the task has been registered with.
    pub fn registrations(&self) -> Vec<BackgroundTaskOptions> {
        self.registrations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = task;
    }
}

#[async_trait]
impl BackgroundTaskHost for SimulatedBackgroundHost {
    async fn register(&self, options: BackgroundTaskOptions) -> Result<(), TrackingError> {
        self.registrations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(options);
        if self.registered.swap(true, Ordering::SeqCst) {
            // already running, only the options change
            return Ok(());
        }
        let relay = self.relay.clone();
        let points = self.points.clone();
        let cursor = self.cursor.clone();
        let step = self.step;
        self.replace_task(Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(step).await;
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                let Some(point) = points.get(index).copied() else {
                    break;
                };
                handle_background_locations(&relay, Ok(vec![point])).await;
            }
        })));
        Ok(())
    }

    async fn unregister(&self) -> Result<(), TrackingError> {
        self.registered.store(false, Ordering::SeqCst);
        self.replace_task(None);
        Ok(())
    }

    async fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}

impl Drop for SimulatedBackgroundHost {
    fn drop(&mut self) {
        self.replace_task(None);
    }
}
