use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::provider::LocationRequest;
use super::strategy::{with_route, AppState, SharedRoute, StrategyKind, TrackingStrategy};
use crate::error::TrackingError;
use crate::geo::Coordinate;
use crate::persistence::{keys, load_json, save_json, StorageBackend};

/// Durable buffer the background task writes fixes into.
#[derive(Clone)]
pub struct RouteRelay {
    storage: Arc<dyn StorageBackend>,
}

impl RouteRelay {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Vec<Coordinate>, TrackingError> {
        load_json::<Vec<Coordinate>>(self.storage.as_ref(), keys::BACKGROUND_ROUTE)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| TrackingError::Relay(e.to_string()))
    }

    pub async fn append(&self, points: &[Coordinate]) -> Result<(), TrackingError> {
        if points.is_empty() {
            return Ok(());
        }
        let mut stored = self.load().await?;
        stored.extend_from_slice(points);
        save_json(self.storage.as_ref(), keys::BACKGROUND_ROUTE, &stored)
            .await
            .map_err(|e| TrackingError::Relay(e.to_string()))
    }

    pub async fn clear(&self) -> Result<(), TrackingError> {
        self.storage
            .remove(keys::BACKGROUND_ROUTE)
            .await
            .map_err(|e| TrackingError::Relay(e.to_string()))
    }
}

/// The persistent notification shown while tracking from the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundNotice {
    pub title: String,
    pub body: String,
}

impl Default for ForegroundNotice {
    fn default() -> Self {
        Self {
            title: "Walk in progress".to_string(),
            body: "Your route is being recorded.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundTaskOptions {
    pub request: LocationRequest,
    pub notice: Option<ForegroundNotice>,
}

/// OS facility that keeps delivering fixes when the app is not running.
///
/// Registering again replaces the previous options.
#[async_trait]
pub trait BackgroundTaskHost: Send + Sync {
    async fn register(&self, options: BackgroundTaskOptions) -> Result<(), TrackingError>;
    async fn unregister(&self) -> Result<(), TrackingError>;
    async fn is_registered(&self) -> bool;
}

/// What the background task does with each batch the OS hands it.
pub async fn handle_background_locations(
    relay: &RouteRelay,
    batch: Result<Vec<Coordinate>, TrackingError>,
) {
    match batch {
        Ok(points) => {
            if let Err(e) = relay.append(&points).await {
                warn!("Background task failed to store {} points: {}", points.len(), e);
            }
        }
        Err(e) => warn!("Background location task error: {}", e),
    }
}

/// Background task plus relay store. The in-memory route is a copy of the
/// relay, refreshed on a timer while the app is in the foreground.
pub struct BackgroundTaskStrategy {
    host: Arc<dyn BackgroundTaskHost>,
    relay: RouteRelay,
    request: LocationRequest,
    sync_interval: Duration,
    notice: ForegroundNotice,
    route: Option<SharedRoute>,
    sync_task: Option<JoinHandle<()>>,
    app_state: AppState,
}

impl BackgroundTaskStrategy {
    pub fn new(
        host: Arc<dyn BackgroundTaskHost>,
        relay: RouteRelay,
        request: LocationRequest,
        sync_interval: Duration,
    ) -> Self {
        Self {
            host,
            relay,
            request,
            sync_interval,
            notice: ForegroundNotice::default(),
            route: None,
            sync_task: None,
            app_state: AppState::Foreground,
        }
    }

    pub fn with_notice(mut self, notice: ForegroundNotice) -> Self {
        self.notice = notice;
        self
    }

    fn options(&self) -> BackgroundTaskOptions {
        BackgroundTaskOptions {
            request: self.request,
            notice: match self.app_state {
                AppState::Foreground => None,
                AppState::Background => Some(self.notice.clone()),
            },
        }
    }

    fn start_sync_loop(&mut self) {
        let Some(route) = self.route.clone() else {
            return;
        };
        let relay = self.relay.clone();
        let period = self.sync_interval;
        self.stop_sync_loop();
        self.sync_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reload(&relay, &route).await;
            }
        }));
    }

    fn stop_sync_loop(&mut self) {
        if let Some(task) = self.sync_task.take() {
            task.abort();
        }
    }
}

async fn reload(relay: &RouteRelay, route: &SharedRoute) {
    match relay.load().await {
        Ok(points) => {
            debug!("Reloaded {} points from relay", points.len());
            with_route(route, |r| r.replace(points));
        }
        Err(e) => warn!("Failed to reload background route: {}", e),
    }
}

#[async_trait]
impl TrackingStrategy for BackgroundTaskStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BackgroundTask
    }

    fn needs_background_permission(&self) -> bool {
        true
    }

    async fn start(&mut self, route: SharedRoute) -> Result<(), TrackingError> {
        if let Err(e) = self.relay.clear().await {
            warn!("Failed to clear previous background route: {}", e);
        }
        self.host.register(self.options()).await?;
        self.route = Some(route);
        self.start_sync_loop();
        info!("Background location task registered");
        Ok(())
    }

    async fn sync(&mut self) {
        if let Some(route) = &self.route {
            reload(&self.relay, route).await;
        }
    }

    async fn app_state_changed(&mut self, state: AppState) {
        if state == self.app_state || self.route.is_none() {
            self.app_state = state;
            return;
        }
        self.app_state = state;
        if let Err(e) = self.host.register(self.options()).await {
            warn!("Failed to reconfigure background task: {}", e);
        }
        match state {
            AppState::Background => {
                self.stop_sync_loop();
                debug!("Background task now shows a notification");
            }
            AppState::Foreground => {
                self.sync().await;
                self.start_sync_loop();
                debug!("Background task running without notification");
            }
        }
    }

    async fn stop(&mut self) {
        self.stop_sync_loop();
        if let Err(e) = self.host.unregister().await {
            warn!("Failed to unregister background task: {}", e);
        }
        // points recorded since the last periodic sync
        self.sync().await;
        if let Err(e) = self.relay.clear().await {
            warn!("Failed to clear background route: {}", e);
        }
        self.route = None;
        info!("Background location task stopped");
    }
}

impl Drop for BackgroundTaskStrategy {
    fn drop(&mut self) {
        self.stop_sync_loop();
    }
}
