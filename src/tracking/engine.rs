use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::background::{BackgroundTaskHost, BackgroundTaskStrategy, RouteRelay};
use super::permissions::{request_permissions, PermissionProvider, PermissionStatus};
use super::provider::{LocationProvider, LocationRequest};
use super::strategy::{with_route, AppState, SharedRoute, StrategyKind, TrackingStrategy};
use super::watch::ContinuousWatchStrategy;
use crate::config::{StrategyPreference, TrackingSettings};
use crate::error::TrackingError;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    RequestingPermission,
    Tracking,
    Stopped,
}

/// Present when the platform can run a durable background task.
#[derive(Clone)]
pub struct BackgroundSupport {
    pub host: Arc<dyn BackgroundTaskHost>,
    pub relay: RouteRelay,
}

/// Picks the tracking strategy from what the platform offers.
pub fn select_strategy(
    settings: &TrackingSettings,
    provider: Arc<dyn LocationProvider>,
    background: Option<BackgroundSupport>,
) -> Box<dyn TrackingStrategy> {
    let request = LocationRequest::from_settings(settings);
    let background = match (settings.strategy, background) {
        (StrategyPreference::Watch, _) => None,
        (StrategyPreference::Background, None) => {
            warn!("Background tracking requested but not supported, using continuous watch");
            None
        }
        (_, support) => support,
    };

    match background {
        Some(support) => {
            info!("Using background task tracking");
            Box::new(BackgroundTaskStrategy::new(
                support.host,
                support.relay,
                request,
                settings.relay_sync_interval(),
            ))
        }
        None => {
            info!("Using continuous watch tracking");
            Box::new(ContinuousWatchStrategy::new(provider, request))
        }
    }
}

/// Records the walked route behind one contract, whichever strategy runs.
pub struct LocationTracker {
    permissions: Arc<dyn PermissionProvider>,
    strategy: Box<dyn TrackingStrategy>,
    state: TrackingState,
    route: SharedRoute,
    permission_status: Option<PermissionStatus>,
    last_error: Option<TrackingError>,
}

impl LocationTracker {
    pub fn new(permissions: Arc<dyn PermissionProvider>, strategy: Box<dyn TrackingStrategy>) -> Self {
        Self {
            permissions,
            strategy,
            state: TrackingState::Idle,
            route: SharedRoute::default(),
            permission_status: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == TrackingState::Tracking
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn current_location(&self) -> Option<Coordinate> {
        with_route(&self.route, |r| r.last())
    }

    pub fn route(&self) -> Vec<Coordinate> {
        with_route(&self.route, |r| r.snapshot())
    }

    pub fn permission_status(&self) -> Option<PermissionStatus> {
        self.permission_status
    }

    pub fn last_error(&self) -> Option<&TrackingError> {
        self.last_error.as_ref()
    }

    pub async fn request_permissions(&mut self) -> PermissionStatus {
        let previous = self.state;
        self.state = TrackingState::RequestingPermission;
        let status = request_permissions(
            self.permissions.as_ref(),
            self.strategy.needs_background_permission(),
        )
        .await;
        self.permission_status = Some(status);
        self.state = previous;
        status
    }

    /// Starts recording a new route. Does nothing if already tracking.
    ///
    /// A refused permission leaves the state as it was and is returned as
    /// [`TrackingError::PermissionDenied`].
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), TrackingError> {
        if self.is_tracking() {
            debug!("Tracking already active");
            return Ok(());
        }

        let granted = match self.permission_status {
            Some(status) if status.foreground => status,
            _ => self.request_permissions().await,
        };
        if !granted.foreground {
            self.last_error = Some(TrackingError::PermissionDenied);
            return Err(TrackingError::PermissionDenied);
        }
        if self.strategy.needs_background_permission() && !granted.background {
            warn!("Background permission missing, tracking may pause when the app is backgrounded");
        }

        with_route(&self.route, |r| r.clear());
        if let Err(e) = self.strategy.start(self.route.clone()).await {
            warn!("Failed to start location tracking: {}", e);
            self.last_error = Some(e.clone());
            return Err(e);
        }
        self.last_error = None;
        self.state = TrackingState::Tracking;
        info!("Location tracking started");
        Ok(())
    }

    /// Stops recording and returns the final route. Calling it again
    /// returns the same route.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Vec<Coordinate> {
        if self.is_tracking() {
            self.strategy.stop().await;
            self.state = TrackingState::Stopped;
            info!("Location tracking stopped with {} points", with_route(&self.route, |r| r.len()));
        }
        self.route()
    }

    /// Refreshes the route from out-of-process storage, if any.
    pub async fn sync(&mut self) {
        if self.is_tracking() {
            self.strategy.sync().await;
        }
    }

    pub async fn app_state_changed(&mut self, state: AppState) {
        if self.is_tracking() {
            self.strategy.app_state_changed(state).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::tracking::simulated::{SimulatedBackgroundHost, SimulatedLocationProvider, StaticPermissions};
    use std::time::Duration;

    fn path(n: usize) -> Vec<Coordinate> {
        (0..n).map(|i| Coordinate::new(40.0, -3.0 + i as f64 * 0.0002)).collect()
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn watch_tracker(permissions: Arc<StaticPermissions>, provider: SimulatedLocationProvider) -> LocationTracker {
        let strategy = select_strategy(
            &TrackingSettings {
                strategy: StrategyPreference::Watch,
                ..TrackingSettings::default()
            },
            Arc::new(provider),
            None,
        );
        LocationTracker::new(permissions, strategy)
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_strategy_appends_in_order() {
        let points = path(4);
        let provider = SimulatedLocationProvider::new(points.clone(), Duration::from_secs(5)).with_failures([2]);
        let mut tracker = watch_tracker(Arc::new(StaticPermissions::granted()), provider);
        assert_eq!(tracker.strategy_kind(), StrategyKind::ContinuousWatch);

        tracker.start().await.unwrap();
        assert!(tracker.is_tracking());
        tokio::time::sleep(Duration::from_secs(21)).await;
        settle().await;

        let route = tracker.stop().await;
        assert_eq!(route, vec![points[0], points[1], points[3]]);
        assert_eq!(tracker.current_location(), Some(points[3]));
        assert_eq!(tracker.state(), TrackingState::Stopped);
        assert_eq!(tracker.stop().await, route);
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_state() {
        let permissions = Arc::new(StaticPermissions::denied());
        let provider = SimulatedLocationProvider::new(path(2), Duration::from_secs(1));
        let mut tracker = watch_tracker(permissions.clone(), provider);

        assert_eq!(tracker.start().await, Err(TrackingError::PermissionDenied));
        assert_eq!(tracker.state(), TrackingState::Idle);
        assert_eq!(tracker.last_error(), Some(&TrackingError::PermissionDenied));
        assert_eq!(permissions.background_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_a_no_op() {
        let permissions = Arc::new(StaticPermissions::granted());
        let provider = SimulatedLocationProvider::new(path(3), Duration::from_secs(5));
        let mut tracker = watch_tracker(permissions.clone(), provider);

        tracker.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        settle().await;
        tracker.start().await.unwrap();
        assert_eq!(tracker.route().len(), 1);
        assert_eq!(permissions.foreground_requests(), 1);
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported() {
        let provider = SimulatedLocationProvider::new(path(2), Duration::from_secs(1)).unavailable();
        let mut tracker = watch_tracker(Arc::new(StaticPermissions::granted()), provider);
        assert!(matches!(tracker.start().await, Err(TrackingError::ProviderUnavailable(_))));
        assert_eq!(tracker.state(), TrackingState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_strategy_relays_points() {
        let storage = Arc::new(MemoryStorage::new());
        let relay = RouteRelay::new(storage);
        let points = path(6);
        let host = Arc::new(SimulatedBackgroundHost::new(relay.clone(), points.clone(), Duration::from_secs(5)));
        let settings = TrackingSettings::default();
        let strategy = select_strategy(
            &settings,
            Arc::new(SimulatedLocationProvider::new(Vec::new(), Duration::from_secs(1))),
            Some(BackgroundSupport {
                host: host.clone(),
                relay: relay.clone(),
            }),
        );
        let permissions = Arc::new(StaticPermissions::granted());
        let mut tracker = LocationTracker::new(permissions.clone(), strategy);
        assert_eq!(tracker.strategy_kind(), StrategyKind::BackgroundTask);

        tracker.start().await.unwrap();
        assert_eq!(permissions.background_requests(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        settle().await;
        tracker.app_state_changed(AppState::Background).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        tracker.app_state_changed(AppState::Foreground).await;
        assert_eq!(tracker.route().len(), 4);

        tokio::time::sleep(Duration::from_secs(6)).await;
        settle().await;
        let route = tracker.stop().await;
        assert_eq!(route, points[..5].to_vec());
        assert!(!host.is_registered().await);
        assert!(relay.load().await.unwrap().is_empty());

        let notices: Vec<bool> = host.registrations().iter().map(|o| o.notice.is_some()).collect();
        assert_eq!(notices, vec![false, true, false]);
    }
}
