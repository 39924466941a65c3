pub mod background;
pub mod engine;
pub mod permissions;
pub mod provider;
pub mod simulated;
pub mod strategy;
pub mod watch;

pub use background::{
    handle_background_locations, BackgroundTaskHost, BackgroundTaskOptions, BackgroundTaskStrategy,
    ForegroundNotice, RouteRelay,
};
pub use engine::{select_strategy, BackgroundSupport, LocationTracker, TrackingState};
pub use permissions::{request_permissions, PermissionProvider, PermissionStatus};
pub use provider::{Accuracy, LocationProvider, LocationRequest, LocationStream};
pub use simulated::{SimulatedBackgroundHost, SimulatedLocationProvider, StaticPermissions};
pub use strategy::{AppState, RouteBuffer, SharedRoute, StrategyKind, TrackingStrategy};
pub use watch::ContinuousWatchStrategy;
