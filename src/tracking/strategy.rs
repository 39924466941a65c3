use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::TrackingError;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    ContinuousWatch,
    BackgroundTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Foreground,
    Background,
}

/// Points recorded during one tracking session, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteBuffer {
    points: Vec<Coordinate>,
}

impl RouteBuffer {
    pub fn push(&mut self, point: Coordinate) {
        self.points.push(point);
    }

    /// Replaces the contents with a fresher copy from elsewhere.
    pub fn replace(&mut self, points: Vec<Coordinate>) {
        self.points = points;
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn last(&self) -> Option<Coordinate> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Coordinate> {
        self.points.clone()
    }
}

pub type SharedRoute = Arc<Mutex<RouteBuffer>>;

pub(crate) fn with_route<R>(route: &SharedRoute, f: impl FnOnce(&mut RouteBuffer) -> R) -> R {
    let mut guard = route.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// One way of turning location fixes into a route.
///
/// Implementations append to the shared buffer in arrival order, so the
/// tracker can expose the same view whichever one is active.
#[async_trait]
pub trait TrackingStrategy: Send {
    fn kind(&self) -> StrategyKind;

    fn needs_background_permission(&self) -> bool {
        false
    }

    async fn start(&mut self, route: SharedRoute) -> Result<(), TrackingError>;

    /// Pulls in points recorded outside the process, if the strategy has any.
    async fn sync(&mut self) {}

    async fn app_state_changed(&mut self, _state: AppState) {}

    async fn stop(&mut self);
}
