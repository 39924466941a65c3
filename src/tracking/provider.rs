use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::TrackingSettings;
use crate::error::TrackingError;
use crate::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    High,
    Balanced,
    Low,
}

/// How often and how precisely fixes should be delivered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    pub accuracy: Accuracy,
    pub min_interval: Duration,
    pub min_distance_meters: f64,
}

impl LocationRequest {
    pub fn from_settings(settings: &TrackingSettings) -> Self {
        Self {
            accuracy: Accuracy::High,
            min_interval: settings.min_interval(),
            min_distance_meters: settings.min_distance_meters,
        }
    }
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self::from_settings(&TrackingSettings::default())
    }
}

/// Fixes in arrival order. An `Err` item is one failed fix, not the end of
/// the stream.
pub type LocationStream = BoxStream<'static, Result<Coordinate, TrackingError>>;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn watch_position(&self, request: LocationRequest) -> Result<LocationStream, TrackingError>;
}
