use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::provider::{LocationProvider, LocationRequest};
use super::strategy::{with_route, SharedRoute, StrategyKind, TrackingStrategy};
use crate::error::TrackingError;

/// Foreground subscription to the location provider. Fixes go straight
/// into the in-memory route.
pub struct ContinuousWatchStrategy {
    provider: Arc<dyn LocationProvider>,
    request: LocationRequest,
    subscription: Option<JoinHandle<()>>,
}

impl ContinuousWatchStrategy {
    pub fn new(provider: Arc<dyn LocationProvider>, request: LocationRequest) -> Self {
        Self {
            provider,
            request,
            subscription: None,
        }
    }
}

#[async_trait]
impl TrackingStrategy for ContinuousWatchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ContinuousWatch
    }

    async fn start(&mut self, route: SharedRoute) -> Result<(), TrackingError> {
        let mut stream = self.provider.watch_position(self.request).await?;
        self.subscription = Some(tokio::spawn(async move {
            while let Some(fix) = stream.next().await {
                match fix {
                    Ok(point) => {
                        with_route(&route, |r| r.push(point));
                        debug!("Location update {:.6},{:.6}", point.latitude, point.longitude);
                    }
                    Err(e) => warn!("Location fix failed, continuing: {}", e),
                }
            }
            debug!("Location stream ended");
        }));
        info!("Continuous location watch started");
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.abort();
            info!("Continuous location watch stopped");
        }
    }
}

impl Drop for ContinuousWatchStrategy {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.abort();
        }
    }
}
