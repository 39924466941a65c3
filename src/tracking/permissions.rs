use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::TrackingError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionStatus {
    pub foreground: bool,
    pub background: bool,
}

#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request_foreground(&self) -> Result<bool, TrackingError>;
    async fn request_background(&self) -> Result<bool, TrackingError>;
}

/// Asks for foreground access, and for background access only when the
/// active strategy needs it. Errors count as a refusal.
pub async fn request_permissions(provider: &dyn PermissionProvider, needs_background: bool) -> PermissionStatus {
    let foreground = match provider.request_foreground().await {
        Ok(granted) => granted,
        Err(e) => {
            warn!("Foreground permission request failed: {}", e);
            false
        }
    };
    if !foreground {
        warn!("Location permission denied");
        return PermissionStatus::default();
    }

    let background = if needs_background {
        match provider.request_background().await {
            Ok(granted) => granted,
            Err(e) => {
                warn!("Background permission request failed: {}", e);
                false
            }
        }
    } else {
        false
    };
    info!("Location permission granted (background: {})", background);
    PermissionStatus { foreground, background }
}
