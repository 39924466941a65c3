use thiserror::Error;
use uuid::Uuid;

use crate::walk::WalkState;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Walk Error: {0}")]
    Walk(#[from] WalkError),
    #[error("Tracking Error: {0}")]
    Tracking(#[from] TrackingError),
    #[error("Storage Error: {0}")]
    Storage(#[from] StorageError),
    #[error("Remote Config Error: {0}")]
    RemoteConfig(#[from] RemoteConfigError),
    #[error("Data Fetch Error: {0}")]
    DataFetch(#[from] DataFetchError),
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// Location tracking errors. PermissionDenied is the only blocking one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error("Location permission was denied.")]
    PermissionDenied,
    #[error("Location provider is unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Location fix failed: {0}")]
    ProviderTransient(String),
    #[error("Background task error: {0}")]
    BackgroundTask(String),
    #[error("Relay store error: {0}")]
    Relay(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFetchError {
    #[error("Pokemon {0} was not found")]
    NotFound(u32),
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum RemoteConfigError {
    #[error("Failed to fetch remote config: {0}")]
    Fetch(String),
    #[error("Failed to decode remote config: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to read remote config: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("No {0} left in the bag!")]
    EmptyBag(String),
    #[error("{0} is not a Poke Ball.")]
    UnknownBall(String),
    #[error("{0} cannot be fed to a wild Pokemon.")]
    UnknownBerry(String),
    #[error("No {0} left!")]
    NoBerries(String),
    #[error("A berry is already active.")]
    BerryAlreadyActive,
    #[error("Encounter {0} was already resolved.")]
    AlreadyResolved(Uuid),
    #[error("Encounter {0} is not in the walk summary.")]
    EncounterNotFound(Uuid),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShopError {
    #[error("Not enough coins: need {needed}, have {available}.")]
    InsufficientFunds { needed: u32, available: u32 },
    #[error("{0} is not for sale.")]
    NotForSale(String),
    #[error("Quantity must be greater than zero.")]
    InvalidQuantity,
}

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Cannot {action} while the walk is {state:?}.")]
    InvalidTransition {
        action: &'static str,
        state: WalkState,
    },
    #[error("Tracking failed: {0}")]
    Tracking(#[from] TrackingError),
}
