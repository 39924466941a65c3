pub mod capture;
pub mod config;
pub mod encounter;
pub mod error;
pub mod geo;
pub mod persistence;
pub mod pokeapi;
pub mod random;
pub mod remote;
pub mod shop;
pub mod state;
pub mod tables;
pub mod tracking;
pub mod walk;

pub use error::{AppError, CaptureError, ConfigError, ShopError, TrackingError, WalkError};

pub use capture::{CaptureEngine, CaptureResult, CaptureSession};
pub use config::Configuration;
pub use encounter::{Encounter, EncounterGenerator};
pub use geo::Coordinate;
pub use shop::{PurchaseResult, Shop};
pub use state::{GameEvent, GameStore};
pub use tracking::LocationTracker;
pub use walk::{WalkOrchestrator, WalkState, WalkSummary};
