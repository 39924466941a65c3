pub mod event_checker;
pub mod event_config;
pub mod service;

pub use event_checker::EventAnnouncer;
pub use event_config::{DefaultProbabilities, EventBoosts, EventConfig, RemoteConfig};
pub use service::{JsonFileSource, RemoteConfigService, RemoteConfigSource, StaticConfigSource};
