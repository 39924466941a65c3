use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "POKEWALK";

/// Top level settings for a walking session and everything it drives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub tracking: TrackingSettings,
    pub generation: GenerationSettings,
    pub capture: CaptureSettings,
    pub persistence: PersistenceSettings,
    pub remote: RemoteSettings,
    pub walk: WalkSettings,
}

/// Which tracking strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreference {
    /// Probe the runtime and pick the best strategy it supports.
    #[default]
    Auto,
    /// Always use the in-process location watch.
    Watch,
    /// Always use the OS background task with the relay store.
    Background,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    pub min_interval_ms: u64,
    pub min_distance_meters: f64,
    pub relay_sync_interval_ms: u64,
    pub strategy: StrategyPreference,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 5000,
            min_distance_meters: 10.0,
            relay_sync_interval_ms: 5000,
            strategy: StrategyPreference::Auto,
        }
    }
}

impl TrackingSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn relay_sync_interval(&self) -> Duration {
        Duration::from_millis(self.relay_sync_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub check_distance_meters: f64,
    pub pokemon_probability: f64,
    pub item_probability: f64,
    pub shiny_probability: f64,
    pub shiny_charm_multiplier: f64,
    pub max_spawn_attempts: u32,
    pub dex_count: u32,
    /// Suppress species without a boosted type while a type event runs.
    pub suppress_unboosted: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            check_distance_meters: 50.0,
            pokemon_probability: 0.3,
            item_probability: 0.15,
            shiny_probability: 1.0 / 4096.0,
            shiny_charm_multiplier: 3.0,
            max_spawn_attempts: 5,
            dex_count: 251,
            suppress_unboosted: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub resolution_delay_ms: u64,
    pub lucky_egg_multiplier: f64,
    pub lucky_egg_notice_delay_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution_delay_ms: 1200,
            lucky_egg_multiplier: 2.0,
            lucky_egg_notice_delay_ms: 2000,
        }
    }
}

impl CaptureSettings {
    pub fn resolution_delay(&self) -> Duration {
        Duration::from_millis(self.resolution_delay_ms)
    }

    pub fn lucky_egg_notice_delay(&self) -> Duration {
        Duration::from_millis(self.lucky_egg_notice_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub debounce_ms: u64,
    pub data_dir: Option<String>,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            data_dir: None,
        }
    }
}

impl PersistenceSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub cache_ttl_secs: u64,
    pub config_path: Option<String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            config_path: None,
        }
    }
}

impl RemoteSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkSettings {
    /// Walks shorter than this with no encounters do not raise the summary signal.
    pub summary_min_distance_meters: f64,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            summary_min_distance_meters: 10.0,
        }
    }
}

impl Configuration {
    /// Load from an optional file, then apply `POKEWALK__SECTION__FIELD` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let configuration: Configuration = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        if generation.check_distance_meters <= 0.0 {
            return Err(invalid(
                "generation.check_distance_meters",
                "must be greater than 0",
            ));
        }
        for (field, value) in [
            ("generation.pokemon_probability", generation.pokemon_probability),
            ("generation.item_probability", generation.item_probability),
            ("generation.shiny_probability", generation.shiny_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be between 0.0 and 1.0"));
            }
        }
        if generation.pokemon_probability + generation.item_probability > 1.0 {
            return Err(invalid(
                "generation.pokemon_probability",
                "pokemon and item probabilities must not exceed 1.0 together",
            ));
        }
        if generation.max_spawn_attempts == 0 {
            return Err(invalid(
                "generation.max_spawn_attempts",
                "must be greater than 0",
            ));
        }
        if generation.dex_count == 0 {
            return Err(invalid("generation.dex_count", "must be greater than 0"));
        }
        if self.tracking.min_distance_meters < 0.0 {
            return Err(invalid(
                "tracking.min_distance_meters",
                "must not be negative",
            ));
        }
        if self.tracking.relay_sync_interval_ms == 0 {
            return Err(invalid(
                "tracking.relay_sync_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.capture.lucky_egg_multiplier < 1.0 {
            return Err(invalid(
                "capture.lucky_egg_multiplier",
                "must be at least 1.0",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
