pub mod generator;
pub mod types;

pub use generator::{EncounterGenerator, SessionProbabilities};
pub use types::{Encounter, ItemEncounter, PokemonEncounter, SpawnCandidate};
