pub mod source;
pub mod types;

pub use source::{
    species, starter_roster, CachedPokemonSource, InMemoryPokemonSource, PokemonDataSource,
};
pub use types::{species_id_from_url, BaseStat, PokemonDetails, SpeciesInfo, Sprites};
