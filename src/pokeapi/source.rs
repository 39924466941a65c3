use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::types::{PokemonDetails, SpeciesInfo, Sprites};
use crate::error::DataFetchError;

const SPRITE_URL_BASE: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";
const SPECIES_URL_BASE: &str = "https://pokeapi.co/api/v2/pokemon-species";

/// Capability for looking up Pokémon data.
#[async_trait]
pub trait PokemonDataSource: Send + Sync {
    async fn pokemon(&self, id: u32) -> Result<PokemonDetails, DataFetchError>;

    async fn species_list(&self, limit: u32) -> Result<Vec<SpeciesInfo>, DataFetchError>;
}

/// Memoizes successful lookups by id. Failures are not cached.
pub struct CachedPokemonSource<S> {
    inner: S,
    cache: Mutex<HashMap<u32, PokemonDetails>>,
}

impl<S: PokemonDataSource> CachedPokemonSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn cached(&self, id: u32) -> Option<PokemonDetails> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }
}

#[async_trait]
impl<S: PokemonDataSource> PokemonDataSource for CachedPokemonSource<S> {
    async fn pokemon(&self, id: u32) -> Result<PokemonDetails, DataFetchError> {
        if let Some(details) = self.cached(id) {
            return Ok(details);
        }
        debug!("Fetching Pokemon {}", id);
        match self.inner.pokemon(id).await {
            Ok(details) => {
                self.cache
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(id, details.clone());
                Ok(details)
            }
            Err(e) => {
                warn!("Failed to fetch Pokemon {}: {}", id, e);
                Err(e)
            }
        }
    }

    async fn species_list(&self, limit: u32) -> Result<Vec<SpeciesInfo>, DataFetchError> {
        self.inner.species_list(limit).await
    }
}

/// Offline data source backed by a fixed roster.
#[derive(Default)]
pub struct InMemoryPokemonSource {
    roster: HashMap<u32, PokemonDetails>,
    failing: HashSet<u32>,
    fetches: AtomicUsize,
}

impl InMemoryPokemonSource {
    pub fn new(roster: impl IntoIterator<Item = PokemonDetails>) -> Self {
        Self {
            roster: roster.into_iter().map(|p| (p.id, p)).collect(),
            failing: HashSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Makes lookups for these ids fail with a network error.
    pub fn with_failures(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.failing.extend(ids);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PokemonDataSource for InMemoryPokemonSource {
    async fn pokemon(&self, id: u32) -> Result<PokemonDetails, DataFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&id) {
            return Err(DataFetchError::Network(format!("lookup for {id} failed")));
        }
        self.roster
            .get(&id)
            .cloned()
            .ok_or(DataFetchError::NotFound(id))
    }

    async fn species_list(&self, limit: u32) -> Result<Vec<SpeciesInfo>, DataFetchError> {
        let mut ids: Vec<u32> = self.roster.keys().copied().filter(|id| *id <= limit).collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.roster.get(&id))
            .map(|p| SpeciesInfo {
                name: p.name.clone(),
                url: format!("{SPECIES_URL_BASE}/{}/", p.id),
            })
            .collect())
    }
}

/// Builds a details record with the standard PokeAPI sprite paths.
pub fn species(id: u32, name: &str, types: &[&str], capture_rate: u32) -> PokemonDetails {
    PokemonDetails {
        id,
        name: name.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
        sprites: Sprites {
            front_default: Some(format!("{SPRITE_URL_BASE}/{id}.png")),
            front_shiny: Some(format!("{SPRITE_URL_BASE}/shiny/{id}.png")),
        },
        capture_rate,
        stats: None,
    }
}

/// Small Kanto roster used by the demo binary.
pub fn starter_roster() -> Vec<PokemonDetails> {
    vec![
        species(1, "bulbasaur", &["grass", "poison"], 45),
        species(4, "charmander", &["fire"], 45),
        species(7, "squirtle", &["water"], 45),
        species(10, "caterpie", &["bug"], 255),
        species(16, "pidgey", &["normal", "flying"], 255),
        species(19, "rattata", &["normal"], 255),
        species(25, "pikachu", &["electric"], 190),
        species(37, "vulpix", &["fire"], 190),
        species(58, "growlithe", &["fire"], 190),
        species(129, "magikarp", &["water"], 255),
        species(133, "eevee", &["normal"], 45),
        species(143, "snorlax", &["normal"], 25),
    ]
}
