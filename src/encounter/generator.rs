use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::types::{Encounter, ItemEncounter, PokemonEncounter, SpawnCandidate};
use crate::config::GenerationSettings;
use crate::geo::{distance_meters, Coordinate};
use crate::pokeapi::{PokemonDataSource, PokemonDetails};
use crate::random::RandomSource;
use crate::remote::{EventConfig, RemoteConfig};
use crate::state::{EventSink, GameEvent, Inventory, PokedexLedger, PokedexUpdate};
use crate::tables::{catalog, effective_shiny_probability, findable_weights, pick_item, SHINY_CHARM};

const ITEM_FIND_QUANTITY: u32 = 1;

/// Probabilities fixed for one generation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionProbabilities {
    pub pokemon: f64,
    pub item: f64,
    pub shiny: f64,
}

impl SessionProbabilities {
    /// Remote defaults replace the configured base values; the shiny charm
    /// and the active event's multiplier are then applied to the shiny rate.
    pub fn resolve(settings: &GenerationSettings, remote: Option<&RemoteConfig>, has_shiny_charm: bool) -> Self {
        let defaults = remote.and_then(|r| r.default_probabilities.as_ref());
        let pick = |value: Option<f64>, base: f64| value.filter(|p| (0.0..=1.0).contains(p)).unwrap_or(base);

        let pokemon = pick(defaults.and_then(|d| d.pokemon_encounter_probability), settings.pokemon_probability);
        let item = pick(defaults.and_then(|d| d.item_find_probability), settings.item_probability);
        let base_shiny = pick(defaults.and_then(|d| d.shiny_probability), settings.shiny_probability);
        let event_multiplier = remote.and_then(RemoteConfig::active_event).and_then(EventConfig::shiny_multiplier);

        Self {
            pokemon,
            item,
            shiny: effective_shiny_probability(
                base_shiny,
                has_shiny_charm,
                settings.shiny_charm_multiplier,
                event_multiplier,
            ),
        }
    }
}

/// Turns a finished route into encounters.
///
/// Every `check_distance_meters` walked triggers one spawn check anchored
/// at the route point where the threshold was crossed. Leftover distance
/// carries into the next segment.
pub struct EncounterGenerator {
    settings: GenerationSettings,
    source: Arc<dyn PokemonDataSource>,
    inventory: Arc<dyn Inventory>,
    pokedex: Arc<dyn PokedexLedger>,
    events: Arc<dyn EventSink>,
    random: Box<dyn RandomSource>,
}

impl EncounterGenerator {
    pub fn new(
        settings: GenerationSettings,
        source: Arc<dyn PokemonDataSource>,
        inventory: Arc<dyn Inventory>,
        pokedex: Arc<dyn PokedexLedger>,
        events: Arc<dyn EventSink>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            settings,
            source,
            inventory,
            pokedex,
            events,
            random,
        }
    }

    #[instrument(skip_all, fields(points = route.len()))]
    pub async fn generate(&mut self, route: &[Coordinate], remote: Option<&RemoteConfig>) -> Vec<Encounter> {
        if route.len() < 2 {
            return Vec::new();
        }

        let session = SessionProbabilities::resolve(&self.settings, remote, self.inventory.has_item(SHINY_CHARM));
        let event = remote.and_then(RemoteConfig::active_event);
        info!(
            "Generating encounters: pokemon {:.3}, item {:.3}, shiny {:.6}",
            session.pokemon, session.item, session.shiny
        );

        let threshold = self.settings.check_distance_meters;
        let mut encounters = Vec::new();
        let mut since_last_check = 0.0;
        for pair in route.windows(2) {
            let segment = distance_meters(pair[0], pair[1]);
            if !segment.is_finite() {
                warn!("Skipping segment with invalid coordinates: {:?} -> {:?}", pair[0], pair[1]);
                continue;
            }
            since_last_check += segment;
            if since_last_check < threshold {
                continue;
            }
            let checks = (since_last_check / threshold).floor() as u32;
            since_last_check %= threshold;
            for _ in 0..checks {
                if let Some(encounter) = self.spawn_check(pair[1], &session, event).await {
                    encounters.push(encounter);
                }
            }
        }

        info!("Generated {} encounters", encounters.len());
        encounters
    }

    async fn spawn_check(
        &mut self,
        location: Coordinate,
        session: &SessionProbabilities,
        event: Option<&EventConfig>,
    ) -> Option<Encounter> {
        let roll = self.random.roll();
        if roll < session.item {
            self.find_item(location, event)
        } else if roll < session.item + session.pokemon {
            self.find_pokemon(location, session, event).await
        } else {
            None
        }
    }

    fn find_item(&mut self, location: Coordinate, event: Option<&EventConfig>) -> Option<Encounter> {
        let weights = findable_weights(catalog(), event.and_then(EventConfig::item_difficulties));
        let picked = pick_item(&weights, self.random.roll())?;
        let item = picked.item.clone();
        debug!("Found {} (difficulty {:.3})", item.name, picked.difficulty);

        self.inventory.add_item(&item.id, ITEM_FIND_QUANTITY);
        self.events.emit(GameEvent::ItemFound {
            item_id: item.id.clone(),
            quantity: ITEM_FIND_QUANTITY,
        });
        Some(Encounter::Item(ItemEncounter {
            id: Uuid::new_v4(),
            location,
            item_details: item,
            quantity: ITEM_FIND_QUANTITY,
        }))
    }

    async fn find_pokemon(
        &mut self,
        location: Coordinate,
        session: &SessionProbabilities,
        event: Option<&EventConfig>,
    ) -> Option<Encounter> {
        let max_attempts = self.settings.max_spawn_attempts;
        let Some((details, attempts)) = self.draw_species(event).await else {
            warn!("No pokemon accepted after {} attempts", max_attempts);
            return None;
        };

        let is_shiny = self.random.roll() < session.shiny;
        self.pokedex.update_entry(
            details.id,
            PokedexUpdate::seen(&details.name, details.sprite(is_shiny), is_shiny),
        );
        self.events.emit(GameEvent::PokemonSeen {
            pokemon_id: details.id,
            is_shiny,
        });
        if is_shiny {
            info!("Shiny {} encountered!", details.name);
        }
        debug!("Spawned {} after {} attempts", details.name, attempts);

        Some(Encounter::Pokemon(PokemonEncounter {
            id: Uuid::new_v4(),
            location,
            pokemon_details: details,
            is_shiny,
            caught: false,
        }))
    }

    /// Bounded retry over random species. A failed fetch or an event
    /// rejection each use up one attempt.
    async fn draw_species(&mut self, event: Option<&EventConfig>) -> Option<(PokemonDetails, u32)> {
        for attempt in 1..=self.settings.max_spawn_attempts {
            let id = self.random.pick_id(self.settings.dex_count);
            let details = match self.source.pokemon(id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Failed to fetch pokemon {}: {}", id, e);
                    continue;
                }
            };

            let candidate = SpawnCandidate::evaluate(details, event);
            let keep_chance = candidate.keep_chance(event, self.settings.suppress_unboosted);
            if keep_chance < 1.0 && self.random.roll() >= keep_chance {
                debug!(
                    "{} skipped by event filter (keep chance {:.2})",
                    candidate.details.name, keep_chance
                );
                continue;
            }
            return Some((candidate.details, attempt));
        }
        None
    }
}
