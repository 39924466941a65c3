use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::summary::WalkSummary;
use crate::capture::{CaptureEngine, CaptureResult, CaptureSession};
use crate::config::{Configuration, StrategyPreference, WalkSettings};
use crate::encounter::{Encounter, EncounterGenerator};
use crate::error::{AppError, CaptureError, WalkError};
use crate::geo::{route_distance, Coordinate};
use crate::pokeapi::PokemonDataSource;
use crate::random::{seeded, RandomSource};
use crate::remote::RemoteConfigService;
use crate::state::{Collaborators, EventSink, GameEvent, GameStore, PlayerLedger};
use crate::tracking::{
    select_strategy, AppState, BackgroundSupport, LocationProvider, LocationTracker, PermissionProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Idle,
    Walking,
    Processing,
}

/// Keeps the walk in `Processing` and returns it to `Idle` when dropped,
/// including when a `stop_walk` future is cancelled mid-generation.
struct ProcessingGuard<'a> {
    state: &'a mut WalkState,
}

impl<'a> ProcessingGuard<'a> {
    fn enter(state: &'a mut WalkState) -> Self {
        *state = WalkState::Processing;
        Self { state }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        *self.state = WalkState::Idle;
    }
}

/// Drives one walk at a time: tracking, then generation, then the summary
/// the player works through.
pub struct WalkOrchestrator {
    settings: WalkSettings,
    state: WalkState,
    tracker: LocationTracker,
    generator: EncounterGenerator,
    capture: CaptureEngine,
    remote: Option<Arc<RemoteConfigService>>,
    player: Arc<dyn PlayerLedger>,
    events: Arc<dyn EventSink>,
    summary: Option<WalkSummary>,
    summary_signal: watch::Sender<u64>,
}

impl WalkOrchestrator {
    pub fn builder(configuration: Configuration) -> WalkOrchestratorBuilder {
        WalkOrchestratorBuilder::new(configuration)
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn is_walking(&self) -> bool {
        self.state == WalkState::Walking
    }

    pub fn current_location(&self) -> Option<Coordinate> {
        self.tracker.current_location()
    }

    /// The live route while walking, otherwise the last summary's route.
    pub fn route_for_map(&self) -> Vec<Coordinate> {
        if self.is_walking() {
            self.tracker.route()
        } else {
            self.summary.as_ref().map(|s| s.route.clone()).unwrap_or_default()
        }
    }

    pub fn summary(&self) -> Option<&WalkSummary> {
        self.summary.as_ref()
    }

    /// Counter bumped each time a summary is worth showing.
    pub fn summary_signal(&self) -> watch::Receiver<u64> {
        self.summary_signal.subscribe()
    }

    pub fn tracker(&self) -> &LocationTracker {
        &self.tracker
    }

    #[instrument(skip(self))]
    pub async fn start_walk(&mut self) -> Result<(), WalkError> {
        if self.state != WalkState::Idle {
            return Err(WalkError::InvalidTransition {
                action: "start a walk",
                state: self.state,
            });
        }
        self.summary = None;
        self.summary_signal.send_replace(0);
        self.tracker.start().await?;
        self.state = WalkState::Walking;
        info!("Walk started");
        Ok(())
    }

    /// Ends the walk and builds its summary. Generation problems only make
    /// the summary smaller; they never fail the call.
    #[instrument(skip(self))]
    pub async fn stop_walk(&mut self) -> Result<&WalkSummary, WalkError> {
        if self.state != WalkState::Walking {
            return Err(WalkError::InvalidTransition {
                action: "stop a walk",
                state: self.state,
            });
        }
        let route = self.tracker.stop().await;
        let (encounters, distance) = {
            let _processing = ProcessingGuard::enter(&mut self.state);
            info!("Processing walk with {} points", route.len());

            let remote = match &self.remote {
                Some(service) => service.get(false).await,
                None => None,
            };
            let encounters = self.generator.generate(&route, remote.as_ref()).await;

            let distance = route_distance(&route);
            if route.len() > 1 {
                info!("Total distance walked: {:.2} meters", distance);
                self.player.add_distance_walked(distance);
            }
            (encounters, distance)
        };

        let encounter_count = encounters.len();
        if encounter_count > 0 || distance > self.settings.summary_min_distance_meters {
            self.summary_signal.send_modify(|signal| *signal += 1);
            self.events.emit(GameEvent::SummaryReady {
                encounters: encounter_count,
                distance_meters: distance,
            });
        } else {
            debug!("Nothing worth showing, summary stays quiet");
        }
        Ok(&*self.summary.insert(WalkSummary::new(route, encounters, distance)))
    }

    pub fn mark_encounter_as_caught(&mut self, id: Uuid) -> bool {
        self.summary.as_mut().is_some_and(|s| s.mark_caught(id))
    }

    pub fn remove_encounter_from_summary(&mut self, id: Uuid) -> bool {
        let removed = self.summary.as_mut().is_some_and(|s| s.remove(id));
        if removed {
            debug!("Removed encounter {} from summary", id);
        }
        removed
    }

    /// Throws `ball_id` at a Pokémon from the current summary, feeding
    /// `berry_id` first if given. A catch marks the encounter; an escape
    /// removes it.
    pub async fn attempt_capture(&mut self, encounter_id: Uuid, ball_id: &str, berry_id: Option<&str>) -> CaptureResult {
        let encounter = self
            .summary
            .as_ref()
            .and_then(|s| s.get(encounter_id))
            .and_then(Encounter::as_pokemon)
            .cloned();
        let Some(encounter) = encounter else {
            return CaptureResult::rejected(CaptureError::EncounterNotFound(encounter_id));
        };
        if encounter.caught {
            return CaptureResult::rejected(CaptureError::AlreadyResolved(encounter_id));
        }

        // the berry is only fed once the throw is known to be possible
        if let Err(e) = self.capture.check_ball(ball_id) {
            return CaptureResult::rejected(e);
        }
        let mut session = CaptureSession::new(encounter);
        if let Some(berry_id) = berry_id {
            if let Err(e) = self.capture.use_berry(&mut session, berry_id) {
                return CaptureResult::rejected(e);
            }
        }
        let result = self.capture.throw_ball(&mut session, ball_id).await;
        if result.is_terminal() {
            if result.success {
                self.mark_encounter_as_caught(encounter_id);
            } else {
                self.remove_encounter_from_summary(encounter_id);
            }
        }
        result
    }

    pub async fn app_state_changed(&mut self, state: AppState) {
        self.tracker.app_state_changed(state).await;
    }

    pub async fn sync_route(&mut self) {
        self.tracker.sync().await;
    }
}

pub struct WalkOrchestratorBuilder {
    configuration: Configuration,
    store: Option<Arc<GameStore>>,
    pokemon_source: Option<Arc<dyn PokemonDataSource>>,
    location_provider: Option<Arc<dyn LocationProvider>>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    background: Option<BackgroundSupport>,
    remote: Option<Arc<RemoteConfigService>>,
    seed: Option<u64>,
    random: Option<(Box<dyn RandomSource>, Box<dyn RandomSource>)>,
}

impl WalkOrchestratorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            store: None,
            pokemon_source: None,
            location_provider: None,
            permissions: None,
            background: None,
            remote: None,
            seed: None,
            random: None,
        }
    }

    // Sets the distance between spawn checks, this will override the default configuration.
    pub fn check_distance_meters(mut self, meters: f64) -> Self {
        self.configuration.generation.check_distance_meters = meters;
        self
    }

    pub fn pokemon_probability(mut self, probability: f64) -> Self {
        self.configuration.generation.pokemon_probability = probability;
        self
    }

    pub fn item_probability(mut self, probability: f64) -> Self {
        self.configuration.generation.item_probability = probability;
        self
    }

    pub fn dex_count(mut self, dex_count: u32) -> Self {
        self.configuration.generation.dex_count = dex_count;
        self
    }

    // Sets the pause before a capture verdict, this will override the default configuration.
    pub fn resolution_delay_ms(mut self, delay_ms: u64) -> Self {
        self.configuration.capture.resolution_delay_ms = delay_ms;
        self
    }

    pub fn tracking_strategy(mut self, strategy: StrategyPreference) -> Self {
        self.configuration.tracking.strategy = strategy;
        self
    }

    pub fn store(mut self, store: Arc<GameStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn pokemon_source(mut self, source: Arc<dyn PokemonDataSource>) -> Self {
        self.pokemon_source = Some(source);
        self
    }

    pub fn location_provider(mut self, provider: Arc<dyn LocationProvider>) -> Self {
        self.location_provider = Some(provider);
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn background(mut self, support: BackgroundSupport) -> Self {
        self.background = Some(support);
        self
    }

    pub fn remote_config(mut self, service: Arc<RemoteConfigService>) -> Self {
        self.remote = Some(service);
        self
    }

    // Makes generation and capture repeatable.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random sources for generation and capture, replacing any seed.
    pub fn random_sources(mut self, generation: Box<dyn RandomSource>, capture: Box<dyn RandomSource>) -> Self {
        self.random = Some((generation, capture));
        self
    }

    pub fn build(self) -> Result<WalkOrchestrator, AppError> {
        self.configuration.validate()?;
        let store = self.store.ok_or(AppError::MissingComponent("game store"))?;
        let source = self
            .pokemon_source
            .ok_or(AppError::MissingComponent("pokemon data source"))?;
        let provider = self
            .location_provider
            .ok_or(AppError::MissingComponent("location provider"))?;
        let permissions = self
            .permissions
            .ok_or(AppError::MissingComponent("permission provider"))?;

        let (generation_random, capture_random) = match self.random {
            Some(sources) => sources,
            None => (
                Box::new(seeded(self.seed)) as Box<dyn RandomSource>,
                Box::new(seeded(self.seed.map(|s| s.wrapping_add(1)))) as Box<dyn RandomSource>,
            ),
        };

        let configuration = self.configuration;
        let collaborators = Collaborators::from_store(store);
        let strategy = select_strategy(&configuration.tracking, provider, self.background);
        let generator = EncounterGenerator::new(
            configuration.generation,
            source,
            collaborators.inventory.clone(),
            collaborators.pokedex.clone(),
            collaborators.events.clone(),
            generation_random,
        );

        Ok(WalkOrchestrator {
            settings: configuration.walk,
            state: WalkState::Idle,
            tracker: LocationTracker::new(permissions, strategy),
            player: collaborators.player.clone(),
            events: collaborators.events.clone(),
            capture: CaptureEngine::new(configuration.capture, collaborators, capture_random),
            generator,
            remote: self.remote,
            summary: None,
            summary_signal: watch::Sender::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::TrackingError;
    use crate::pokeapi::{species, InMemoryPokemonSource};
    use crate::random::ScriptedRandom;
    use crate::remote::{EventBoosts, EventConfig, RemoteConfig, StaticConfigSource};
    use crate::state::Inventory;
    use crate::tables::{POKE_BALL, RAZZ_BERRY, ULTRA_BALL};
    use crate::tracking::{SimulatedLocationProvider, StaticPermissions};
    use indexmap::IndexMap;

    const STEP: Duration = Duration::from_secs(5);

    fn line(points: usize, spacing: f64) -> Vec<Coordinate> {
        let degrees_per_meter = 1.0 / 111_194.93;
        (0..points)
            .map(|i| Coordinate::new(0.0, i as f64 * spacing * degrees_per_meter))
            .collect()
    }

    fn builder(store: &Arc<GameStore>, route: Vec<Coordinate>) -> WalkOrchestratorBuilder {
        WalkOrchestrator::builder(Configuration::default())
            .store(store.clone())
            .pokemon_source(Arc::new(InMemoryPokemonSource::new(vec![species(
                1,
                "bulbasaur",
                &["grass", "poison"],
                45,
            )])))
            .location_provider(Arc::new(SimulatedLocationProvider::new(route, STEP)))
            .permissions(Arc::new(StaticPermissions::granted()))
            .tracking_strategy(StrategyPreference::Watch)
            .item_probability(0.0)
            .pokemon_probability(1.0)
            .dex_count(1)
    }

    async fn walk(orchestrator: &mut WalkOrchestrator, points: usize) {
        orchestrator.start_walk().await.unwrap();
        tokio::time::sleep(STEP * points as u32 + Duration::from_secs(1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_walk_produces_summary() {
        let store = Arc::new(GameStore::new());
        let mut events = store.subscribe_events();
        let route = line(5, 25.5);
        let mut orchestrator = builder(&store, route.clone()).seed(3).build().unwrap();
        let mut signal = orchestrator.summary_signal();

        walk(&mut orchestrator, 5).await;
        assert!(orchestrator.is_walking());
        assert_eq!(orchestrator.route_for_map().len(), 5);

        let summary = orchestrator.stop_walk().await.unwrap();
        assert_eq!(summary.route, route);
        assert_eq!(summary.encounters.len(), 2);
        let expected = route_distance(&route);
        assert!((summary.distance_meters - expected).abs() < 1e-9);
        assert_eq!(orchestrator.state(), WalkState::Idle);

        assert!((store.player().total_distance_walked - expected).abs() < 1e-9);
        assert!(signal.has_changed().unwrap());
        assert_eq!(*signal.borrow_and_update(), 1);

        let emitted: Vec<GameEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert!(emitted
            .iter()
            .any(|e| matches!(e, GameEvent::SummaryReady { encounters: 2, .. })));
        assert_eq!(orchestrator.route_for_map(), route);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_outside_their_state_are_rejected() {
        let store = Arc::new(GameStore::new());
        let mut orchestrator = builder(&store, line(2, 10.0)).build().unwrap();

        assert!(matches!(
            orchestrator.stop_walk().await,
            Err(WalkError::InvalidTransition {
                state: WalkState::Idle,
                ..
            })
        ));
        orchestrator.start_walk().await.unwrap();
        assert!(matches!(
            orchestrator.start_walk().await,
            Err(WalkError::InvalidTransition {
                state: WalkState::Walking,
                ..
            })
        ));
        orchestrator.stop_walk().await.unwrap();
        assert!(!orchestrator.mark_encounter_as_caught(Uuid::new_v4()));
        assert!(!orchestrator.remove_encounter_from_summary(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_permission_denied_keeps_idle() {
        let store = Arc::new(GameStore::new());
        let mut orchestrator = builder(&store, line(2, 10.0))
            .permissions(Arc::new(StaticPermissions::denied()))
            .build()
            .unwrap();
        assert!(matches!(
            orchestrator.start_walk().await,
            Err(WalkError::Tracking(TrackingError::PermissionDenied))
        ));
        assert_eq!(orchestrator.state(), WalkState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trivial_walk_stays_quiet() {
        let store = Arc::new(GameStore::new());
        let mut orchestrator = builder(&store, line(1, 0.0)).build().unwrap();
        let signal = orchestrator.summary_signal();

        walk(&mut orchestrator, 1).await;
        let summary = orchestrator.stop_walk().await.unwrap();
        assert!(summary.encounters.is_empty());
        assert_eq!(summary.route.len(), 1);
        assert!(!signal.has_changed().unwrap());
        assert_eq!(store.player().total_distance_walked, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_outcomes_update_summary() {
        let store = Arc::new(GameStore::new());
        // generation: check roll and shiny roll for each of two checks
        let generation = ScriptedRandom::new([0.5, 0.9, 0.5, 0.9], []);
        let capture = ScriptedRandom::new([0.0, 0.99], []);
        let mut orchestrator = builder(&store, line(5, 25.5))
            .random_sources(Box::new(generation), Box::new(capture))
            .build()
            .unwrap();

        walk(&mut orchestrator, 5).await;
        let ids: Vec<Uuid> = orchestrator.stop_walk().await.unwrap().encounters.iter().map(Encounter::id).collect();
        assert_eq!(ids.len(), 2);

        let caught = orchestrator.attempt_capture(ids[0], POKE_BALL, None).await;
        assert!(caught.success);
        assert!(orchestrator.summary().unwrap().get(ids[0]).unwrap().is_caught());
        let again = orchestrator.attempt_capture(ids[0], POKE_BALL, None).await;
        assert_eq!(again.outcome, crate::capture::CaptureOutcome::Rejected(CaptureError::AlreadyResolved(ids[0])));

        let empty = orchestrator.attempt_capture(ids[1], ULTRA_BALL, None).await;
        assert!(!empty.success);
        assert!(orchestrator.summary().unwrap().get(ids[1]).is_some());

        let fled = orchestrator.attempt_capture(ids[1], POKE_BALL, None).await;
        assert!(!fled.success);
        assert!(orchestrator.summary().unwrap().get(ids[1]).is_none());
        assert_eq!(store.count(POKE_BALL), 13);

        let missing = orchestrator.attempt_capture(ids[1], POKE_BALL, None).await;
        assert_eq!(
            missing.outcome,
            crate::capture::CaptureOutcome::Rejected(CaptureError::EncounterNotFound(ids[1]))
        );
    }

    struct StalledSource;

    #[async_trait::async_trait]
    impl PokemonDataSource for StalledSource {
        async fn pokemon(&self, _id: u32) -> Result<crate::pokeapi::PokemonDetails, crate::error::DataFetchError> {
            std::future::pending().await
        }

        async fn species_list(
            &self,
            _limit: u32,
        ) -> Result<Vec<crate::pokeapi::SpeciesInfo>, crate::error::DataFetchError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_stop_returns_to_idle() {
        let store = Arc::new(GameStore::new());
        let mut orchestrator = builder(&store, line(2, 60.0))
            .pokemon_source(Arc::new(StalledSource))
            .build()
            .unwrap();

        walk(&mut orchestrator, 2).await;
        let timed_out = tokio::time::timeout(Duration::from_secs(30), orchestrator.stop_walk())
            .await
            .is_err();
        assert!(timed_out);
        assert_eq!(orchestrator.state(), WalkState::Idle);
        assert!(orchestrator.summary().is_none());
        assert!(orchestrator.start_walk().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_bag_keeps_the_berry() {
        let store = Arc::new(GameStore::new());
        let generation = ScriptedRandom::new([0.5, 0.9], []);
        let mut orchestrator = builder(&store, line(2, 60.0))
            .random_sources(Box::new(generation), Box::new(ScriptedRandom::new([], [])))
            .build()
            .unwrap();

        walk(&mut orchestrator, 2).await;
        let id = orchestrator.stop_walk().await.unwrap().encounters[0].id();
        let before = store.backpack();

        let result = orchestrator.attempt_capture(id, ULTRA_BALL, Some(RAZZ_BERRY)).await;
        assert!(!result.success);
        assert_eq!(
            result.outcome,
            crate::capture::CaptureOutcome::Rejected(CaptureError::EmptyBag("Ultra Ball".to_string()))
        );
        assert_eq!(store.backpack(), before);
        assert_eq!(store.count(RAZZ_BERRY), 3);
        assert!(orchestrator.summary().unwrap().get(id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_event_shapes_generation() {
        let store = Arc::new(GameStore::new());
        let mut difficulties = IndexMap::new();
        difficulties.insert(ULTRA_BALL.to_string(), 8.0);
        let remote = RemoteConfig {
            current_event: Some(EventConfig {
                id: "ultra-hunt".into(),
                is_event_running: true,
                boosts: Some(EventBoosts {
                    item_find_difficulties: difficulties,
                    ..EventBoosts::default()
                }),
                ..EventConfig::default()
            }),
            ..RemoteConfig::default()
        };
        let service = Arc::new(RemoteConfigService::new(
            Arc::new(StaticConfigSource::new(Some(remote))),
            Duration::from_secs(300),
        ));
        // spawn roll then item pick for each of two checks
        let generation = ScriptedRandom::new([0.1, 0.5, 0.1, 0.5], []);
        let mut orchestrator = builder(&store, line(3, 60.0))
            .item_probability(1.0)
            .pokemon_probability(0.0)
            .remote_config(service)
            .random_sources(Box::new(generation), Box::new(ScriptedRandom::new([], [])))
            .build()
            .unwrap();

        walk(&mut orchestrator, 3).await;
        let summary = orchestrator.stop_walk().await.unwrap();
        assert_eq!(summary.items().count(), 2);
        assert!(summary.items().all(|i| i.item_details.id == ULTRA_BALL));
        assert_eq!(store.count(ULTRA_BALL), 2);
    }

    #[test]
    fn test_build_requires_components() {
        let result = WalkOrchestrator::builder(Configuration::default()).build();
        assert!(matches!(result, Err(AppError::MissingComponent("game store"))));

        let store = Arc::new(GameStore::new());
        let result = builder(&store, Vec::new()).check_distance_meters(0.0).build();
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
