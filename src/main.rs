use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pokewalk_core::config::StrategyPreference;
use pokewalk_core::error::AppError;
use pokewalk_core::geo::Coordinate;
use pokewalk_core::persistence::{flush, FileStorage, MemoryStorage, PersistenceObserver, StorageBackend};
use pokewalk_core::pokeapi::{starter_roster, CachedPokemonSource, InMemoryPokemonSource};
use pokewalk_core::remote::{EventAnnouncer, JsonFileSource, RemoteConfigService};
use pokewalk_core::tables::POKE_BALL;
use pokewalk_core::tracking::{SimulatedLocationProvider, StaticPermissions};
use pokewalk_core::{Configuration, GameStore, Shop, WalkOrchestrator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_POINTS: usize = 40;
const DEMO_SPACING_DEGREES: f64 = 0.000_15;
const DEMO_STEP: Duration = Duration::from_millis(100);

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn demo_route() -> Vec<Coordinate> {
    (0..DEMO_POINTS)
        .map(|i| Coordinate::new(48.8566, 2.3522 + i as f64 * DEMO_SPACING_DEGREES))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;

    let storage: Arc<dyn StorageBackend> = match &configuration.persistence.data_dir {
        Some(dir) => Arc::new(FileStorage::new(dir)),
        None => Arc::new(MemoryStorage::new()),
    };
    let store = Arc::new(GameStore::load(storage.as_ref()).await);
    let source = Arc::new(CachedPokemonSource::new(InMemoryPokemonSource::new(starter_roster())));
    if let Err(e) = store
        .seed_pokedex(source.as_ref(), configuration.generation.dex_count)
        .await
    {
        warn!("Failed to seed pokedex: {}", e);
    }
    let observer = PersistenceObserver::attach(&store, storage.clone(), configuration.persistence.debounce());

    let remote = configuration.remote.config_path.as_ref().map(|path| {
        Arc::new(RemoteConfigService::new(
            Arc::new(JsonFileSource::new(path)),
            configuration.remote.cache_ttl(),
        ))
    });
    if let Some(service) = &remote {
        let mut announcer = EventAnnouncer::load(storage.clone()).await;
        if let Some(event) = service.active_event().await {
            if announcer.should_announce(Some(&event)) {
                info!("New event: {} - {}", event.title, event.description);
                announcer.mark_seen(&event).await;
            }
        }
    }

    let mut builder = WalkOrchestrator::builder(configuration.clone())
        .store(store.clone())
        .pokemon_source(source)
        .location_provider(Arc::new(SimulatedLocationProvider::new(demo_route(), DEMO_STEP)))
        .permissions(Arc::new(StaticPermissions::granted()))
        .tracking_strategy(StrategyPreference::Watch);
    if let Some(service) = remote.clone() {
        builder = builder.remote_config(service);
    }
    let mut orchestrator = builder.build()?;

    orchestrator.start_walk().await?;
    tokio::time::sleep(DEMO_STEP * (DEMO_POINTS as u32 + 1)).await;
    let summary = orchestrator.stop_walk().await?.clone();
    info!(
        "Walked {:.0} m, {} pokemon and {} items found",
        summary.distance_meters,
        summary.pokemon().count(),
        summary.items().count()
    );

    for pokemon in summary.pokemon() {
        let result = orchestrator.attempt_capture(pokemon.id, POKE_BALL, None).await;
        info!("{}: {}", pokemon.pokemon_details.name, result.message);
    }

    let shop = Shop::new(store.clone(), store.clone());
    let remote_config = match &remote {
        Some(service) => service.get(false).await,
        None => None,
    };
    let listing = Shop::listing(remote_config.as_ref());
    info!("Shop has {} items, balance {} coins", listing.len(), shop.balance());

    let player = store.player();
    info!(
        "Player level {} with {} xp, {} caught",
        player.level, player.current_xp, player.total_pokemon_caught
    );

    observer.shutdown();
    flush(&store, storage.as_ref()).await?;
    Ok(())
}
