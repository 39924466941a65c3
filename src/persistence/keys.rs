pub const BACKPACK: &str = "@PokemonWalkApp:backpackData_v1";
pub const POKEDEX: &str = "@PokemonWalkApp:pokedexData_v1";
pub const PLAYER_STATS: &str = "@PokemonWalkApp:playerStats_v1";
pub const ACHIEVEMENT_PROGRESS: &str = "@PokemonWalkApp:achievementProgress_v1";
pub const LAST_SEEN_EVENT_ID: &str = "@PokemonWalkApp:lastSeenEventId_v1";
/// Written by the background location task, read by the tracker.
pub const BACKGROUND_ROUTE: &str = "@PokemonWalkApp:backgroundRoute_v1";
