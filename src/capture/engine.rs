use tracing::{debug, info, instrument, warn};

use crate::config::CaptureSettings;
use crate::encounter::PokemonEncounter;
use crate::error::CaptureError;
use crate::random::RandomSource;
use crate::state::player::catch_xp;
use crate::state::{CatchRecord, Collaborators, GameEvent, PokedexStatus, PokedexUpdate};
use crate::tables::{ball_modifier, berry_modifier, catalog, catch_chance, Item, LUCKY_EGG};

/// What the player collaborator is asked to credit for a catch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardRequest {
    pub is_shiny: bool,
    pub is_new_species: bool,
    pub xp_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Caught {
        reward: RewardRequest,
        record: CatchRecord,
        achievements: Vec<&'static str>,
    },
    Fled,
    /// Nothing was thrown and nothing changed.
    Rejected(CaptureError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub success: bool,
    pub message: String,
    pub outcome: CaptureOutcome,
}

impl CaptureResult {
    pub(crate) fn rejected(error: CaptureError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            outcome: CaptureOutcome::Rejected(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.outcome, CaptureOutcome::Rejected(_))
    }
}

/// One wild Pokémon being thrown at. Ends after the first resolved throw.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    encounter: PokemonEncounter,
    active_berry: Option<Item>,
    resolved: bool,
}

impl CaptureSession {
    pub fn new(encounter: PokemonEncounter) -> Self {
        Self {
            encounter,
            active_berry: None,
            resolved: false,
        }
    }

    pub fn encounter(&self) -> &PokemonEncounter {
        &self.encounter
    }

    pub fn active_berry(&self) -> Option<&Item> {
        self.active_berry.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Odds of the next throw with `ball_id`, if it is a ball.
    pub fn catch_chance(&self, ball_id: &str) -> Option<f64> {
        let ball = ball_modifier(ball_id)?;
        Some(catch_chance(
            self.encounter.pokemon_details.capture_rate,
            ball,
            berry_modifier(self.active_berry.as_ref()),
        ))
    }
}

pub struct CaptureEngine {
    settings: CaptureSettings,
    collaborators: Collaborators,
    random: Box<dyn RandomSource>,
}

impl CaptureEngine {
    pub fn new(settings: CaptureSettings, collaborators: Collaborators, random: Box<dyn RandomSource>) -> Self {
        Self {
            settings,
            collaborators,
            random,
        }
    }

    /// Feeds a berry before the next throw. The berry is consumed now and
    /// lasts for one throw.
    pub fn use_berry(&self, session: &mut CaptureSession, berry_id: &str) -> Result<(), CaptureError> {
        if session.resolved {
            return Err(CaptureError::AlreadyResolved(session.encounter.id));
        }
        let berry = catalog()
            .catch_berries()
            .find(|item| item.id == berry_id)
            .ok_or_else(|| CaptureError::UnknownBerry(berry_id.to_string()))?;
        if session.active_berry.is_some() {
            return Err(CaptureError::BerryAlreadyActive);
        }
        if !self.collaborators.inventory.use_item(berry_id, 1) {
            return Err(CaptureError::NoBerries(berry.name.clone()));
        }
        debug!("{} fed to {}", berry.name, session.encounter.pokemon_details.name);
        session.active_berry = Some(berry.clone());
        Ok(())
    }

    /// Whether `ball_id` could be thrown right now. Touches nothing.
    pub fn check_ball(&self, ball_id: &str) -> Result<(), CaptureError> {
        if ball_modifier(ball_id).is_none() {
            return Err(CaptureError::UnknownBall(ball_id.to_string()));
        }
        if self.collaborators.inventory.count(ball_id) == 0 {
            return Err(CaptureError::EmptyBag(catalog().name_of(ball_id).to_string()));
        }
        Ok(())
    }

    #[instrument(skip_all, fields(pokemon = %session.encounter.pokemon_details.name, ball = ball_id))]
    pub async fn throw_ball(&mut self, session: &mut CaptureSession, ball_id: &str) -> CaptureResult {
        if session.resolved {
            return CaptureResult::rejected(CaptureError::AlreadyResolved(session.encounter.id));
        }
        if let Err(e) = self.check_ball(ball_id) {
            return CaptureResult::rejected(e);
        }
        let Some(chance) = session.catch_chance(ball_id) else {
            return CaptureResult::rejected(CaptureError::UnknownBall(ball_id.to_string()));
        };
        if !self.collaborators.inventory.use_item(ball_id, 1) {
            return CaptureResult::rejected(CaptureError::EmptyBag(catalog().name_of(ball_id).to_string()));
        }
        session.active_berry = None;

        let success = self.random.roll() < chance;
        info!("Capture chance {:.3}, success: {}", chance, success);
        tokio::time::sleep(self.settings.resolution_delay()).await;
        session.resolved = true;

        if success {
            self.caught(session, ball_id)
        } else {
            self.fled(session)
        }
    }

    fn caught(&self, session: &mut CaptureSession, ball_id: &str) -> CaptureResult {
        let c = &self.collaborators;
        let encounter = &mut session.encounter;
        let details = &encounter.pokemon_details;
        let is_new_species = c.pokedex.status(details.id) != PokedexStatus::Caught;

        c.pokedex.update_entry(
            details.id,
            PokedexUpdate::caught(
                &details.name,
                details.sprite(encounter.is_shiny),
                encounter.is_shiny,
                ball_id,
                &details.types,
            ),
        );
        encounter.caught = true;

        let xp_multiplier = if c.inventory.has_item(LUCKY_EGG) && c.inventory.use_item(LUCKY_EGG, 1) {
            info!("Lucky Egg consumed, XP x{}", self.settings.lucky_egg_multiplier);
            self.settings.lucky_egg_multiplier
        } else {
            1.0
        };
        let reward = RewardRequest {
            is_shiny: encounter.is_shiny,
            is_new_species,
            xp_multiplier,
        };

        let record = c
            .player
            .record_pokemon_catch(reward.is_shiny, reward.is_new_species, reward.xp_multiplier);
        let achievements = c.achievements.recalculate_achievements(record.total_caught);
        c.events.emit(GameEvent::PokemonCaught {
            encounter_id: encounter.id,
            pokemon_id: details.id,
            is_shiny: encounter.is_shiny,
            xp_gained: record.xp_gained,
        });
        if xp_multiplier > 1.0 {
            let bonus_xp = record
                .xp_gained
                .saturating_sub(catch_xp(reward.is_shiny, reward.is_new_species, 1.0));
            self.notify_lucky_egg(bonus_xp);
        }

        let name = &details.name;
        CaptureResult {
            success: true,
            message: if encounter.is_shiny {
                format!("Incredible! Shiny {name} was caught!")
            } else {
                format!("Gotcha! {name} was caught!")
            },
            outcome: CaptureOutcome::Caught {
                reward,
                record,
                achievements,
            },
        }
    }

    fn fled(&self, session: &CaptureSession) -> CaptureResult {
        let encounter = &session.encounter;
        warn!("{} broke free and fled", encounter.pokemon_details.name);
        self.collaborators.events.emit(GameEvent::PokemonFled {
            encounter_id: encounter.id,
            pokemon_id: encounter.pokemon_details.id,
        });
        CaptureResult {
            success: false,
            message: format!("Oh no! The wild {} fled!", encounter.pokemon_details.name),
            outcome: CaptureOutcome::Fled,
        }
    }

    // shown after the catch notification has had its moment
    fn notify_lucky_egg(&self, bonus_xp: u64) {
        let events = self.collaborators.events.clone();
        let delay = self.settings.lucky_egg_notice_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            events.emit(GameEvent::LuckyEggUsed { bonus_xp });
        });
    }
}
