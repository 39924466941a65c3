use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBoosts {
    /// Type name to spawn multiplier.
    #[serde(default)]
    pub pokemon_type_rates: IndexMap<String, f64>,
    /// Item id to replacement find difficulty.
    #[serde(default)]
    pub item_find_difficulties: IndexMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny_rate_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub id: String,
    pub is_event_running: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boosts: Option<EventBoosts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_url: Option<String>,
}

impl EventConfig {
    pub fn type_rates(&self) -> Option<&IndexMap<String, f64>> {
        self.boosts
            .as_ref()
            .map(|boosts| &boosts.pokemon_type_rates)
            .filter(|rates| !rates.is_empty())
    }

    pub fn item_difficulties(&self) -> Option<&IndexMap<String, f64>> {
        self.boosts
            .as_ref()
            .map(|boosts| &boosts.item_find_difficulties)
            .filter(|map| !map.is_empty())
    }

    pub fn shiny_multiplier(&self) -> Option<f64> {
        self.boosts.as_ref().and_then(|boosts| boosts.shiny_rate_multiplier)
    }

    /// Largest multiplier among the given types, if any of them is boosted.
    pub fn boost_for_types<'a>(&self, types: impl IntoIterator<Item = &'a str>) -> Option<f64> {
        let rates = self.type_rates()?;
        types
            .into_iter()
            .filter_map(|name| {
                rates
                    .iter()
                    .find(|(boosted, _)| boosted.eq_ignore_ascii_case(name))
                    .map(|(_, rate)| *rate)
            })
            .reduce(f64::max)
    }

    /// Strongest type boost of the event, never below 1.
    pub fn max_type_boost(&self) -> f64 {
        self.type_rates()
            .into_iter()
            .flat_map(|rates| rates.values().copied())
            .fold(1.0, f64::max)
    }

    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        if self.start_date.is_some_and(|start| now < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| now >= end) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultProbabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pokemon_encounter_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_find_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default)]
    pub current_event: Option<EventConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_probabilities: Option<DefaultProbabilities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_listing_ids: Option<Vec<String>>,
}

impl RemoteConfig {
    /// Clears `is_event_running` when `now` falls outside the event window.
    pub fn validated(mut self, now: DateTime<Utc>) -> Self {
        if let Some(event) = self.current_event.as_mut() {
            if event.is_event_running && !event.is_within_window(now) {
                debug!("Event {} is outside its window", event.id);
                event.is_event_running = false;
            }
        }
        self
    }

    pub fn active_event(&self) -> Option<&EventConfig> {
        self.current_event
            .as_ref()
            .filter(|event| event.is_event_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "currentEvent": {
            "id": "fire-week",
            "isEventRunning": true,
            "title": "Fire Week",
            "description": "More fire types",
            "startDate": "2026-10-01T00:00:00Z",
            "endDate": "2026-10-08T00:00:00Z",
            "boosts": {
                "pokemonTypeRates": { "fire": 3.0, "dragon": 2.0 },
                "itemFindDifficulties": { "pokeball": 0.5 },
                "shinyRateMultiplier": 2
            }
        },
        "defaultProbabilities": { "pokemonEncounterProbability": 0.4 },
        "shopListingIds": ["pokeball", "greatball"]
    }"#;

    fn sample() -> RemoteConfig {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parses_camel_case_payload() {
        let config = sample();
        let event = config.current_event.as_ref().unwrap();
        assert_eq!(event.id, "fire-week");
        assert_eq!(event.shiny_multiplier(), Some(2.0));
        assert_eq!(event.max_type_boost(), 3.0);
        assert_eq!(
            config.default_probabilities.unwrap().pokemon_encounter_probability,
            Some(0.4)
        );
    }

    #[test]
    fn test_validation_flips_running_flag_outside_window() {
        let inside = Utc.with_ymd_and_hms(2026, 10, 3, 12, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2026, 9, 30, 0, 0, 0).unwrap();
        let at_end = Utc.with_ymd_and_hms(2026, 10, 8, 0, 0, 0).unwrap();

        assert!(sample().validated(inside).active_event().is_some());
        assert!(sample().validated(before).active_event().is_none());
        assert!(sample().validated(at_end).active_event().is_none());
    }

    #[test]
    fn test_boost_for_types_takes_the_largest_match() {
        let config = sample();
        let event = config.current_event.unwrap();
        assert_eq!(event.boost_for_types(["Fire"]), Some(3.0));
        assert_eq!(event.boost_for_types(["dragon", "fire"]), Some(3.0));
        assert_eq!(event.boost_for_types(["water"]), None);
    }

    #[test]
    fn test_event_without_boosts() {
        let event = EventConfig {
            id: "quiet".into(),
            is_event_running: true,
            title: String::new(),
            description: String::new(),
            image_url: None,
            start_date: None,
            end_date: None,
            boosts: None,
            badge_url: None,
        };
        assert!(event.type_rates().is_none());
        assert_eq!(event.max_type_boost(), 1.0);
        assert!(event.is_within_window(Utc::now()));
    }
}
