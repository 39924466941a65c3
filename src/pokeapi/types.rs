use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStat {
    pub name: String,
    pub base_stat: u32,
    pub effort: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonDetails {
    pub id: u32,
    pub name: String,
    /// Lowercase type names in slot order.
    pub types: Vec<String>,
    pub sprites: Sprites,
    /// 0..=255, lower is harder to catch.
    pub capture_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<BaseStat>>,
}

impl PokemonDetails {
    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(type_name))
    }

    pub fn sprite(&self, shiny: bool) -> Option<&str> {
        if shiny {
            self.sprites.front_shiny.as_deref()
        } else {
            self.sprites.front_default.as_deref()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub name: String,
    pub url: String,
}

impl SpeciesInfo {
    pub fn id(&self) -> Option<u32> {
        species_id_from_url(&self.url)
    }
}

/// Extracts the trailing numeric id from `.../pokemon-species/25/`.
pub fn species_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
