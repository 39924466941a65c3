use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::tables::items::{ItemCatalog, POKE_BALL, RAZZ_BERRY};

/// Item quantities, in the order items were first added.
///
/// Snapshots are immutable; every change builds a new backpack. Quantities
/// are always positive, an item that runs out is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backpack {
    items: IndexMap<String, u32>,
}

impl Backpack {
    /// What a new player starts with.
    pub fn starter() -> Self {
        let mut items = IndexMap::new();
        items.insert(POKE_BALL.to_string(), 15);
        items.insert(RAZZ_BERRY.to_string(), 3);
        Self { items }
    }

    /// Rebuilds a backpack from stored pairs, dropping unknown items and
    /// non-positive quantities.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, i64)>, catalog: &ItemCatalog) -> Self {
        let mut items = IndexMap::new();
        for (id, quantity) in pairs {
            if !catalog.contains(&id) {
                warn!("Dropping unknown item {} from stored backpack", id);
                continue;
            }
            match u32::try_from(quantity) {
                Ok(quantity) if quantity > 0 => {
                    items.insert(id, quantity);
                }
                _ => debug!("Pruning {} with quantity {}", id, quantity),
            }
        }
        Self { items }
    }

    pub fn to_pairs(&self) -> Vec<(String, i64)> {
        self.items
            .iter()
            .map(|(id, quantity)| (id.clone(), i64::from(*quantity)))
            .collect()
    }

    pub fn count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.count(item_id) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, quantity)| (id.as_str(), *quantity))
    }

    /// `None` when nothing would change.
    pub fn with_added(&self, item_id: &str, quantity: u32) -> Option<Self> {
        if quantity == 0 {
            return None;
        }
        let mut next = self.clone();
        let slot = next.items.entry(item_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(quantity);
        Some(next)
    }

    /// `None` when the backpack holds fewer than `quantity`.
    pub fn with_used(&self, item_id: &str, quantity: u32) -> Option<Self> {
        let current = self.count(item_id);
        if quantity == 0 || current < quantity {
            return None;
        }
        let mut next = self.clone();
        let remaining = current - quantity;
        if remaining > 0 {
            next.items.insert(item_id.to_string(), remaining);
        } else {
            next.items.shift_remove(item_id);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::catalog;
    use std::collections::HashSet;

    #[test]
    fn test_starter_contents() {
        let backpack = Backpack::starter();
        assert_eq!(backpack.count(POKE_BALL), 15);
        assert_eq!(backpack.count(RAZZ_BERRY), 3);
        assert_eq!(backpack.len(), 2);
    }

    #[test]
    fn test_updates_leave_the_original_untouched() {
        let original = Backpack::starter();
        let added = original.with_added("greatball", 2).unwrap();
        assert_eq!(original.count("greatball"), 0);
        assert_eq!(added.count("greatball"), 2);

        let used = added.with_used(RAZZ_BERRY, 3).unwrap();
        assert!(!used.has(RAZZ_BERRY));
        assert_eq!(added.count(RAZZ_BERRY), 3);
    }

    #[test]
    fn test_cannot_use_more_than_held() {
        let backpack = Backpack::starter();
        assert!(backpack.with_used(RAZZ_BERRY, 4).is_none());
        assert!(backpack.with_used("masterball", 1).is_none());
        assert!(backpack.with_used(POKE_BALL, 0).is_none());
        assert!(backpack.with_added(POKE_BALL, 0).is_none());
    }

    #[test]
    fn test_loading_prunes_bad_entries() {
        let pairs = vec![
            ("pokeball".to_string(), 5),
            ("potion".to_string(), 0),
            ("revive".to_string(), -2),
            ("not-an-item".to_string(), 9),
            ("lucky-egg".to_string(), 1),
        ];
        let backpack = Backpack::from_pairs(pairs, catalog());
        let ids: Vec<&str> = backpack.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["pokeball", "lucky-egg"]);
    }

    #[test]
    fn test_pairs_roundtrip_preserves_contents() {
        let backpack = Backpack::starter()
            .with_added("ultraball", 4)
            .and_then(|b| b.with_added("potion", 1))
            .unwrap();
        let restored = Backpack::from_pairs(backpack.to_pairs(), catalog());

        let before: HashSet<(String, u32)> =
            backpack.iter().map(|(id, q)| (id.to_string(), q)).collect();
        let after: HashSet<(String, u32)> =
            restored.iter().map(|(id, q)| (id.to_string(), q)).collect();
        assert_eq!(before, after);
    }
}
