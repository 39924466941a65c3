use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ShopError;
use crate::remote::RemoteConfig;
use crate::state::{EventSink, GameEvent, Inventory};
use crate::tables::{catalog, Item, POKE_COIN};

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseResult {
    pub success: bool,
    pub message: String,
    pub error: Option<ShopError>,
}

impl PurchaseResult {
    fn failed(error: ShopError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            error: Some(error),
        }
    }
}

/// Sells catalog items for poke coins.
pub struct Shop {
    inventory: Arc<dyn Inventory>,
    events: Arc<dyn EventSink>,
}

impl Shop {
    pub fn new(inventory: Arc<dyn Inventory>, events: Arc<dyn EventSink>) -> Self {
        Self { inventory, events }
    }

    /// Priced items on sale, narrowed to the remote listing when one is set.
    pub fn listing(remote: Option<&RemoteConfig>) -> Vec<&'static Item> {
        let listed = remote.and_then(|config| config.shop_listing_ids.as_ref());
        catalog()
            .iter()
            .filter(|item| item.price.is_some())
            .filter(|item| listed.is_none_or(|ids| ids.iter().any(|id| *id == item.id)))
            .collect()
    }

    pub fn balance(&self) -> u32 {
        self.inventory.count(POKE_COIN)
    }

    /// Buys `quantity` of `item_id`. A failed purchase leaves the backpack
    /// untouched.
    pub fn purchase(&self, item_id: &str, quantity: u32) -> PurchaseResult {
        match self.try_purchase(item_id, quantity) {
            Ok(cost) => {
                let name = catalog().name_of(item_id);
                info!("Purchased {} x{} for {} coins", name, quantity, cost);
                self.events.emit(GameEvent::ItemPurchased {
                    item_id: item_id.to_string(),
                    quantity,
                    cost,
                });
                PurchaseResult {
                    success: true,
                    message: format!("Bought {} {}!", quantity, name),
                    error: None,
                }
            }
            Err(e) => {
                warn!("Purchase of {} failed: {}", item_id, e);
                PurchaseResult::failed(e)
            }
        }
    }

    fn try_purchase(&self, item_id: &str, quantity: u32) -> Result<u32, ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity);
        }
        let price = catalog()
            .get(item_id)
            .and_then(|item| item.price)
            .ok_or_else(|| ShopError::NotForSale(item_id.to_string()))?;
        let cost = price.saturating_mul(quantity);

        let available = self.balance();
        if available < cost || !self.inventory.use_item(POKE_COIN, cost) {
            return Err(ShopError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        self.inventory.add_item(item_id, quantity);
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteConfig;
    use crate::state::GameStore;
    use crate::tables::{GREAT_BALL, MASTER_BALL, POKE_BALL, RAZZ_BERRY};

    fn shop(coins: u32) -> (Arc<GameStore>, Shop) {
        let store = Arc::new(GameStore::new());
        if coins > 0 {
            store.add_item(POKE_COIN, coins);
        }
        let shop = Shop::new(store.clone(), store.clone());
        (store, shop)
    }

    #[tokio::test]
    async fn test_purchase_spends_coins() {
        let (store, shop) = shop(1000);
        let mut events = store.subscribe_events();

        let result = shop.purchase(GREAT_BALL, 3);
        assert!(result.success);
        assert_eq!(store.count(GREAT_BALL), 3);
        assert_eq!(shop.balance(), 100);
        assert_eq!(
            events.try_recv().unwrap(),
            GameEvent::ItemPurchased {
                item_id: GREAT_BALL.to_string(),
                quantity: 3,
                cost: 900,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_purchase_mutates_nothing() {
        let (store, shop) = shop(250);
        let before = store.backpack();

        let result = shop.purchase(POKE_BALL, 3);
        assert!(!result.success);
        assert_eq!(
            result.error,
            Some(ShopError::InsufficientFunds {
                needed: 300,
                available: 250
            })
        );
        assert_eq!(shop.purchase(MASTER_BALL, 1).error, Some(ShopError::NotForSale(MASTER_BALL.to_string())));
        assert_eq!(shop.purchase(POKE_BALL, 0).error, Some(ShopError::InvalidQuantity));
        assert_eq!(store.backpack(), before);
    }

    #[test]
    fn test_listing_honors_remote_ids() {
        let all = Shop::listing(None);
        assert!(all.iter().all(|item| item.price.is_some()));
        assert!(all.iter().any(|item| item.id == POKE_BALL));

        let remote = RemoteConfig {
            shop_listing_ids: Some(vec![RAZZ_BERRY.to_string(), MASTER_BALL.to_string()]),
            ..RemoteConfig::default()
        };
        let listed: Vec<&str> = Shop::listing(Some(&remote)).iter().map(|item| item.id.as_str()).collect();
        assert_eq!(listed, vec![RAZZ_BERRY]);
    }
}
