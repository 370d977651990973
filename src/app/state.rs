//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{SharedWorld, World};
use crate::store::ShopStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: SharedWorld,
    pub shop: ShopStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let shop = ShopStore::from_config(&config);
        Self::with_parts(config, World::new(), shop)
    }

    pub fn with_parts(config: Config, world: World, shop: ShopStore) -> Self {
        Self {
            config: Arc::new(config),
            world: SharedWorld::new(world),
            shop,
        }
    }
}
