//! Shop persistence: coins, scores and skins keyed by player id

pub mod memory;
pub mod supabase;

pub use memory::MemoryShop;
pub use supabase::{SupabaseClient, SupabaseError, SupabaseShop};

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Skin every player wears until they activate another
pub const DEFAULT_SKIN_ID: i32 = 1;

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub head_color: String,
    pub body_color: String,
    pub emoji: String,
    pub is_premium: bool,
}

/// Persistent per-player shop data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    pub player_id: String,
    pub coins: i64,
    pub total_score: i64,
    pub games_played: i64,
    pub owned_skins: Vec<i32>,
    pub active_skin: i32,
}

/// Store errors. The first four are ordinary purchase/activation
/// refusals; `Supabase` is an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Skin not found")]
    SkinNotFound,

    #[error("Skin already purchased")]
    AlreadyOwned,

    #[error("Not enough coins")]
    InsufficientCoins,

    #[error("Skin not purchased")]
    NotOwned,

    #[error("Coin or score total out of range")]
    BalanceOverflow,

    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}

/// Totals after crediting one finished game, or `BalanceOverflow`
pub fn credited_totals(
    current: (i64, i64, i64),
    coins: i64,
    score: i64,
) -> Result<(i64, i64, i64), StoreError> {
    let (balance, total_score, games_played) = current;
    Ok((
        balance.checked_add(coins).ok_or(StoreError::BalanceOverflow)?,
        total_score.checked_add(score).ok_or(StoreError::BalanceOverflow)?,
        games_played.checked_add(1).ok_or(StoreError::BalanceOverflow)?,
    ))
}

impl StoreError {
    pub fn is_rejection(&self) -> bool {
        !matches!(self, StoreError::Supabase(_))
    }
}

/// Shop store, backed by Supabase when configured and by process memory otherwise
#[derive(Clone)]
pub enum ShopStore {
    Memory(MemoryShop),
    Supabase(SupabaseShop),
}

impl ShopStore {
    pub fn from_config(config: &Config) -> Self {
        match &config.supabase {
            Some(supabase) => ShopStore::Supabase(SupabaseShop::new(SupabaseClient::new(
                &supabase.url,
                &supabase.service_role_key,
            ))),
            None => ShopStore::Memory(MemoryShop::with_default_catalog()),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            ShopStore::Memory(_) => "memory",
            ShopStore::Supabase(_) => "supabase",
        }
    }

    pub async fn get_or_create(&self, player_id: &str) -> Result<PlayerProfile, StoreError> {
        match self {
            ShopStore::Memory(shop) => Ok(shop.get_or_create(player_id)),
            ShopStore::Supabase(shop) => shop.get_or_create(player_id).await,
        }
    }

    /// Add round earnings and count one more game. Returns the new balance.
    pub async fn credit_coins_and_score(
        &self,
        player_id: &str,
        coins: i64,
        score: i64,
    ) -> Result<i64, StoreError> {
        match self {
            ShopStore::Memory(shop) => shop.credit_coins_and_score(player_id, coins, score),
            ShopStore::Supabase(shop) => shop.credit_coins_and_score(player_id, coins, score).await,
        }
    }

    /// All skins, cheapest first
    pub async fn list_skins(&self) -> Result<Vec<Skin>, StoreError> {
        match self {
            ShopStore::Memory(shop) => Ok(shop.list_skins()),
            ShopStore::Supabase(shop) => shop.list_skins().await,
        }
    }

    pub async fn purchase(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        match self {
            ShopStore::Memory(shop) => shop.purchase(player_id, skin_id),
            ShopStore::Supabase(shop) => shop.purchase(player_id, skin_id).await,
        }
    }

    pub async fn activate(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        match self {
            ShopStore::Memory(shop) => shop.activate(player_id, skin_id),
            ShopStore::Supabase(shop) => shop.activate(player_id, skin_id).await,
        }
    }
}
