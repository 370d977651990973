//! Process-local shop store, used when no database is configured

use dashmap::DashMap;
use std::sync::Arc;

use super::{credited_totals, PlayerProfile, Skin, StoreError, DEFAULT_SKIN_ID};

#[derive(Debug, Default, Clone)]
struct PlayerRecord {
    coins: i64,
    total_score: i64,
    games_played: i64,
    owned: Vec<i32>,
    active: Option<i32>,
}

impl PlayerRecord {
    fn profile(&self, player_id: &str) -> PlayerProfile {
        PlayerProfile {
            player_id: player_id.to_string(),
            coins: self.coins,
            total_score: self.total_score,
            games_played: self.games_played,
            owned_skins: self.owned.clone(),
            active_skin: self.active.unwrap_or(DEFAULT_SKIN_ID),
        }
    }
}

#[derive(Clone)]
pub struct MemoryShop {
    players: Arc<DashMap<String, PlayerRecord>>,
    /// Sorted by price
    skins: Arc<Vec<Skin>>,
}

impl MemoryShop {
    pub fn new(mut skins: Vec<Skin>) -> Self {
        skins.sort_by_key(|s| s.price);
        Self {
            players: Arc::new(DashMap::new()),
            skins: Arc::new(skins),
        }
    }

    pub fn with_default_catalog() -> Self {
        Self::new(default_catalog())
    }

    pub fn get_or_create(&self, player_id: &str) -> PlayerProfile {
        self.players
            .entry(player_id.to_string())
            .or_default()
            .profile(player_id)
    }

    /// Leaves the record untouched when any total would overflow
    pub fn credit_coins_and_score(
        &self,
        player_id: &str,
        coins: i64,
        score: i64,
    ) -> Result<i64, StoreError> {
        let mut record = self.players.entry(player_id.to_string()).or_default();
        let (balance, total_score, games_played) = credited_totals(
            (record.coins, record.total_score, record.games_played),
            coins,
            score,
        )?;
        record.coins = balance;
        record.total_score = total_score;
        record.games_played = games_played;
        Ok(balance)
    }

    pub fn list_skins(&self) -> Vec<Skin> {
        self.skins.to_vec()
    }

    pub fn purchase(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        let skin = self
            .skins
            .iter()
            .find(|s| s.id == skin_id)
            .ok_or(StoreError::SkinNotFound)?;

        let Some(mut record) = self.players.get_mut(player_id) else {
            return Err(StoreError::InsufficientCoins);
        };
        if record.owned.contains(&skin_id) {
            return Err(StoreError::AlreadyOwned);
        }
        if record.coins < skin.price {
            return Err(StoreError::InsufficientCoins);
        }

        record.coins -= skin.price;
        record.owned.push(skin_id);
        Ok(())
    }

    pub fn activate(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        let mut record = self
            .players
            .get_mut(player_id)
            .filter(|r| r.owned.contains(&skin_id))
            .ok_or(StoreError::NotOwned)?;
        record.active = Some(skin_id);
        Ok(())
    }
}

fn skin(
    id: i32,
    name: &str,
    description: &str,
    price: i64,
    colors: (&str, &str),
    emoji: &str,
    is_premium: bool,
) -> Skin {
    Skin {
        id,
        name: name.to_string(),
        description: description.to_string(),
        price,
        head_color: colors.0.to_string(),
        body_color: colors.1.to_string(),
        emoji: emoji.to_string(),
        is_premium,
    }
}

/// Catalogue served when no database is configured
pub fn default_catalog() -> Vec<Skin> {
    vec![
        skin(1, "Classic", "The original green snake", 0, ("#22C55E", "#16A34A"), "🐍", false),
        skin(2, "Ocean", "Cool blue scales", 100, ("#0EA5E9", "#0284C7"), "🌊", false),
        skin(3, "Lava", "Hot from the volcano", 250, ("#F97316", "#EA580C"), "🔥", false),
        skin(4, "Neon", "Glows in the dark", 500, ("#A855F7", "#9333EA"), "⚡", true),
        skin(5, "Golden", "For true champions", 1000, ("#F59E0B", "#D97706"), "👑", true),
    ]
}
