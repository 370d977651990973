//! Supabase REST API client and the shop tables behind it

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::{credited_totals, PlayerProfile, Skin, StoreError, DEFAULT_SKIN_ID};

/// Query parameters in PostgREST form, e.g. `("player_id", "eq.abc")`
pub type Query<'a> = [(&'a str, String)];

/// Supabase client for server-side database operations.
/// Uses the service_role key, which bypasses RLS.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_role_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.rest_url(table))
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SupabaseError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, SupabaseError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(SupabaseError::Parse)
    }

    /// Make an authenticated GET request expecting at most one row
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Option<T>, SupabaseError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .header("Accept", "application/vnd.pgrst.object+json")
            .query(query)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            // No rows found
            return Ok(None);
        }

        Self::check(response)
            .await?
            .json()
            .await
            .map(Some)
            .map_err(SupabaseError::Parse)
    }

    /// Make an authenticated POST request (insert)
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// Make an authenticated PATCH request (update)
    pub async fn update<T: Serialize>(
        &self,
        table: &str,
        query: &Query<'_>,
        data: &T,
    ) -> Result<(), SupabaseError> {
        let response = self
            .request(reqwest::Method::PATCH, table)
            .query(query)
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        Self::check(response).await.map(|_| ())
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, table: &str, query: &Query<'_>) -> Result<(), SupabaseError> {
        let response = self
            .request(reqwest::Method::DELETE, table)
            .query(query)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        Self::check(response).await.map(|_| ())
    }
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}

/// Row of `snake_players`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlayerRow {
    player_id: String,
    coins: i64,
    total_score: i64,
    games_played: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SkinRef {
    skin_id: i32,
}

#[derive(Debug, Serialize)]
struct OwnedSkin<'a> {
    player_id: &'a str,
    skin_id: i32,
}

const PLAYER_COLUMNS: &str = "player_id,coins,total_score,games_played";
const SKIN_COLUMNS: &str = "id,name,description,price,head_color,body_color,emoji,is_premium";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

type Params = Vec<(&'static str, String)>;

fn by_player(player_id: &str) -> Params {
    vec![("player_id", eq(player_id))]
}

fn player_query(player_id: &str) -> Params {
    vec![
        ("player_id", eq(player_id)),
        ("select", PLAYER_COLUMNS.to_string()),
    ]
}

fn skin_ids_query(player_id: &str) -> Params {
    vec![
        ("player_id", eq(player_id)),
        ("select", "skin_id".to_string()),
    ]
}

fn ownership_query(player_id: &str, skin_id: i32) -> Params {
    vec![
        ("player_id", eq(player_id)),
        ("skin_id", eq(skin_id)),
        ("select", "skin_id".to_string()),
    ]
}

fn skin_query(skin_id: i32) -> Params {
    vec![("id", eq(skin_id)), ("select", SKIN_COLUMNS.to_string())]
}

fn catalog_query() -> Params {
    vec![
        ("select", SKIN_COLUMNS.to_string()),
        ("order", "price.asc".to_string()),
    ]
}

/// Shop persistence over the `snake_*` tables
#[derive(Clone)]
pub struct SupabaseShop {
    client: SupabaseClient,
}

impl SupabaseShop {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn player_row(&self, player_id: &str) -> Result<Option<PlayerRow>, SupabaseError> {
        self.client
            .get_one("snake_players", &player_query(player_id))
            .await
    }

    async fn owns(&self, player_id: &str, skin_id: i32) -> Result<bool, SupabaseError> {
        let rows: Vec<SkinRef> = self
            .client
            .get("snake_player_skins", &ownership_query(player_id, skin_id))
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn get_or_create(&self, player_id: &str) -> Result<PlayerProfile, StoreError> {
        let row = match self.player_row(player_id).await? {
            Some(row) => row,
            None => {
                debug!(player_id, "Creating shop profile");
                self.client
                    .insert(
                        "snake_players",
                        &PlayerRow {
                            player_id: player_id.to_string(),
                            coins: 0,
                            total_score: 0,
                            games_played: 0,
                        },
                    )
                    .await?
            }
        };

        let owned: Vec<SkinRef> = self
            .client
            .get("snake_player_skins", &skin_ids_query(player_id))
            .await?;

        let active: Option<SkinRef> = self
            .client
            .get_one("snake_active_skins", &skin_ids_query(player_id))
            .await?;

        Ok(PlayerProfile {
            player_id: row.player_id,
            coins: row.coins,
            total_score: row.total_score,
            games_played: row.games_played,
            owned_skins: owned.into_iter().map(|s| s.skin_id).collect(),
            active_skin: active.map(|s| s.skin_id).unwrap_or(DEFAULT_SKIN_ID),
        })
    }

    pub async fn credit_coins_and_score(
        &self,
        player_id: &str,
        coins: i64,
        score: i64,
    ) -> Result<i64, StoreError> {
        match self.player_row(player_id).await? {
            Some(row) => {
                let (balance, total_score, games_played) = credited_totals(
                    (row.coins, row.total_score, row.games_played),
                    coins,
                    score,
                )?;
                let updated = PlayerRow {
                    coins: balance,
                    total_score,
                    games_played,
                    ..row
                };
                self.client
                    .update("snake_players", &by_player(player_id), &updated)
                    .await?;
                Ok(updated.coins)
            }
            None => {
                let row: PlayerRow = self
                    .client
                    .insert(
                        "snake_players",
                        &PlayerRow {
                            player_id: player_id.to_string(),
                            coins,
                            total_score: score,
                            games_played: 1,
                        },
                    )
                    .await?;
                Ok(row.coins)
            }
        }
    }

    pub async fn list_skins(&self) -> Result<Vec<Skin>, StoreError> {
        Ok(self
            .client
            .get("snake_skins", &catalog_query())
            .await?)
    }

    pub async fn purchase(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        let skin: Skin = self
            .client
            .get_one("snake_skins", &skin_query(skin_id))
            .await?
            .ok_or(StoreError::SkinNotFound)?;

        if self.owns(player_id, skin_id).await? {
            return Err(StoreError::AlreadyOwned);
        }

        let row = self
            .player_row(player_id)
            .await?
            .filter(|row| row.coins >= skin.price)
            .ok_or(StoreError::InsufficientCoins)?;
        let coins = row
            .coins
            .checked_sub(skin.price)
            .ok_or(StoreError::BalanceOverflow)?;

        #[derive(Serialize)]
        struct CoinsUpdate {
            coins: i64,
        }

        // Read-then-write: PostgREST has no atomic decrement without an RPC,
        // so two concurrent purchases by one player can both pass the check.
        self.client
            .update("snake_players", &by_player(player_id), &CoinsUpdate { coins })
            .await?;

        let _: SkinRef = self
            .client
            .insert("snake_player_skins", &OwnedSkin { player_id, skin_id })
            .await?;
        Ok(())
    }

    pub async fn activate(&self, player_id: &str, skin_id: i32) -> Result<(), StoreError> {
        if !self.owns(player_id, skin_id).await? {
            return Err(StoreError::NotOwned);
        }

        self.client
            .delete("snake_active_skins", &by_player(player_id))
            .await?;

        let _: SkinRef = self
            .client
            .insert("snake_active_skins", &OwnedSkin { player_id, skin_id })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn rest_url_trims_trailing_slash() {
        let client = SupabaseClient::new("https://x.supabase.co/", "key");
        assert_eq!(
            client.rest_url("snake_players"),
            "https://x.supabase.co/rest/v1/snake_players"
        );
    }

    #[test]
    fn player_filters_use_eq() {
        let params = player_query("abc");
        assert_eq!(value(&params, "player_id"), Some("eq.abc"));
        assert_eq!(value(&params, "select"), Some(PLAYER_COLUMNS));
        assert_eq!(by_player("abc"), vec![("player_id", "eq.abc".to_string())]);
    }

    #[test]
    fn ownership_filters_player_and_skin() {
        let params = ownership_query("abc", 3);
        assert_eq!(value(&params, "player_id"), Some("eq.abc"));
        assert_eq!(value(&params, "skin_id"), Some("eq.3"));
        assert_eq!(value(&params, "select"), Some("skin_id"));
    }

    #[test]
    fn catalogue_is_ordered_by_price() {
        let params = catalog_query();
        assert_eq!(value(&params, "order"), Some("price.asc"));
        assert_eq!(value(&params, "select"), Some(SKIN_COLUMNS));
        assert_eq!(value(&skin_query(7), "id"), Some("eq.7"));
    }

    #[test]
    fn rows_decode_from_postgrest_json() {
        let row: PlayerRow = serde_json::from_value(serde_json::json!({
            "player_id": "abc",
            "coins": 40,
            "total_score": 400,
            "games_played": 3
        }))
        .unwrap();
        assert_eq!(row.coins, 40);

        let skin: Skin = serde_json::from_value(serde_json::json!({
            "id": 2,
            "name": "Ocean",
            "description": "Cool blue scales",
            "price": 100,
            "head_color": "#0EA5E9",
            "body_color": "#0284C7",
            "emoji": "🌊",
            "is_premium": false
        }))
        .unwrap();
        assert_eq!(skin.price, 100);
    }
}
