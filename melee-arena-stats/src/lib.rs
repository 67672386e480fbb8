//! Client for the external users service: per-player stat updates and coin
//! grants pushed at the end of a match, with bounded retry.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub mod backoff;

pub use backoff::{retry, BackoffConfig};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("users service answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone, Debug)]
pub struct UsersServiceConfig {
    /// Master switch; a disabled publisher quietly does nothing.
    pub enabled: bool,
    /// Base address, e.g. `https://users.example.com`.
    pub address: String,
    /// Path prefix the nickname is appended to, e.g. `/v1/stats/`.
    pub stats_endpoint: String,
    /// Path with an `{id}` placeholder, e.g. `/v1/users/{id}/currencies`.
    pub currencies_endpoint: String,
    pub base_coins: i64,
    pub damage_coins: f64,
    pub kill_coins: f64,
    pub timeout: Duration,
    /// Service-to-service bearer token.
    pub token: String,
    pub backoff: BackoffConfig,
}

impl Default for UsersServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "https://users-service-medieval.herokuapp.com".to_string(),
            stats_endpoint: "/v1/stats/".to_string(),
            currencies_endpoint: "/v1/users/{id}/currencies".to_string(),
            base_coins: 50,
            damage_coins: 1.0,
            kill_coins: 75.0,
            timeout: Duration::from_secs(10),
            token: String::new(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// What one player walked away with.
#[derive(Clone, Debug)]
pub struct PlayerResult {
    pub user_id: String,
    pub nickname: String,
    /// 1 = winner; `None` if the match ended without placing the player.
    pub placement: Option<u32>,
    pub kills: u32,
    pub damage: i32,
}

#[derive(Serialize)]
struct UpdateStatsRequest {
    add_games: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    add_wins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    add_top5: Option<u32>,
    add_kills: u32,
}

#[derive(Serialize)]
struct GrantCurrenciesRequest {
    add_coins: i64,
    add_gems: i64,
}

pub struct UsersServiceClient {
    cfg: UsersServiceConfig,
    http: reqwest::Client,
}

impl UsersServiceClient {
    pub fn new(cfg: UsersServiceConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .expect("reqwest client construction only fails on TLS misconfiguration");
        Self { cfg, http }
    }

    pub fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    /// Pushes every player's results. Failures are logged per player; one
    /// unreachable record never blocks the rest.
    pub async fn publish_results(&self, results: &[PlayerResult]) {
        if !self.cfg.enabled {
            return;
        }
        for result in results {
            if let Err(error) = self.update_stats(result).await {
                log::error!("unable to update stats for \"{}\": {error}", result.nickname);
            }
            if let Err(error) = self.grant_currencies(result).await {
                log::error!(
                    "unable to grant currencies to \"{}\": {error}",
                    result.nickname
                );
            }
        }
    }

    async fn update_stats(&self, result: &PlayerResult) -> Result<(), PublishError> {
        let won = result.placement == Some(1);
        let top5 = result.placement.is_some_and(|placement| placement <= 5);
        let body = UpdateStatsRequest {
            add_games: 1,
            add_wins: won.then_some(1),
            add_top5: top5.then_some(1),
            add_kills: result.kills,
        };
        let url = format!(
            "{}{}{}",
            self.cfg.address, self.cfg.stats_endpoint, result.nickname
        );
        retry(&self.cfg.backoff, || self.send(self.http.put(&url), &body)).await
    }

    async fn grant_currencies(&self, result: &PlayerResult) -> Result<(), PublishError> {
        let coins = self.cfg.base_coins
            + (f64::from(result.damage) * self.cfg.damage_coins) as i64
            + (f64::from(result.kills) * self.cfg.kill_coins) as i64;
        let body = GrantCurrenciesRequest {
            add_coins: coins,
            add_gems: 0,
        };
        let url = format!(
            "{}{}",
            self.cfg.address,
            self.cfg.currencies_endpoint.replace("{id}", &result.user_id)
        );
        retry(&self.cfg.backoff, || self.send(self.http.post(&url), &body)).await
    }

    async fn send<T: Serialize>(
        &self,
        request: reqwest::RequestBuilder,
        body: &T,
    ) -> Result<(), PublishError> {
        let response = request
            .bearer_auth(&self.cfg.token)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PublishError::Status(response.status()));
        }
        Ok(())
    }
}
