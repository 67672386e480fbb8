//! The matchmaker: a FIFO queue of waiting players, a periodic lobby packer
//! that reserves a game server per formed lobby, and idempotent
//! query/cancel operations, all fronted by a small JSON API.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::select;
use tokio::time::interval;
use uuid::Uuid;

pub mod allocator;
pub mod api;
pub mod auth;
pub mod cache;

#[cfg(test)]
mod testing;

pub use allocator::{Allocator, AllocationError, Endpoint, HttpAllocator, StaticAllocator};
pub use auth::{AuthError, GameClaims, TokenValidator};
pub use cache::{spawn_sweeper, TtlCache};

const USER_PREFIX: &str = "user|";
const MATCH_PREFIX: &str = "match|";

#[derive(Clone, Debug)]
pub struct MatchmakerConfig {
    /// Players per match.
    pub lobby_size: usize,
    /// Packer tick interval.
    pub matchmaking_delay: Duration,
    /// TTL on every cache record a formed (or failed) match writes.
    pub match_keep: Duration,
}

impl Default for MatchmakerConfig {
    fn default() -> Self {
        Self {
            lobby_size: 2,
            matchmaking_delay: Duration::from_secs(2),
            match_keep: Duration::from_secs(600),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerData {
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchData {
    pub ip: String,
    pub port: u16,
    pub players: Vec<PlayerData>,
}

/// Where a queued user ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAssignment {
    /// Key of the match record the user was placed into.
    Match(String),
    /// The allocator failed for the user's lobby.
    NoMatchHappened,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEntry {
    Assignment(UserAssignment),
    Match(MatchData),
}

/// Answer to a status poll.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchmakeStatus {
    pub ready: bool,
    pub ip: Option<String>,
    pub port: Option<u16>,
    pub not_matchmaked: bool,
    pub failed: bool,
}

struct QueueState {
    queue: Vec<PlayerData>,
    in_queue: HashSet<String>,
}

pub struct MatchmakerServer {
    state: RwLock<QueueState>,
    cache: TtlCache<CacheEntry>,
    allocator: Arc<dyn Allocator>,
    cfg: MatchmakerConfig,
}

impl MatchmakerServer {
    pub fn new(
        cfg: MatchmakerConfig,
        allocator: Arc<dyn Allocator>,
        cache: TtlCache<CacheEntry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(QueueState {
                queue: Vec::new(),
                in_queue: HashSet::new(),
            }),
            cache,
            allocator,
            cfg,
        })
    }

    pub fn config(&self) -> &MatchmakerConfig {
        &self.cfg
    }

    pub fn cache(&self) -> &TtlCache<CacheEntry> {
        &self.cache
    }

    /// Enqueues a user. Repeat calls while the user is anywhere in the
    /// matchmaker are no-ops.
    pub fn matchmake(&self, user_id: &str) {
        {
            let state = self.state.read();
            if state.in_queue.contains(user_id) {
                log::info!("user {user_id}: already matchmaking");
                return;
            }
        }
        let mut state = self.state.write();
        if state.in_queue.insert(user_id.to_string()) {
            state.queue.push(PlayerData {
                user_id: user_id.to_string(),
            });
            log::info!("user {user_id}: queued");
        }
    }

    /// Polls for the user's match. The first poll that reports `ready`
    /// hands the endpoint over and forgets the user.
    pub fn check_status(&self, user_id: &str) -> MatchmakeStatus {
        {
            let state = self.state.read();
            if !state.in_queue.contains(user_id) {
                return MatchmakeStatus {
                    not_matchmaked: true,
                    ..MatchmakeStatus::default()
                };
            }
        }

        let Some(entry) = self.cache.get(&user_key(user_id)) else {
            // Still waiting for a lobby.
            return MatchmakeStatus::default();
        };

        let match_key = match entry {
            CacheEntry::Assignment(UserAssignment::Match(match_key)) => match_key,
            _ => {
                return MatchmakeStatus {
                    failed: true,
                    ..MatchmakeStatus::default()
                };
            }
        };
        let Some(CacheEntry::Match(data)) = self.cache.get(&match_key) else {
            return MatchmakeStatus {
                failed: true,
                ..MatchmakeStatus::default()
            };
        };

        self.state.write().in_queue.remove(user_id);
        MatchmakeStatus {
            ready: true,
            ip: Some(data.ip),
            port: Some(data.port),
            not_matchmaked: false,
            failed: false,
        }
    }

    /// Removes a user who is still waiting in the queue. No-op otherwise.
    pub fn cancel(&self, user_id: &str) {
        let mut state = self.state.write();
        if let Some(index) = state
            .queue
            .iter()
            .position(|player| player.user_id == user_id)
        {
            state.queue.remove(index);
            state.in_queue.remove(user_id);
            log::info!("user {user_id}: matchmaking cancelled");
        }
    }

    /// One packer pass: if a full lobby is waiting, reserve a server and
    /// record the outcome for every member.
    pub async fn pack_lobby(&self) {
        let lobby: Vec<PlayerData> = {
            let mut state = self.state.write();
            log::info!("matchmaking, queue length {}", state.queue.len());
            if state.queue.len() < self.cfg.lobby_size {
                return;
            }
            state.queue.drain(..self.cfg.lobby_size).collect()
        };

        match self.allocator.allocate().await {
            Ok(endpoint) => {
                let match_key = format!("{MATCH_PREFIX}{}", Uuid::new_v4());
                self.cache.insert(
                    match_key.clone(),
                    CacheEntry::Match(MatchData {
                        ip: endpoint.ip,
                        port: endpoint.port,
                        players: lobby.clone(),
                    }),
                    self.cfg.match_keep,
                );
                for player in &lobby {
                    self.cache.insert(
                        user_key(&player.user_id),
                        CacheEntry::Assignment(UserAssignment::Match(match_key.clone())),
                        self.cfg.match_keep,
                    );
                }
                log::info!("formed {match_key} with {} players", lobby.len());
            }
            Err(error) => {
                log::error!("allocation of game server failed: {error}");
                for player in &lobby {
                    self.cache.insert(
                        user_key(&player.user_id),
                        CacheEntry::Assignment(UserAssignment::NoMatchHappened),
                        self.cfg.match_keep,
                    );
                }
            }
        }
    }

    /// Spawns the periodic packer; dropping the guard stops it.
    pub fn spawn_packer(self: &Arc<Self>) -> cancel::Guard {
        let cancel_token = cancel::Token::new();
        let token = cancel_token.clone();
        let server = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(server.cfg.matchmaking_delay);
            loop {
                select! {
                    biased;

                    _ = token.cancelled() => return,

                    _ = ticker.tick() => {}
                }
                server.pack_lobby().await;
            }
        });
        cancel_token.guard()
    }

    #[cfg(test)]
    fn queue_snapshot(&self) -> Vec<String> {
        self.state
            .read()
            .queue
            .iter()
            .map(|player| player.user_id.clone())
            .collect()
    }

    #[cfg(test)]
    fn is_waiting(&self, user_id: &str) -> bool {
        self.state.read().in_queue.contains(user_id)
    }
}

fn user_key(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}
