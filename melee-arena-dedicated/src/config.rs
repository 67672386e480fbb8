//! Configuration for the session service.
//!
//! Three layers, strongest first: command-line flags (each with an env-var
//! fallback, dotted flag name with `.` → `_`), an optional JSON config
//! file, and built-in defaults. A bare `PORT` env var additionally
//! overrides the listen port, which is what the fleet sets on allocated
//! instances.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use melee_arena_session::{default_weapon, SessionConfig};
use melee_arena_stats::{BackoffConfig, UsersServiceConfig};
use serde::Deserialize;

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Optional JSON config file; explicit flags win over it.
    #[clap(long = "config", env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Previous game states stored.
    #[clap(long = "gamesession.states.saved", env = "GAMESESSION_STATES_SAVED")]
    pub states_saved: Option<usize>,

    /// How many states to go back when resolving actions.
    #[clap(long = "gamesession.states.shiftback", env = "GAMESESSION_STATES_SHIFTBACK")]
    pub states_shift_back: Option<usize>,

    /// Server ticks per second.
    #[clap(long = "gamesession.ticks", env = "GAMESESSION_TICKS")]
    pub ticks_per_second: Option<u32>,

    /// Players in the session.
    #[clap(long = "gamesession.player.count", env = "GAMESESSION_PLAYER_COUNT")]
    pub player_count: Option<usize>,

    /// Range of player item pick up.
    #[clap(long = "gamesession.player.pickup", env = "GAMESESSION_PLAYER_PICKUP")]
    pub pick_up_range: Option<f32>,

    /// Range of player item drop.
    #[clap(long = "gamesession.player.drop", env = "GAMESESSION_PLAYER_DROP")]
    pub drop_range: Option<f32>,

    /// Radius of the player model.
    #[clap(long = "gamesession.player.radius", env = "GAMESESSION_PLAYER_RADIUS")]
    pub player_radius: Option<f32>,

    /// Path to the map description.
    #[clap(long = "gamemanager.map.file", env = "GAMEMANAGER_MAP_FILE")]
    pub map_file: Option<PathBuf>,

    /// Port to expose to clients.
    #[clap(long = "gameserver.port", env = "GAMESERVER_PORT")]
    pub port: Option<u16>,

    /// Make requests to the users service.
    #[clap(long = "users_service.enabled", env = "USERS_SERVICE_ENABLED")]
    pub users_enabled: Option<bool>,

    /// Users service address.
    #[clap(long = "users_service.address", env = "USERS_SERVICE_ADDRESS")]
    pub users_address: Option<String>,

    /// Users service request timeout, seconds.
    #[clap(long = "users_service.timeout", env = "USERS_SERVICE_TIMEOUT")]
    pub users_timeout_secs: Option<u64>,

    /// Users service s2s token.
    #[clap(long = "users_service.token", env = "USERS_SERVICE_TOKEN")]
    pub users_token: Option<String>,

    /// Users service stats endpoint.
    #[clap(long = "users_service.stats.endpoint", env = "USERS_SERVICE_STATS_ENDPOINT")]
    pub users_stats_endpoint: Option<String>,

    /// Users service currencies endpoint.
    #[clap(
        long = "users_service.currencies.endpoint",
        env = "USERS_SERVICE_CURRENCIES_ENDPOINT"
    )]
    pub users_currencies_endpoint: Option<String>,

    /// Base coins for one game.
    #[clap(long = "users_service.currencies.base", env = "USERS_SERVICE_CURRENCIES_BASE")]
    pub users_base_coins: Option<i64>,

    /// Coins per point of damage.
    #[clap(
        long = "users_service.currencies.damage",
        env = "USERS_SERVICE_CURRENCIES_DAMAGE"
    )]
    pub users_damage_coins: Option<f64>,

    /// Coins per kill.
    #[clap(long = "users_service.currencies.kill", env = "USERS_SERVICE_CURRENCIES_KILL")]
    pub users_kill_coins: Option<f64>,

    /// Initial retry delay, seconds.
    #[clap(long = "backoff.init_duration", env = "BACKOFF_INIT_DURATION")]
    pub backoff_initial_secs: Option<u64>,

    /// Ceiling for a single retry delay, seconds.
    #[clap(long = "backoff.max_duration", env = "BACKOFF_MAX_DURATION")]
    pub backoff_max_secs: Option<u64>,

    /// Growth factor between retries.
    #[clap(long = "backoff.factor", env = "BACKOFF_FACTOR")]
    pub backoff_factor: Option<f64>,

    /// Retry jitter in [0, 1].
    #[clap(long = "backoff.randomization", env = "BACKOFF_RANDOMIZATION")]
    pub backoff_randomization: Option<f64>,

    /// Total retry budget, seconds.
    #[clap(long = "backoff.max_interval", env = "BACKOFF_MAX_INTERVAL")]
    pub backoff_max_elapsed_secs: Option<u64>,
}

/// The same knobs, as an optional config file.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct FileConfig {
    pub states_saved: Option<usize>,
    pub states_shift_back: Option<usize>,
    pub ticks_per_second: Option<u32>,
    pub player_count: Option<usize>,
    pub pick_up_range: Option<f32>,
    pub drop_range: Option<f32>,
    pub player_radius: Option<f32>,
    pub map_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub users_enabled: Option<bool>,
    pub users_address: Option<String>,
    pub users_timeout_secs: Option<u64>,
    pub users_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub session: SessionConfig,
    pub users: UsersServiceConfig,
    pub map_file: PathBuf,
    pub port: u16,
}

impl Args {
    pub fn resolve(self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => {
                let reader = File::open(path)
                    .with_context(|| format!("unable to open config file {}", path.display()))?;
                serde_json::from_reader(reader)
                    .with_context(|| format!("malformed config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        let session = SessionConfig {
            game_states_saved: self.states_saved.or(file.states_saved).unwrap_or(5),
            game_states_shift_back: self
                .states_shift_back
                .or(file.states_shift_back)
                .unwrap_or(1),
            ticks_per_second: self.ticks_per_second.or(file.ticks_per_second).unwrap_or(30),
            player_count: self.player_count.or(file.player_count).unwrap_or(2),
            player_pick_up_range: self.pick_up_range.or(file.pick_up_range).unwrap_or(10.0),
            player_drop_range: self.drop_range.or(file.drop_range).unwrap_or(15.0),
            player_radius: self.player_radius.or(file.player_radius).unwrap_or(5.0),
            initial_hp: 100,
            default_weapon: default_weapon(),
        };

        let default_users = UsersServiceConfig::default();
        let users = UsersServiceConfig {
            enabled: self.users_enabled.or(file.users_enabled).unwrap_or(false),
            address: self
                .users_address
                .or(file.users_address)
                .unwrap_or(default_users.address),
            stats_endpoint: self
                .users_stats_endpoint
                .unwrap_or(default_users.stats_endpoint),
            currencies_endpoint: self
                .users_currencies_endpoint
                .unwrap_or(default_users.currencies_endpoint),
            base_coins: self.users_base_coins.unwrap_or(default_users.base_coins),
            damage_coins: self.users_damage_coins.unwrap_or(default_users.damage_coins),
            kill_coins: self.users_kill_coins.unwrap_or(default_users.kill_coins),
            timeout: Duration::from_secs(
                self.users_timeout_secs.or(file.users_timeout_secs).unwrap_or(10),
            ),
            token: self
                .users_token
                .or(file.users_token)
                .unwrap_or(default_users.token),
            backoff: BackoffConfig {
                initial_interval: Duration::from_secs(self.backoff_initial_secs.unwrap_or(15)),
                multiplier: self.backoff_factor.unwrap_or(2.0),
                randomization: self.backoff_randomization.unwrap_or(0.0),
                max_interval: Duration::from_secs(self.backoff_max_secs.unwrap_or(45)),
                max_elapsed: Duration::from_secs(self.backoff_max_elapsed_secs.unwrap_or(90)),
            },
        };

        // The fleet hands allocated instances their public port this way.
        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("invalid PORT override {value:?}"))?,
            Err(_) => self.port.or(file.port).unwrap_or(9979),
        };

        Ok(ResolvedConfig {
            session,
            users,
            map_file: self
                .map_file
                .or(file.map_file)
                .unwrap_or_else(|| PathBuf::from("maps/arena.json")),
            port,
        })
    }
}
