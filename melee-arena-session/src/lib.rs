//! The authoritative simulation core for one match.
//!
//! Concurrency model: the snapshot ring lives under a session-wide
//! readers/writer lock — action handlers take it shared, the tick takes it
//! exclusive — while every live player and item sits behind its own mutex
//! with short arithmetic-only critical sections. The composition separates
//! the "handlers" phase from the "tick" phase without serializing handlers
//! against each other.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use melee_arena_geom::sweep::Event;
use melee_arena_geom::Vec2;
use melee_arena_map::Map;
use melee_arena_protocol::{
    DroppedItem, Equipment, EquipmentItem, GameStatePayload, ItemStats, Player, PlayerId,
    PlayerStats, Rarity, WeaponStats,
};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

mod actions;
pub mod events;
pub mod snapshot;
mod tick;

#[cfg(test)]
mod testing;

pub use events::{KillEvent, SessionEvents};
pub use snapshot::{Snapshot, SnapshotRing};
pub use tick::TickOutcome;

/// Where carried items park until they are dropped again.
pub const CARRIED_ITEM_POSITION: Vec2 = Vec2 { x: -100.0, y: -100.0 };

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("game_states_saved must be at least 1")]
    NoSavedStates,

    #[error("game_states_shift_back must be in 1..={0}, got {1}")]
    BadShiftBack(usize, usize),

    #[error("ticks_per_second must be positive")]
    NoTickRate,

    #[error("player_count must be at least 1")]
    NoPlayers,

    #[error("map has {0} player spawns, need {1}")]
    NotEnoughSpawns(usize, usize),

    #[error("default weapon must actually be a weapon")]
    BadDefaultWeapon,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Ring length: how many past ticks stay addressable.
    pub game_states_saved: usize,
    /// How far back from the ring's tail action handlers read.
    pub game_states_shift_back: usize,
    pub ticks_per_second: u32,
    pub player_count: usize,
    pub player_pick_up_range: f32,
    pub player_drop_range: f32,
    pub player_radius: f32,
    pub initial_hp: i32,
    pub default_weapon: EquipmentItem,
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.ticks_per_second.max(1)))
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.game_states_saved < 1 {
            return Err(SessionError::NoSavedStates);
        }
        if self.game_states_shift_back < 1 || self.game_states_shift_back > self.game_states_saved
        {
            return Err(SessionError::BadShiftBack(
                self.game_states_saved,
                self.game_states_shift_back,
            ));
        }
        if self.ticks_per_second == 0 {
            return Err(SessionError::NoTickRate);
        }
        if self.player_count == 0 {
            return Err(SessionError::NoPlayers);
        }
        if self.default_weapon.weapon_stats().is_none() {
            return Err(SessionError::BadDefaultWeapon);
        }
        Ok(())
    }
}

/// The default loadout every player starts with and falls back to after
/// dropping a looted weapon.
pub fn default_weapon() -> EquipmentItem {
    EquipmentItem {
        id: 0,
        rarity: Rarity::Default,
        stats: ItemStats::Weapon(WeaponStats {
            attack_power: 10,
            range: 7.0,
            attack_cone: 0.79,
            knockback_power: 2.0,
        }),
    }
}

/// State the tick owns exclusively and handlers observe through the shared
/// lock.
pub(crate) struct SimState {
    pub ring: SnapshotRing,
    pub players_left: u32,
}

pub struct GameSession {
    cfg: SessionConfig,
    map: Arc<Map>,
    sim: RwLock<SimState>,
    players: Vec<Mutex<Player>>,
    items: Vec<Mutex<DroppedItem>>,
    senders: events::EventSenders,
    dead_rx: Receiver<PlayerId>,
}

impl GameSession {
    /// Builds the session from the map: players at the first `player_count`
    /// spawn points, loot generated at every loot spot, ring seeded with the
    /// initial state.
    pub fn new(cfg: SessionConfig, map: Arc<Map>) -> Result<(Self, SessionEvents), SessionError> {
        cfg.validate()?;
        if map.player_spawns().len() < cfg.player_count {
            return Err(SessionError::NotEnoughSpawns(
                map.player_spawns().len(),
                cfg.player_count,
            ));
        }

        let players: Vec<Player> = (0..cfg.player_count)
            .map(|index| Player {
                id: PlayerId::from_index(index),
                user_id: String::new(),
                nickname: String::new(),
                position: map.player_spawns()[index],
                angle: 0.0,
                hp: cfg.initial_hp,
                equipment: Equipment::bare(cfg.default_weapon),
                stats: PlayerStats::default(),
                placement: None,
            })
            .collect();

        let items: Vec<DroppedItem> = map
            .loot_spots()
            .iter()
            .enumerate()
            .map(|(index, &position)| DroppedItem {
                item: loot_for_spot(index),
                position,
                picked_up: false,
            })
            .collect();

        let players_left = cfg.player_count as u32;
        let initial = snapshot_of(&cfg, &players, &items, players_left);
        let (senders, receivers, dead_rx) = events::event_channels(cfg.player_count);
        let session = Self {
            sim: RwLock::new(SimState {
                ring: SnapshotRing::seeded(
                    initial,
                    cfg.game_states_saved,
                    cfg.game_states_shift_back,
                ),
                players_left,
            }),
            players: players.into_iter().map(Mutex::new).collect(),
            items: items.into_iter().map(Mutex::new).collect(),
            senders,
            dead_rx,
            cfg,
            map,
        };
        Ok((session, receivers))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Fills in the identity a client registered with. Called once per
    /// player when the match starts.
    pub fn set_player_identity(&self, id: PlayerId, user_id: &str, nickname: &str) {
        let mut player = self.players[id.index()].lock();
        player.user_id = user_id.to_string();
        player.nickname = nickname.to_string();
    }

    /// Rebuilds the ring from the live state, repeated `game_states_saved`
    /// times. Run at match start once identities are in place.
    pub fn reset_ring(&self) {
        let players_left = self.cfg.player_count as u32;
        let snapshot = self.capture_snapshot(players_left);
        let mut sim = self.sim.write();
        sim.players_left = players_left;
        sim.ring = SnapshotRing::seeded(
            snapshot,
            self.cfg.game_states_saved,
            self.cfg.game_states_shift_back,
        );
    }

    /// The broadcast payload: the same lagged snapshot the handlers read.
    pub fn lagged_state(&self) -> GameStatePayload {
        let sim = self.sim.read();
        let snapshot = sim.ring.lagged();
        GameStatePayload {
            players: snapshot.players.clone(),
            dropped_items: snapshot.items.clone(),
            players_left: snapshot.players_left,
        }
    }

    pub fn players_left(&self) -> u32 {
        self.sim.read().players_left
    }

    /// Deep copies of the live players, e.g. for results publishing after
    /// the match.
    pub fn live_players(&self) -> Vec<Player> {
        self.players.iter().map(|slot| slot.lock().clone()).collect()
    }

    pub fn live_player(&self, id: PlayerId) -> Player {
        self.players[id.index()].lock().clone()
    }

    pub fn live_item(&self, item_id: u32) -> Option<DroppedItem> {
        self.items
            .get(item_id as usize)
            .map(|slot| slot.lock().clone())
    }

    /// Deep-copies the live world without any collision pass; used to seed
    /// the ring.
    fn capture_snapshot(&self, players_left: u32) -> Snapshot {
        let players: Vec<Player> = self.players.iter().map(|slot| slot.lock().clone()).collect();
        let items: Vec<DroppedItem> = self.items.iter().map(|slot| slot.lock().clone()).collect();
        snapshot_of(&self.cfg, &players, &items, players_left)
    }
}

fn snapshot_of(
    cfg: &SessionConfig,
    players: &[Player],
    items: &[DroppedItem],
    players_left: u32,
) -> Snapshot {
    let r = cfg.player_radius;
    let mut sorted_players = Vec::with_capacity(players.len() * 2);
    for player in players {
        sorted_players.extend(Event::pair(
            player.id,
            player.position.x - r,
            player.position.x + r,
        ));
    }
    melee_arena_geom::sweep::sort_events(&mut sorted_players);
    Snapshot {
        players: players.to_vec(),
        items: items.to_vec(),
        sorted_players,
        players_left,
    }
}

/// Loot table cycled over the map's loot spots.
fn loot_for_spot(index: usize) -> EquipmentItem {
    let id = index as u32;
    match index % 3 {
        0 => EquipmentItem {
            id,
            rarity: Rarity::Common,
            stats: ItemStats::Weapon(WeaponStats {
                attack_power: 20,
                range: 15.0,
                attack_cone: 0.44,
                knockback_power: 3.0,
            }),
        },
        1 => EquipmentItem {
            id,
            rarity: Rarity::Uncommon,
            stats: ItemStats::Helmet { hp_buff: 20 },
        },
        _ => EquipmentItem {
            id,
            rarity: Rarity::Rare,
            stats: ItemStats::Armor {
                damage_reduction: 15,
            },
        },
    }
}
