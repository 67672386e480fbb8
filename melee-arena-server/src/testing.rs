//! Fixtures for hub tests: a flat two-player arena and clients whose
//! streams are plain channels instead of sockets.

use std::sync::Arc;

use melee_arena_map::Map;
use melee_arena_protocol::ServerMessage;
use melee_arena_session::{default_weapon, GameSession, SessionConfig, SessionEvents};
use tokio::sync::mpsc;

use crate::client::{ClientConnection, StreamError, StreamHandle};
use crate::GameServer;

const ARENA: &str = r#"{
    "entities": [],
    "loot_spots": [],
    "player_spawns": [10, 10, 16, 10],
    "map_border_x": 100,
    "map_border_y": 100
}"#;

/// A two-player duel where a couple of hits settle it.
pub fn duel_session() -> (Arc<GameSession>, SessionEvents) {
    let cfg = SessionConfig {
        game_states_saved: 5,
        game_states_shift_back: 1,
        ticks_per_second: 30,
        player_count: 2,
        player_pick_up_range: 10.0,
        player_drop_range: 15.0,
        player_radius: 5.0,
        initial_hp: 20,
        default_weapon: default_weapon(),
    };
    let map = Arc::new(Map::from_json(ARENA).unwrap());
    let (session, events) = GameSession::new(cfg, map).unwrap();
    (Arc::new(session), events)
}

/// Registers a client and installs a channel-backed stream, standing in for
/// a live WebSocket.
pub fn register_streaming_client(
    server: &GameServer,
    user_id: &str,
    nickname: &str,
    sink_capacity: usize,
) -> (
    Arc<ClientConnection>,
    mpsc::Receiver<ServerMessage>,
    mpsc::Receiver<StreamError>,
) {
    let client = server
        .register_client(user_id.to_string(), nickname.to_string())
        .expect("fixture registers within capacity");
    let (sink_tx, sink_rx) = mpsc::channel(sink_capacity);
    let (done_tx, done_rx) = mpsc::channel(1);
    client.install_stream(StreamHandle {
        sink: sink_tx,
        done: done_tx,
    });
    (client, sink_rx, done_rx)
}
