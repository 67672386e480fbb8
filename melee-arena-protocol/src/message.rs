//! Messages exchanged on the Talk stream.

use melee_arena_geom::Vec2;

use crate::codec::{DecodeError, StreamCodec};
use crate::items::{DroppedItem, EquipmentKind};
use crate::player::{Player, PlayerId};

/// One player input. At most one action per client message; the session
/// applies it against the lag-compensation snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Move { shift: Vec2, angle: f32 },
    Attack,
    PickUp { item_id: u32 },
    Drop { slot: EquipmentKind },
}

impl StreamCodec for Action {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::Move {
                shift: Vec2::read_from(r)?,
                angle: f32::read_from(r)?,
            }),
            1 => Ok(Self::Attack),
            2 => Ok(Self::PickUp {
                item_id: u32::read_from(r)?,
            }),
            3 => Ok(Self::Drop {
                slot: EquipmentKind::read_from(r)?,
            }),
            x => Err(DecodeError::InvalidTag("action", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        match *self {
            Self::Move { shift, angle } => {
                0u8.write_to(w);
                shift.write_to(w);
                angle.write_to(w);
            }
            Self::Attack => 1u8.write_to(w),
            Self::PickUp { item_id } => {
                2u8.write_to(w);
                item_id.write_to(w);
            }
            Self::Drop { slot } => {
                3u8.write_to(w);
                slot.write_to(w);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientNotification {
    /// The client finished its own setup and is ready for the match.
    Connect,
    /// The client is leaving; the stream terminates normally.
    Disconnect,
}

impl StreamCodec for ClientNotification {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::Connect),
            1 => Ok(Self::Disconnect),
            x => Err(DecodeError::InvalidTag("client notification", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        (*self as u8).write_to(w);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClientMessage {
    Notification(ClientNotification),
    Action(Action),
}

impl StreamCodec for ClientMessage {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::Notification(ClientNotification::read_from(r)?)),
            1 => Ok(Self::Action(Action::read_from(r)?)),
            x => Err(DecodeError::InvalidTag("client message", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        match self {
            Self::Notification(notification) => {
                0u8.write_to(w);
                notification.write_to(w);
            }
            Self::Action(action) => {
                1u8.write_to(w);
                action.write_to(w);
            }
        }
    }
}

/// Events the hub pushes to every streaming client.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerNotification {
    GameStarted,
    GameFinished,
    PlayerConnected { nickname: String },
    PlayerDisconnected { nickname: String },
    PlayerAttacked { player: PlayerId },
    PlayerKilled { killer: String, victim: String },
}

impl StreamCodec for ServerNotification {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::GameStarted),
            1 => Ok(Self::GameFinished),
            2 => Ok(Self::PlayerConnected {
                nickname: String::read_from(r)?,
            }),
            3 => Ok(Self::PlayerDisconnected {
                nickname: String::read_from(r)?,
            }),
            4 => Ok(Self::PlayerAttacked {
                player: PlayerId::read_from(r)?,
            }),
            5 => Ok(Self::PlayerKilled {
                killer: String::read_from(r)?,
                victim: String::read_from(r)?,
            }),
            x => Err(DecodeError::InvalidTag("server notification", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        match self {
            Self::GameStarted => 0u8.write_to(w),
            Self::GameFinished => 1u8.write_to(w),
            Self::PlayerConnected { nickname } => {
                2u8.write_to(w);
                nickname.write_to(w);
            }
            Self::PlayerDisconnected { nickname } => {
                3u8.write_to(w);
                nickname.write_to(w);
            }
            Self::PlayerAttacked { player } => {
                4u8.write_to(w);
                player.write_to(w);
            }
            Self::PlayerKilled { killer, victim } => {
                5u8.write_to(w);
                killer.write_to(w);
                victim.write_to(w);
            }
        }
    }
}

/// The authoritative state clients render from: the lag-compensation
/// snapshot the action handlers consult, not the newest one.
#[derive(Clone, Debug, PartialEq)]
pub struct GameStatePayload {
    pub players: Vec<Player>,
    pub dropped_items: Vec<DroppedItem>,
    pub players_left: u32,
}

impl StreamCodec for GameStatePayload {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            players: Vec::read_from(r)?,
            dropped_items: Vec::read_from(r)?,
            players_left: u32::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.players.write_to(w);
        self.dropped_items.write_to(w);
        self.players_left.write_to(w);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServerBody {
    GameState(GameStatePayload),
    Notification(ServerNotification),
}

/// Every outbound message carries the server's wall clock, unix nanos.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerMessage {
    pub server_time: i64,
    pub body: ServerBody,
}

impl StreamCodec for ServerMessage {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        let server_time = i64::read_from(r)?;
        let body = match u8::read_from(r)? {
            0 => ServerBody::GameState(GameStatePayload::read_from(r)?),
            1 => ServerBody::Notification(ServerNotification::read_from(r)?),
            x => return Err(DecodeError::InvalidTag("server message", x)),
        };
        Ok(Self { server_time, body })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.server_time.write_to(w);
        match &self.body {
            ServerBody::GameState(state) => {
                0u8.write_to(w);
                state.write_to(w);
            }
            ServerBody::Notification(notification) => {
                1u8.write_to(w);
                notification.write_to(w);
            }
        }
    }
}
