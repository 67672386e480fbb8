//! Wire types shared by the session service and its clients.
//!
//! The Talk stream carries binary frames ([`codec::StreamCodec`]); the
//! Connect handshake and everything the matchmaker speaks is JSON.

pub mod codec;
pub mod connect;
pub mod items;
pub mod message;
pub mod player;

pub use codec::{decode, encode, DecodeError, StreamCodec};
pub use connect::{ConnectRequest, ConnectResponse, TOKEN_HEADER, USER_ID_HEADER};
pub use items::{DroppedItem, Equipment, EquipmentItem, EquipmentKind, ItemStats, Rarity, WeaponStats};
pub use message::{
    Action, ClientMessage, ClientNotification, GameStatePayload, ServerBody, ServerMessage,
    ServerNotification,
};
pub use player::{Player, PlayerId, PlayerStats};
