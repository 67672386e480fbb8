use std::fmt::{self, Display, Formatter};

use melee_arena_geom::Vec2;

use crate::codec::{DecodeError, StreamCodec};
use crate::items::Equipment;

/// A small integer identifying a player within one match, assigned in
/// Connect order. Doubles as the index into the session's player tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self(u8::try_from(index).expect("player index fits in u8"))
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

impl StreamCodec for PlayerId {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(u8::read_from(r)?))
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.0.write_to(w);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub kills: u32,
    pub damage: i32,
}

impl StreamCodec for PlayerStats {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            kills: u32::read_from(r)?,
            damage: i32::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.kills.write_to(w);
        self.damage.write_to(w);
    }
}

/// Authoritative player record. Hp at or below zero means dead; `placement`
/// is set once, when the player is eliminated (1 = winner).
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: String,
    pub nickname: String,
    pub position: Vec2,
    /// Facing, radians in [0, 2π).
    pub angle: f32,
    pub hp: i32,
    pub equipment: Equipment,
    pub stats: PlayerStats,
    pub placement: Option<u32>,
}

impl StreamCodec for Player {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            id: PlayerId::read_from(r)?,
            user_id: String::read_from(r)?,
            nickname: String::read_from(r)?,
            position: Vec2::read_from(r)?,
            angle: f32::read_from(r)?,
            hp: i32::read_from(r)?,
            equipment: Equipment::read_from(r)?,
            stats: PlayerStats::read_from(r)?,
            placement: Option::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.id.write_to(w);
        self.user_id.write_to(w);
        self.nickname.write_to(w);
        self.position.write_to(w);
        self.angle.write_to(w);
        self.hp.write_to(w);
        self.equipment.write_to(w);
        self.stats.write_to(w);
        self.placement.write_to(w);
    }
}
