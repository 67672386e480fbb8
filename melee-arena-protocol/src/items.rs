//! Equipment and loot.

use melee_arena_geom::Vec2;

use crate::codec::{DecodeError, StreamCodec};

/// Item rarity. `Default`-rarity items are intrinsic to the player and can
/// never be dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Rarity {
    Default,
    Common,
    Uncommon,
    Rare,
}

impl StreamCodec for Rarity {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::Default),
            1 => Ok(Self::Common),
            2 => Ok(Self::Uncommon),
            3 => Ok(Self::Rare),
            x => Err(DecodeError::InvalidTag("rarity", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        (*self as u8).write_to(w);
    }
}

/// The equipment slot an item occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EquipmentKind {
    Weapon,
    Helmet,
    Armor,
}

impl StreamCodec for EquipmentKind {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::read_from(r)? {
            0 => Ok(Self::Weapon),
            1 => Ok(Self::Helmet),
            2 => Ok(Self::Armor),
            x => Err(DecodeError::InvalidTag("equipment kind", x)),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        (*self as u8).write_to(w);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponStats {
    pub attack_power: i32,
    pub range: f32,
    /// Half-angle of the swing, radians.
    pub attack_cone: f32,
    pub knockback_power: f32,
}

impl StreamCodec for WeaponStats {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            attack_power: i32::read_from(r)?,
            range: f32::read_from(r)?,
            attack_cone: f32::read_from(r)?,
            knockback_power: f32::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.attack_power.write_to(w);
        self.range.write_to(w);
        self.attack_cone.write_to(w);
        self.knockback_power.write_to(w);
    }
}

/// What an item does. The variant doubles as the slot it goes into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStats {
    Weapon(WeaponStats),
    Helmet { hp_buff: i32 },
    Armor { damage_reduction: i32 },
}

impl StreamCodec for ItemStats {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        match EquipmentKind::read_from(r)? {
            EquipmentKind::Weapon => Ok(Self::Weapon(WeaponStats::read_from(r)?)),
            EquipmentKind::Helmet => Ok(Self::Helmet {
                hp_buff: i32::read_from(r)?,
            }),
            EquipmentKind::Armor => Ok(Self::Armor {
                damage_reduction: i32::read_from(r)?,
            }),
        }
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        match *self {
            Self::Weapon(stats) => {
                EquipmentKind::Weapon.write_to(w);
                stats.write_to(w);
            }
            Self::Helmet { hp_buff } => {
                EquipmentKind::Helmet.write_to(w);
                hp_buff.write_to(w);
            }
            Self::Armor { damage_reduction } => {
                EquipmentKind::Armor.write_to(w);
                damage_reduction.write_to(w);
            }
        }
    }
}

/// One piece of equipment. `id` is unique within the match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquipmentItem {
    pub id: u32,
    pub rarity: Rarity,
    pub stats: ItemStats,
}

impl EquipmentItem {
    pub fn kind(&self) -> EquipmentKind {
        match self.stats {
            ItemStats::Weapon(_) => EquipmentKind::Weapon,
            ItemStats::Helmet { .. } => EquipmentKind::Helmet,
            ItemStats::Armor { .. } => EquipmentKind::Armor,
        }
    }

    pub fn weapon_stats(&self) -> Option<&WeaponStats> {
        match &self.stats {
            ItemStats::Weapon(stats) => Some(stats),
            _ => None,
        }
    }

    /// Hp granted while worn; 0 for anything but a helmet.
    pub fn hp_buff(&self) -> i32 {
        match self.stats {
            ItemStats::Helmet { hp_buff } => hp_buff,
            _ => 0,
        }
    }

    /// Incoming damage soaked; 0 for anything but armor.
    pub fn damage_reduction(&self) -> i32 {
        match self.stats {
            ItemStats::Armor { damage_reduction } => damage_reduction,
            _ => 0,
        }
    }
}

impl StreamCodec for EquipmentItem {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            id: u32::read_from(r)?,
            rarity: Rarity::read_from(r)?,
            stats: ItemStats::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.id.write_to(w);
        self.rarity.write_to(w);
        self.stats.write_to(w);
    }
}

/// A player's three slots. The weapon slot is never empty; an unequipped
/// player carries the match's default weapon.
#[derive(Clone, Debug, PartialEq)]
pub struct Equipment {
    pub weapon: EquipmentItem,
    pub helmet: Option<EquipmentItem>,
    pub armor: Option<EquipmentItem>,
}

impl Equipment {
    pub fn bare(default_weapon: EquipmentItem) -> Self {
        Self {
            weapon: default_weapon,
            helmet: None,
            armor: None,
        }
    }
}

impl StreamCodec for Equipment {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            weapon: EquipmentItem::read_from(r)?,
            helmet: Option::read_from(r)?,
            armor: Option::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.weapon.write_to(w);
        self.helmet.write_to(w);
        self.armor.write_to(w);
    }
}

/// An item lying on the ground, or its off-map placeholder while carried.
#[derive(Clone, Debug, PartialEq)]
pub struct DroppedItem {
    pub item: EquipmentItem,
    pub position: Vec2,
    pub picked_up: bool,
}

impl StreamCodec for DroppedItem {
    fn read_from(r: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            item: EquipmentItem::read_from(r)?,
            position: Vec2::read_from(r)?,
            picked_up: bool::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Vec<u8>) {
        self.item.write_to(w);
        self.position.write_to(w);
        self.picked_up.write_to(w);
    }
}
