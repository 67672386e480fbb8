//! Shared fixtures for the session tests: a 100×100 map with one obstacle
//! block, four players, and the classic loot spread (ground helmet, ground
//! armor, two worn pieces, one ground weapon).

use std::f32::consts::PI;
use std::sync::Arc;

use melee_arena_geom::Vec2;
use melee_arena_map::Map;
use melee_arena_protocol::{
    DroppedItem, Equipment, EquipmentItem, ItemStats, Player, PlayerId, PlayerStats, Rarity,
    WeaponStats,
};

use crate::{GameSession, SessionConfig, SessionEvents};

pub const TEST_MAP: &str = r#"{
    "entities": [
        {"vertexes": [20, 35, 30, 35, 30, 45, 20, 45]}
    ],
    "loot_spots": [55, 28, 57, 23, -100, -100, -100, -100, 50, 20],
    "player_spawns": [50, 40, 80, 20, 20, 80, 80, 80],
    "map_border_x": 100,
    "map_border_y": 100
}"#;

pub fn test_map() -> Arc<Map> {
    Arc::new(Map::from_json(TEST_MAP).unwrap())
}

/// Training weapon every player holds by default. Weaker than ground loot.
pub fn test_default_weapon() -> EquipmentItem {
    EquipmentItem {
        id: 100,
        rarity: Rarity::Default,
        stats: ItemStats::Weapon(WeaponStats {
            attack_power: 10,
            range: 5.0,
            attack_cone: 0.79,
            knockback_power: 2.0,
        }),
    }
}

pub fn test_config(shift_back: usize) -> SessionConfig {
    SessionConfig {
        game_states_saved: 5,
        game_states_shift_back: shift_back,
        ticks_per_second: 30,
        player_count: 4,
        player_pick_up_range: 5.0,
        player_drop_range: 7.0,
        player_radius: 5.0,
        initial_hp: 100,
        default_weapon: test_default_weapon(),
    }
}

pub fn ground_helmet() -> EquipmentItem {
    EquipmentItem {
        id: 0,
        rarity: Rarity::Uncommon,
        stats: ItemStats::Helmet { hp_buff: 20 },
    }
}

pub fn worn_helmet() -> EquipmentItem {
    EquipmentItem {
        id: 2,
        rarity: Rarity::Rare,
        stats: ItemStats::Helmet { hp_buff: 30 },
    }
}

pub fn worn_armor() -> EquipmentItem {
    EquipmentItem {
        id: 3,
        rarity: Rarity::Uncommon,
        stats: ItemStats::Armor {
            damage_reduction: 15,
        },
    }
}

pub fn ground_weapon() -> EquipmentItem {
    EquipmentItem {
        id: 4,
        rarity: Rarity::Common,
        stats: ItemStats::Weapon(WeaponStats {
            attack_power: 20,
            range: 15.0,
            attack_cone: 0.44,
            knockback_power: 3.0,
        }),
    }
}

/// Session with `shift_back = 1`: handlers see the newest snapshot, which
/// keeps combat arithmetic easy to follow.
pub fn make_test_session() -> (GameSession, SessionEvents) {
    make_test_session_with_shift_back(1)
}

pub fn make_test_session_with_shift_back(shift_back: usize) -> (GameSession, SessionEvents) {
    let (session, events) = GameSession::new(test_config(shift_back), test_map()).unwrap();

    let fixtures = [
        ("player", "some-id", 50.0, 40.0, 0.0, 100, None, None),
        ("enemy1", "some-id-1", 80.0, 20.0, PI / 2.0, 100, None, None),
        ("enemy2", "some-id-2", 80.0, 20.0, 0.0, 80, Some(worn_helmet()), None),
        (
            "enemy3",
            "some-id-3",
            80.0,
            20.0,
            PI * 3.0 / 2.0,
            70,
            None,
            Some(worn_armor()),
        ),
    ];
    for (index, (nickname, user_id, x, y, angle, hp, helmet, armor)) in
        fixtures.into_iter().enumerate()
    {
        *session.players[index].lock() = Player {
            id: PlayerId::from_index(index),
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            position: Vec2::new(x, y),
            angle,
            hp,
            equipment: Equipment {
                weapon: test_default_weapon(),
                helmet,
                armor,
            },
            stats: PlayerStats::default(),
            placement: None,
        };
    }

    let items = [
        (ground_helmet(), 55.0, 28.0, false),
        (
            EquipmentItem {
                id: 1,
                rarity: Rarity::Rare,
                stats: ItemStats::Armor {
                    damage_reduction: 20,
                },
            },
            57.0,
            23.0,
            false,
        ),
        (worn_helmet(), -100.0, -100.0, true),
        (worn_armor(), -100.0, -100.0, true),
        (ground_weapon(), 50.0, 20.0, false),
    ];
    for (index, (item, x, y, picked_up)) in items.into_iter().enumerate() {
        *session.items[index].lock() = DroppedItem {
            item,
            position: Vec2::new(x, y),
            picked_up,
        };
    }

    session.reset_ring();
    (session, events)
}
