//! One long fight, played move by move, checking the numbers at every step.
//!
//! Fixture recap: "player" starts at (50, 40) facing 0 with the training
//! weapon (10 power, range 5, cone 0.79, knockback 2). Three enemies stand
//! at (80, 20): enemy1 (100 hp), enemy2 (80 hp, worn helmet), enemy3
//! (70 hp, 15 armor). Handlers read the newest snapshot (shift_back = 1).

use melee_arena_geom::Vec2;
use melee_arena_protocol::{Action, EquipmentKind, PlayerId, Rarity};

use crate::testing::make_test_session;
use crate::{KillEvent, TickOutcome};

const P0: PlayerId = PlayerId(0);
const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);
const P3: PlayerId = PlayerId(3);

#[test]
fn combat_and_looting_scenario() {
    let (session, events) = make_test_session();
    let mut attacks_expected = 0;

    // Close in: (50,40) -> (70,20), ten away from the enemy pile.
    session.apply_action(
        P0,
        Action::Move {
            shift: Vec2::new(20.0, -20.0),
            angle: 0.0,
        },
    );
    assert_eq!(session.tick(), TickOutcome::Running);

    // Swing one: distance 10 equals radius + range, so everyone is in reach.
    // enemy3's armor out-soaks the weapon, healing it by 5.
    session.apply_action(P0, Action::Attack);
    attacks_expected += 1;
    assert_eq!(session.live_player(P1).hp, 90);
    assert_eq!(session.live_player(P2).hp, 70);
    assert_eq!(session.live_player(P3).hp, 75);
    assert_eq!(session.live_player(P0).stats.damage, 10 + 10 - 5);
    // Knockback pushed every target 2 along +X.
    assert_eq!(session.live_player(P1).position, Vec2::new(82.0, 20.0));

    // After a tick the knockback is in the snapshot: 12 away, out of reach.
    session.tick();
    session.apply_action(P0, Action::Attack);
    attacks_expected += 1;
    assert_eq!(session.live_player(P1).hp, 90);
    assert_eq!(session.live_player(P0).stats.damage, 15);

    // Step up to (80, 20), two away from the pile, and swing again.
    session.apply_action(
        P0,
        Action::Move {
            shift: Vec2::new(10.0, 0.0),
            angle: 0.0,
        },
    );
    session.tick();
    session.apply_action(P0, Action::Attack);
    attacks_expected += 1;
    assert_eq!(session.live_player(P1).hp, 80);
    assert_eq!(session.live_player(P2).hp, 60);
    assert_eq!(session.live_player(P3).hp, 80);
    assert_eq!(session.live_player(P0).stats.damage, 30);

    // Without a tick the snapshot never moves, so repeated swings keep
    // landing. Six more take enemy2 from 60 to exactly 0.
    for _ in 0..6 {
        session.apply_action(P0, Action::Attack);
        attacks_expected += 1;
    }
    assert_eq!(session.live_player(P2).hp, 0);
    assert_eq!(session.live_player(P1).hp, 20);
    assert_eq!(session.live_player(P3).hp, 110);
    assert_eq!(session.live_player(P0).stats.kills, 1);
    assert_eq!(session.live_player(P0).stats.damage, 30 + 6 * 15);

    assert_eq!(
        events.kills.try_recv(),
        Ok(KillEvent {
            killer: "player".to_string(),
            victim: "enemy2".to_string(),
        })
    );
    assert!(events.kills.try_recv().is_err(), "exactly one kill event");

    // The next tick turns the death into a finishing position: first of four
    // to fall finishes 4th, three keep playing.
    assert_eq!(session.tick(), TickOutcome::Running);
    assert_eq!(session.live_player(P2).placement, Some(4));
    assert_eq!(session.players_left(), 3);
    assert_eq!(session.lagged_state().players_left, 3);

    // Loot run. The ground weapon is 30 away; grabbing from here fails.
    session.apply_action(P0, Action::PickUp { item_id: 4 });
    assert!(!session.live_item(4).unwrap().picked_up);

    // Walk to (55, 20), five away from the weapon at (50, 20).
    session.apply_action(
        P0,
        Action::Move {
            shift: Vec2::new(-25.0, 0.0),
            angle: 0.0,
        },
    );
    session.tick();
    session.apply_action(P0, Action::PickUp { item_id: 4 });
    assert_eq!(
        session.live_player(P0).equipment.weapon.rarity,
        Rarity::Common
    );
    assert!(session.live_item(4).unwrap().picked_up);

    // Helmet at (55, 28): walk up and take it. +20 hp.
    session.apply_action(
        P0,
        Action::Move {
            shift: Vec2::new(0.0, 5.0),
            angle: 0.0,
        },
    );
    session.tick();
    session.apply_action(P0, Action::PickUp { item_id: 0 });
    let player = session.live_player(P0);
    assert_eq!(player.hp, 120);
    assert!(player.equipment.helmet.is_some());

    // Armor at (57, 23) is in range of (55, 25) too.
    session.apply_action(P0, Action::PickUp { item_id: 1 });
    assert!(session.live_player(P0).equipment.armor.is_some());

    // Shed the helmet: hp returns to 100 and the item lands 7 ahead.
    session.apply_action(
        P0,
        Action::Drop {
            slot: EquipmentKind::Helmet,
        },
    );
    let player = session.live_player(P0);
    assert_eq!(player.hp, 100);
    assert_eq!(player.equipment.helmet, None);
    let helmet = session.live_item(0).unwrap();
    assert!(!helmet.picked_up);
    assert_eq!(helmet.position, Vec2::new(62.0, 25.0));

    // Dropping the looted weapon restores the training weapon, which can
    // never be dropped itself.
    session.apply_action(
        P0,
        Action::Drop {
            slot: EquipmentKind::Weapon,
        },
    );
    assert_eq!(
        session.live_player(P0).equipment.weapon.rarity,
        Rarity::Default
    );
    assert!(!session.live_item(4).unwrap().picked_up);
    session.apply_action(
        P0,
        Action::Drop {
            slot: EquipmentKind::Weapon,
        },
    );
    assert_eq!(
        session.live_player(P0).equipment.weapon.rarity,
        Rarity::Default
    );

    // Every swing produced exactly one attack notification.
    let mut attack_events = 0;
    while let Ok(id) = events.attacks.try_recv() {
        assert_eq!(id, P0);
        attack_events += 1;
    }
    assert_eq!(attack_events, attacks_expected);
}
