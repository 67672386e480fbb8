//! Resolution of player actions against the lag-compensation snapshot.
//!
//! Every check (who is where, what is in range) consults the lagged
//! snapshot; every effect lands on the live world under the target's own
//! lock. A handler holds the session lock shared for its whole run, so the
//! tick can never rotate the ring out from under it.

use std::mem;

use melee_arena_geom::arc::{arcs_overlap, ArcSpan};
use melee_arena_geom::{sat, swept_quad, sweep, wrap_angle, Vec2};
use melee_arena_protocol::{Action, EquipmentItem, EquipmentKind, PlayerId, Rarity};

use crate::events::KillEvent;
use crate::snapshot::Snapshot;
use crate::{GameSession, SimState, CARRIED_ITEM_POSITION};

impl GameSession {
    /// Applies one client action. Actions from players who are dead in the
    /// lagged snapshot are ignored.
    pub fn apply_action(&self, player_id: PlayerId, action: Action) {
        let sim = self.sim.read();
        let snapshot = sim.ring.lagged();
        let Some(actor) = snapshot.players.get(player_id.index()) else {
            return;
        };
        if actor.hp <= 0 {
            return;
        }

        match action {
            Action::Move { shift, angle } => self.apply_move(&sim, player_id, shift, angle),
            Action::Attack => self.apply_attack(&sim, player_id),
            Action::PickUp { item_id } => self.apply_pick_up(&sim, player_id, item_id),
            Action::Drop { slot } => self.apply_drop(&sim, player_id, slot),
        }
    }

    fn apply_move(&self, sim: &SimState, player_id: PlayerId, shift: Vec2, turn: f32) {
        let border = self.map.border();
        let r = self.cfg.player_radius;

        let mut player = self.players[player_id.index()].lock();
        let from = player.position;
        player.position.x = (player.position.x + shift.x).clamp(0.0, border.x);
        player.position.y = (player.position.y + shift.y).clamp(0.0, border.y);
        player.angle = wrap_angle(player.angle + turn);

        let to = player.position;
        if shift == Vec2::ZERO || to == from {
            return;
        }

        let body = swept_quad(from, to, r);
        let min = from.x.min(to.x) - r;
        let max = from.x.max(to.x) + r;
        for obstacle_id in self.map.obstacles_in_x_range(min, max) {
            if sat::polygons_overlap(&body, self.map.obstacle(obstacle_id)) {
                player.position = sim.ring.latest().players[player_id.index()].position;
                break;
            }
        }
    }

    fn apply_attack(&self, sim: &SimState, player_id: PlayerId) {
        let snapshot = sim.ring.lagged();
        let attacker = &snapshot.players[player_id.index()];
        if let Some(weapon) = attacker.equipment.weapon.weapon_stats() {
            let min = attacker.position.x - weapon.range;
            let max = attacker.position.x + weapon.range;
            for defender_id in sweep::query(&snapshot.sorted_players, min, max) {
                if defender_id != player_id {
                    self.resolve_possible_hit(snapshot, player_id, defender_id);
                }
            }
        }
        // One notification per swing, whether or not anything was hit.
        let _ = self.senders.attacks.try_send(player_id);
    }

    fn resolve_possible_hit(
        &self,
        snapshot: &Snapshot,
        attacker_id: PlayerId,
        defender_id: PlayerId,
    ) {
        let attacker = &snapshot.players[attacker_id.index()];
        let defender = &snapshot.players[defender_id.index()];
        let Some(weapon) = attacker.equipment.weapon.weapon_stats() else {
            return;
        };

        let distance = attacker.position.distance(defender.position);
        if distance > self.cfg.player_radius + weapon.range {
            return;
        }

        if distance > 0.0 {
            let delta = defender.position - attacker.position;
            // Single-argument arctangent; the quadrant collapses for
            // defenders behind the attacker, and the combat tuning is
            // calibrated against that.
            let angle_between = (delta.y / delta.x).atan();
            let half_angle = (self.cfg.player_radius / distance).min(1.0).asin();
            let defender_arc = ArcSpan::around(angle_between, half_angle);
            let attacker_arc = ArcSpan::around(attacker.angle, weapon.attack_cone);
            if !arcs_overlap(attacker_arc, defender_arc) {
                return;
            }
            self.land_hit(attacker_id, defender_id, snapshot, angle_between, weapon);
        } else {
            // Same position: no direction to miss in.
            self.land_hit(attacker_id, defender_id, snapshot, attacker.angle, weapon);
        }
    }

    fn land_hit(
        &self,
        attacker_id: PlayerId,
        defender_id: PlayerId,
        snapshot: &Snapshot,
        angle_between: f32,
        weapon: &melee_arena_protocol::WeaponStats,
    ) {
        let attacker = &snapshot.players[attacker_id.index()];
        let defender = &snapshot.players[defender_id.index()];
        let border = self.map.border();
        let knockback =
            Vec2::new(angle_between.cos(), angle_between.sin()) * weapon.knockback_power;

        let mut damage = weapon.attack_power;
        if let Some(armor) = &defender.equipment.armor {
            damage -= armor.damage_reduction();
        }
        let (killed, victim) = {
            let mut live = self.players[defender_id.index()].lock();
            let was_alive = live.hp > 0;
            live.hp -= damage;
            live.position.x = (live.position.x + knockback.x).clamp(0.0, border.x);
            live.position.y = (live.position.y + knockback.y).clamp(0.0, border.y);
            (was_alive && live.hp <= 0, live.nickname.clone())
        };

        {
            let mut live = self.players[attacker_id.index()].lock();
            live.stats.damage += damage;
            if killed {
                live.stats.kills += 1;
            }
        }

        if killed {
            if self
                .senders
                .kills
                .try_send(KillEvent {
                    killer: attacker.nickname.clone(),
                    victim,
                })
                .is_err()
            {
                log::debug!("kill event queue full, notification dropped");
            }
            let _ = self.senders.dead.try_send(defender_id);
        }
    }

    fn apply_pick_up(&self, sim: &SimState, player_id: PlayerId, item_id: u32) {
        let snapshot = sim.ring.lagged();
        let Some(snapshot_item) = snapshot.items.get(item_id as usize) else {
            return;
        };
        let snapshot_player = &snapshot.players[player_id.index()];
        if snapshot_item.position.distance(snapshot_player.position)
            > self.cfg.player_pick_up_range
        {
            return;
        }

        let picked = {
            let mut item = self.items[item_id as usize].lock();
            if item.picked_up {
                return;
            }
            item.picked_up = true;
            item.position = CARRIED_ITEM_POSITION;
            item.item
        };

        let displaced = {
            let mut player = self.players[player_id.index()].lock();
            match picked.kind() {
                EquipmentKind::Weapon => Some(mem::replace(&mut player.equipment.weapon, picked)),
                EquipmentKind::Helmet => {
                    let displaced = player.equipment.helmet.replace(picked);
                    player.hp += picked.hp_buff();
                    displaced
                }
                EquipmentKind::Armor => player.equipment.armor.replace(picked),
            }
        };

        // The swap already wrote the new item; the displaced one just goes
        // back on the ground. Intrinsic (default-rarity) gear is destroyed
        // instead of dropped.
        if let Some(displaced) = displaced {
            if displaced.rarity != Rarity::Default {
                self.release_item(snapshot, player_id, displaced);
            }
        }
    }

    fn apply_drop(&self, sim: &SimState, player_id: PlayerId, slot: EquipmentKind) {
        let snapshot = sim.ring.lagged();
        let dropped = {
            let mut player = self.players[player_id.index()].lock();
            match slot {
                EquipmentKind::Weapon => {
                    if player.equipment.weapon.rarity == Rarity::Default {
                        return;
                    }
                    Some(mem::replace(
                        &mut player.equipment.weapon,
                        self.cfg.default_weapon,
                    ))
                }
                EquipmentKind::Helmet => player.equipment.helmet.take(),
                EquipmentKind::Armor => player.equipment.armor.take(),
            }
        };
        let Some(dropped) = dropped else {
            return;
        };
        self.release_item(snapshot, player_id, dropped);
    }

    /// Puts an item back into the world `player_drop_range` ahead of the
    /// owner's lagged position and settles the helmet hp accounting.
    fn release_item(&self, snapshot: &Snapshot, player_id: PlayerId, item: EquipmentItem) {
        let owner = &snapshot.players[player_id.index()];
        let position = owner.position
            + Vec2::new(owner.angle.cos(), owner.angle.sin()) * self.cfg.player_drop_range;

        if let Some(slot) = self.items.get(item.id as usize) {
            let mut live = slot.lock();
            live.position = position;
            live.picked_up = false;
        }

        if item.kind() == EquipmentKind::Helmet {
            let mut player = self.players[player_id.index()].lock();
            player.hp -= item.hp_buff();
            if player.hp <= 0 {
                player.hp = 1;
            }
        }
    }
}
