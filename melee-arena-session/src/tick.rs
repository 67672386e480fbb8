//! The fixed-rate simulation step.

use melee_arena_geom::sweep::{self, Event};
use melee_arena_geom::{sat, Circle};
use melee_arena_protocol::{DroppedItem, Player};

use crate::snapshot::Snapshot;
use crate::GameSession;

/// Whether the match continues after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// One or zero players remain alive. The terminating tick still produced
    /// its snapshot.
    Finished,
}

impl GameSession {
    /// Advances the world one step under the exclusive session lock: assigns
    /// finishing positions for players killed since the last tick, resolves
    /// player bodies against the static geometry, deep-copies the world into
    /// a fresh snapshot and rotates the ring.
    pub fn tick(&self) -> TickOutcome {
        let mut sim = self.sim.write();

        // Deaths recorded by action handlers since the last tick. The first
        // to die in an N-player match finishes Nth.
        while let Ok(dead_id) = self.dead_rx.try_recv() {
            let mut player = self.players[dead_id.index()].lock();
            if player.placement.is_none() {
                player.placement = Some(sim.players_left);
                sim.players_left = sim.players_left.saturating_sub(1);
                log::info!("{} eliminated, finishing {}", player.nickname, sim.players_left + 1);
            }
        }

        let r = self.cfg.player_radius;
        let mut sorted_players: Vec<Event<_>> = Vec::with_capacity(self.players.len() * 2);
        let mut players: Vec<Player> = Vec::with_capacity(self.players.len());
        let mut alive = 0u32;

        for (index, slot) in self.players.iter().enumerate() {
            let mut player = slot.lock();
            let min = player.position.x - r;
            let max = player.position.x + r;

            let body = Circle::new(player.position, r);
            for obstacle_id in self.map.obstacles_in_x_range(min, max) {
                if sat::circle_overlaps_polygon(body, self.map.obstacle(obstacle_id)) {
                    player.position = sim.ring.latest().players[index].position;
                    break;
                }
            }

            if player.hp > 0 {
                alive += 1;
            }
            sorted_players.extend(Event::pair(player.id, min, max));
            players.push(player.clone());
        }
        sweep::sort_events(&mut sorted_players);

        let finished = alive < 2;
        if finished {
            // Last one standing wins.
            for (index, player) in players.iter_mut().enumerate() {
                if player.hp > 0 && player.placement.is_none() {
                    player.placement = Some(1);
                    self.players[index].lock().placement = Some(1);
                }
            }
        }

        let items: Vec<DroppedItem> = self.items.iter().map(|slot| slot.lock().clone()).collect();
        let players_left = sim.players_left;
        sim.ring.rotate(Snapshot {
            players,
            items,
            sorted_players,
            players_left,
        });

        if finished {
            TickOutcome::Finished
        } else {
            TickOutcome::Running
        }
    }
}
