//! The rotating ring of past game states.
//!
//! Every tick deep-copies the live world into a fresh [`Snapshot`] and
//! rotates it in. Action handlers never read live state for their *checks*;
//! they read the snapshot `shift_back` slots from the tail, which is the
//! authoritative past used for lag compensation.

use std::collections::VecDeque;
use std::sync::Arc;

use melee_arena_geom::sweep::Event;
use melee_arena_protocol::{DroppedItem, Player, PlayerId};

/// An immutable deep copy of the world at the end of one tick.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub players: Vec<Player>,
    pub items: Vec<DroppedItem>,
    /// Player X-interval events, stably sorted by value, for sweep pruning
    /// during attack resolution.
    pub sorted_players: Vec<Event<PlayerId>>,
    pub players_left: u32,
}

/// Fixed-length sequence of snapshots. Oldest at the head, newest at the
/// tail; the length never changes after seeding.
pub struct SnapshotRing {
    snapshots: VecDeque<Arc<Snapshot>>,
    shift_back: usize,
}

impl SnapshotRing {
    /// Fills the ring with `len` copies of `initial`.
    pub fn seeded(initial: Snapshot, len: usize, shift_back: usize) -> Self {
        assert!(len >= 1);
        assert!(shift_back >= 1 && shift_back <= len);
        let snapshot = Arc::new(initial);
        Self {
            snapshots: (0..len).map(|_| Arc::clone(&snapshot)).collect(),
            shift_back,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshot action handlers resolve against.
    pub fn lagged(&self) -> &Arc<Snapshot> {
        &self.snapshots[self.snapshots.len() - self.shift_back]
    }

    /// The snapshot of the just-previous tick, used to revert positions that
    /// ended up inside an obstacle.
    pub fn latest(&self) -> &Arc<Snapshot> {
        self.snapshots.back().expect("ring is never empty")
    }

    /// Drops the oldest snapshot and appends the new one.
    pub fn rotate(&mut self, next: Snapshot) {
        self.snapshots.pop_front();
        self.snapshots.push_back(Arc::new(next));
    }
}
