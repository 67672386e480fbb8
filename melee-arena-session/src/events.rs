//! Event queues bridging action resolution and the broadcast loop.
//!
//! Attack and kill queues are advisory: the hub drains them after each tick
//! into notifications, and a full queue drops the event. The dead queue is
//! sized to the player count and consumed by the tick itself to assign
//! finishing positions; a player can die only once, so it cannot fill up.

use crossbeam_channel::{bounded, Receiver, Sender};
use melee_arena_protocol::PlayerId;

const ATTACK_EVENT_CAPACITY: usize = 256;
const KILL_EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KillEvent {
    pub killer: String,
    pub victim: String,
}

/// Receiving ends handed to the component that runs the broadcast loop.
pub struct SessionEvents {
    pub attacks: Receiver<PlayerId>,
    pub kills: Receiver<KillEvent>,
}

pub(crate) struct EventSenders {
    pub attacks: Sender<PlayerId>,
    pub kills: Sender<KillEvent>,
    pub dead: Sender<PlayerId>,
}

pub(crate) fn event_channels(player_count: usize) -> (EventSenders, SessionEvents, Receiver<PlayerId>) {
    let (attack_tx, attack_rx) = bounded(ATTACK_EVENT_CAPACITY);
    let (kill_tx, kill_rx) = bounded(KILL_EVENT_CAPACITY);
    let (dead_tx, dead_rx) = bounded(player_count);
    (
        EventSenders {
            attacks: attack_tx,
            kills: kill_tx,
            dead: dead_tx,
        },
        SessionEvents {
            attacks: attack_rx,
            kills: kill_rx,
        },
        dead_rx,
    )
}
