//! The match state machine: awaiting clients → running → finished.

use std::sync::Arc;

use melee_arena_protocol::{PlayerId, ServerNotification};
use melee_arena_session::{SessionEvents, TickOutcome};
use melee_arena_stats::{PlayerResult, UsersServiceClient};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::GameServer;

/// Handle on a spawned match task. Dropping it tears the match down; the
/// owner usually just waits for [`MatchHandle::finished`].
pub struct MatchHandle {
    _cancel_guard: cancel::Guard,
    finished: cancel::Token,
}

impl MatchHandle {
    /// Spawns the lifecycle task for a constructed hub.
    pub fn spawn(
        server: Arc<GameServer>,
        events: SessionEvents,
        ready_rx: mpsc::Receiver<PlayerId>,
        users: Arc<UsersServiceClient>,
    ) -> Self {
        let cancel_token = cancel::Token::new();
        let finished = cancel::Token::new();
        tokio::spawn(run_match(
            server,
            events,
            ready_rx,
            users,
            cancel_token.clone(),
            finished.clone(),
        ));
        Self {
            _cancel_guard: cancel_token.guard(),
            finished,
        }
    }

    /// Resolves when the match has finished and results are published.
    pub async fn finished(&self) {
        self.finished.cancelled().await;
    }
}

async fn run_match(
    server: Arc<GameServer>,
    events: SessionEvents,
    mut ready_rx: mpsc::Receiver<PlayerId>,
    users: Arc<UsersServiceClient>,
    cancel_token: cancel::Token,
    finished: cancel::Token,
) {
    let session = Arc::clone(server.session());
    let player_count = session.config().player_count;

    // Awaiting clients: one permit per distinct client's CONNECT.
    let mut ready = 0;
    while ready < player_count {
        select! {
            biased;

            _ = cancel_token.cancelled() => return,

            permit = ready_rx.recv() => match permit {
                Some(player_id) => {
                    log::info!("{player_id} ready ({}/{player_count})", ready + 1);
                    ready += 1;
                }
                None => return,
            },
        }
    }

    // All seats taken: bind identities, re-seed the ring, open play.
    for client in server.clients() {
        session.set_player_identity(client.player_id, &client.user_id, &client.nickname);
    }
    session.reset_ring();
    server.set_game_ongoing(true);
    server.broadcast_notification(ServerNotification::GameStarted);
    log::info!("match started with {player_count} players");

    let mut ticker = interval(session.config().tick_interval());
    // A late tick is just late; there is no catch-up burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            biased;

            _ = cancel_token.cancelled() => return,

            _ = ticker.tick() => {}
        }

        let outcome = session.tick();
        server.broadcast_game_state();
        while let Ok(attacker) = events.attacks.try_recv() {
            server.broadcast_notification(ServerNotification::PlayerAttacked { player: attacker });
        }
        while let Ok(kill) = events.kills.try_recv() {
            server.broadcast_notification(ServerNotification::PlayerKilled {
                killer: kill.killer,
                victim: kill.victim,
            });
        }
        if outcome == TickOutcome::Finished {
            break;
        }
    }

    server.set_game_ongoing(false);
    server.broadcast_notification(ServerNotification::GameFinished);
    log::info!("match finished");

    let results: Vec<PlayerResult> = session
        .live_players()
        .into_iter()
        .map(|player| PlayerResult {
            user_id: player.user_id,
            nickname: player.nickname,
            placement: player.placement,
            kills: player.stats.kills,
            damage: player.stats.damage,
        })
        .collect();
    users.publish_results(&results).await;

    finished.cancel();
}
