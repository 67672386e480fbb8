//! Per-client connection records.

use melee_arena_protocol::{DecodeError, PlayerId, ServerMessage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

/// Why a Talk stream ended.
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// The client asked to leave; a normal termination.
    #[error("client requested disconnect")]
    Aborted,

    #[error("unable to receive message from client")]
    DataLoss,

    #[error("unable to reach client")]
    SendFailed,

    #[error("malformed frame: {0}")]
    Decode(#[from] DecodeError),
}

impl StreamError {
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// The live half of a Talk stream: where broadcasts go, and the signal that
/// unblocks the stream task when sending stops working.
pub struct StreamHandle {
    pub sink: mpsc::Sender<ServerMessage>,
    pub done: mpsc::Sender<StreamError>,
}

/// One registered client. Created by Connect; the stream handle comes and
/// goes with Talk attempts.
pub struct ClientConnection {
    pub player_id: PlayerId,
    pub user_id: String,
    pub nickname: String,
    pub token: Uuid,
    pub last_seen: Mutex<Instant>,
    /// Absent between reconnect attempts.
    stream: Mutex<Option<StreamHandle>>,
    /// First CONNECT notification counts toward the readiness gate.
    ready: AtomicBool,
}

impl ClientConnection {
    pub fn new(player_id: PlayerId, user_id: String, nickname: String, token: Uuid) -> Self {
        Self {
            player_id,
            user_id,
            nickname,
            token,
            last_seen: Mutex::new(Instant::now()),
            stream: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    pub fn install_stream(&self, handle: StreamHandle) {
        *self.stream.lock() = Some(handle);
    }

    pub fn clear_stream(&self) {
        *self.stream.lock() = None;
    }

    pub fn has_stream(&self) -> bool {
        self.stream.lock().is_some()
    }

    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// True the first time only.
    pub fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::SeqCst)
    }

    /// Queues a message onto the active stream, if any. A queue that is full
    /// or gone counts as a dead client: the stream task gets unblocked and
    /// the broadcast moves on.
    pub fn send(&self, message: &ServerMessage) {
        let stream = self.stream.lock();
        let Some(handle) = stream.as_ref() else {
            return;
        };
        if handle.sink.try_send(message.clone()).is_err() {
            log::warn!(
                "user{{id: {}, player: {}, nickname: {}}} - unable to reach",
                self.user_id,
                self.player_id,
                self.nickname
            );
            let _ = handle.done.try_send(StreamError::SendFailed);
        }
    }
}
