//! The stream hub for one match: the Connect handshake, the Talk WebSocket
//! carrying binary protocol frames, and broadcast fan-out to every client
//! with an active stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::{SinkExt, StreamExt};
use melee_arena_protocol::{
    decode, encode, ClientMessage, ClientNotification, ConnectRequest, ConnectResponse, PlayerId,
    ServerBody, ServerMessage, ServerNotification, TOKEN_HEADER, USER_ID_HEADER,
};
use melee_arena_session::GameSession;
use parking_lot::{Mutex, RwLock};
use tokio::select;
use tokio::sync::mpsc;
use uuid::Uuid;

pub mod client;
pub mod error;
pub mod lifecycle;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests {
    mod broadcast;
    mod connect;
    mod lifecycle;
}

pub use client::{ClientConnection, StreamError, StreamHandle};
pub use error::ServiceError;
pub use lifecycle::MatchHandle;

/// Connect is rejected when the client's clock is further off than this.
const MAX_CLOCK_SKEW_MS: i64 = 500;
/// Outbound queue per stream; a client this far behind is presumed gone.
const STREAM_SINK_CAPACITY: usize = 64;

pub struct GameServer {
    session: Arc<GameSession>,
    clients: RwLock<HashMap<Uuid, Arc<ClientConnection>>>,
    client_count: Mutex<usize>,
    game_ongoing: AtomicBool,
    ready_tx: mpsc::Sender<PlayerId>,
}

impl GameServer {
    /// Builds the hub. The returned receiver yields one permit per client
    /// whose first CONNECT notification arrived; the match lifecycle waits
    /// on it.
    pub fn new(session: Arc<GameSession>) -> (Arc<Self>, mpsc::Receiver<PlayerId>) {
        let player_count = session.config().player_count;
        let (ready_tx, ready_rx) = mpsc::channel(player_count);
        (
            Arc::new(Self {
                session,
                clients: RwLock::new(HashMap::new()),
                client_count: Mutex::new(0),
                game_ongoing: AtomicBool::new(false),
                ready_tx,
            }),
            ready_rx,
        )
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/v1/connect", post(connect))
            .route("/v1/talk", get(talk))
            .with_state(Arc::clone(self))
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    pub fn clients(&self) -> Vec<Arc<ClientConnection>> {
        self.clients.read().values().cloned().collect()
    }

    pub fn client_by_token(&self, token: &Uuid) -> Option<Arc<ClientConnection>> {
        self.clients.read().get(token).cloned()
    }

    pub fn game_ongoing(&self) -> bool {
        self.game_ongoing.load(Ordering::SeqCst)
    }

    pub fn set_game_ongoing(&self, ongoing: bool) {
        self.game_ongoing.store(ongoing, Ordering::SeqCst);
    }

    /// Registers a client and assigns the next player id, in Connect order.
    fn register_client(
        &self,
        user_id: String,
        nickname: String,
    ) -> Result<Arc<ClientConnection>, ServiceError> {
        let mut count = self.client_count.lock();
        if *count >= self.session.config().player_count {
            return Err(ServiceError::SessionFull);
        }
        let player_id = PlayerId::from_index(*count);
        *count += 1;

        let token = Uuid::new_v4();
        let client = Arc::new(ClientConnection::new(player_id, user_id, nickname, token));
        self.clients.write().insert(token, Arc::clone(&client));
        Ok(client)
    }

    pub fn broadcast_notification(&self, notification: ServerNotification) {
        self.broadcast(ServerMessage {
            server_time: server_time_nanos(),
            body: ServerBody::Notification(notification),
        });
    }

    /// Publishes the lagged snapshot, the same state action handlers see.
    pub fn broadcast_game_state(&self) {
        self.broadcast(ServerMessage {
            server_time: server_time_nanos(),
            body: ServerBody::GameState(self.session.lagged_state()),
        });
    }

    fn broadcast(&self, message: ServerMessage) {
        for client in self.clients.read().values() {
            client.send(&message);
        }
    }

    async fn run_stream(self: Arc<Self>, client: Arc<ClientConnection>, socket: WebSocket) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (sink_tx, mut sink_rx) = mpsc::channel::<ServerMessage>(STREAM_SINK_CAPACITY);
        let (done_tx, mut done_rx) = mpsc::channel::<StreamError>(1);
        client.install_stream(StreamHandle {
            sink: sink_tx,
            done: done_tx,
        });

        self.broadcast_notification(ServerNotification::PlayerConnected {
            nickname: client.nickname.clone(),
        });

        let writer = tokio::spawn(async move {
            while let Some(message) = sink_rx.recv().await {
                if ws_tx.send(Message::Binary(encode(&message))).await.is_err() {
                    break;
                }
            }
        });

        let error = loop {
            select! {
                biased;

                Some(error) = done_rx.recv() => break error,

                incoming = ws_rx.next() => {
                    let message = match incoming {
                        Some(Ok(Message::Binary(data))) => {
                            client.touch();
                            match decode::<ClientMessage>(&data) {
                                Ok(message) => message,
                                Err(e) => break StreamError::Decode(e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break StreamError::Aborted,
                        Some(Ok(_)) => continue,
                        Some(Err(_)) => break StreamError::DataLoss,
                    };
                    match message {
                        ClientMessage::Notification(ClientNotification::Connect) => {
                            log::info!("player with user id {} has connected", client.user_id);
                            if client.mark_ready() {
                                let _ = self.ready_tx.try_send(client.player_id);
                            }
                        }
                        ClientMessage::Notification(ClientNotification::Disconnect) => {
                            log::info!("player with user id {} has disconnected", client.user_id);
                            break StreamError::Aborted;
                        }
                        ClientMessage::Action(action) => {
                            if self.game_ongoing() {
                                self.session.apply_action(client.player_id, action);
                            }
                        }
                    }
                }
            }
        };

        client.clear_stream();
        writer.abort();
        self.broadcast_notification(ServerNotification::PlayerDisconnected {
            nickname: client.nickname.clone(),
        });
        if !error.is_abort() {
            log::error!(
                "stream for {} ended with error: {error}",
                client.player_id
            );
        }
    }
}

/// The unary handshake: validates identity and clock skew, mints a stream
/// token and assigns the player slot.
async fn connect(
    State(server): State<Arc<GameServer>>,
    headers: HeaderMap,
    Json(request): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ServiceError> {
    let receive_time = Utc::now();

    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ServiceError::MissingUserId)?;

    if receive_time.signed_duration_since(request.local_time)
        > ChronoDuration::milliseconds(MAX_CLOCK_SKEW_MS)
    {
        return Err(ServiceError::ClockSkew);
    }

    let client = server.register_client(user_id.to_string(), request.nickname.clone())?;
    log::info!("player with user id {user_id} has registered");

    Ok(Json(ConnectResponse {
        ping: compute_ping(receive_time, request.local_time),
        token: client.token.to_string(),
        server_time: receive_time,
    }))
}

/// Subsecond-nanos difference in whole milliseconds. The value goes
/// negative when the two clocks straddle a second boundary.
fn compute_ping(server: DateTime<Utc>, client: DateTime<Utc>) -> i32 {
    let delta =
        i64::from(server.timestamp_subsec_nanos()) - i64::from(client.timestamp_subsec_nanos());
    (delta as f64 / 1_000_000.0) as i32
}

/// Upgrades to the bidirectional stream after token authentication.
async fn talk(
    State(server): State<Arc<GameServer>>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Result<Response, ServiceError> {
    let raw = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServiceError::MissingToken)?;
    let token = Uuid::parse_str(raw).map_err(|_| ServiceError::InvalidToken)?;
    let client = server
        .client_by_token(&token)
        .ok_or(ServiceError::InvalidToken)?;

    Ok(ws.on_upgrade(move |socket| server.run_stream(client, socket)))
}

fn server_time_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
