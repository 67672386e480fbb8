//! The unary Connect handshake, JSON over plain HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata header naming the connecting user.
pub const USER_ID_HEADER: &str = "user-id";
/// Metadata header carrying the stream token issued by Connect.
pub const TOKEN_HEADER: &str = "token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// The client's wall clock at send time, for the skew gate and the ping
    /// estimate.
    pub local_time: DateTime<Utc>,
    pub nickname: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    /// Estimated one-way latency, milliseconds.
    pub ping: i32,
    /// UUID the client must present on the Talk stream.
    pub token: String,
    pub server_time: DateTime<Utc>,
}
