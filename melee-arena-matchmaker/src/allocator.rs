//! Reservation of a session-server instance for a formed lobby.
//!
//! The real fleet allocator is an external service; everything here is just
//! the call surface plus the local-development fallback.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: String,
    pub port: u16,
}

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("allocator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("allocator answered {0}")]
    Status(reqwest::StatusCode),
}

pub trait Allocator: Send + Sync {
    /// Reserves one game-server instance and returns its public endpoint.
    fn allocate(&self) -> BoxFuture<'_, Result<Endpoint, AllocationError>>;
}

/// Hands out a fixed endpoint. Stands in for the fleet when no allocator is
/// configured, e.g. for local development.
pub struct StaticAllocator {
    endpoint: Endpoint,
}

impl StaticAllocator {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl Default for StaticAllocator {
    fn default() -> Self {
        Self::new(Endpoint {
            ip: "127.0.0.1".to_string(),
            port: 12345,
        })
    }
}

impl Allocator for StaticAllocator {
    fn allocate(&self) -> BoxFuture<'_, Result<Endpoint, AllocationError>> {
        async move { Ok(self.endpoint.clone()) }.boxed()
    }
}

#[derive(Deserialize)]
struct AllocateResponse {
    address: String,
    port: u16,
}

/// Calls an HTTP fleet allocator: `POST {url}` answering
/// `{"address": ..., "port": ...}`.
pub struct HttpAllocator {
    url: String,
    http: reqwest::Client,
}

impl HttpAllocator {
    pub fn new(url: String) -> Self {
        Self {
            url,
            http: reqwest::Client::new(),
        }
    }
}

impl Allocator for HttpAllocator {
    fn allocate(&self) -> BoxFuture<'_, Result<Endpoint, AllocationError>> {
        async move {
            let response = self.http.post(&self.url).send().await?;
            if !response.status().is_success() {
                return Err(AllocationError::Status(response.status()));
            }
            let body: AllocateResponse = response.json().await?;
            Ok(Endpoint {
                ip: body.address,
                port: body.port,
            })
        }
        .boxed()
    }
}
