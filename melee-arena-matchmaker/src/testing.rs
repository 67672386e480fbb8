//! Test fixtures: a matchmaker wired to a scripted allocator.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::allocator::{AllocationError, Allocator, Endpoint};
use crate::{CacheEntry, MatchmakerConfig, MatchmakerServer, TtlCache};

pub fn test_endpoint() -> Endpoint {
    Endpoint {
        ip: "10.0.0.9".to_string(),
        port: 7777,
    }
}

/// Returns scripted outcomes in order, then the default endpoint forever.
pub struct ScriptedAllocator {
    outcomes: Mutex<VecDeque<Result<Endpoint, AllocationError>>>,
    calls: AtomicUsize,
}

impl ScriptedAllocator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn push_failure(&self) {
        self.outcomes.lock().push_back(Err(AllocationError::Status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        )));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Allocator for ScriptedAllocator {
    fn allocate(&self) -> BoxFuture<'_, Result<Endpoint, AllocationError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or(Ok(test_endpoint()));
        async move { next }.boxed()
    }
}

pub fn make_test_matchmaker() -> (Arc<MatchmakerServer>, Arc<ScriptedAllocator>) {
    let allocator = ScriptedAllocator::new();
    let cache: TtlCache<CacheEntry> = TtlCache::new();
    let server = MatchmakerServer::new(
        MatchmakerConfig {
            lobby_size: 2,
            matchmaking_delay: std::time::Duration::from_secs(2),
            match_keep: std::time::Duration::from_secs(600),
        },
        allocator.clone(),
        cache,
    );
    (server, allocator)
}
