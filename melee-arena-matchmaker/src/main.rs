use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use melee_arena_matchmaker::api::{router, ApiState};
use melee_arena_matchmaker::{
    spawn_sweeper, HttpAllocator, MatchmakerConfig, MatchmakerServer, StaticAllocator,
    TokenValidator, TtlCache,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Gateway bind address.
    #[clap(long = "matchmaker.server.address", env = "MATCHMAKER_SERVER_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// Gateway port.
    #[clap(long = "matchmaker.server.port", env = "MATCHMAKER_SERVER_PORT", default_value = "8080")]
    port: u16,

    /// Players per match.
    #[clap(long = "matchmaker.lobby.size", env = "MATCHMAKER_LOBBY_SIZE", default_value = "2")]
    lobby_size: usize,

    /// Seconds between attempts to form a lobby.
    #[clap(long = "matchmaker.lobby.delay", env = "MATCHMAKER_LOBBY_DELAY", default_value = "2")]
    lobby_delay_secs: u64,

    /// Seconds a match allocation stays claimable.
    #[clap(long = "matchmaker.match.expiration", env = "MATCHMAKER_MATCH_EXPIRATION", default_value = "120")]
    match_expiration_secs: u64,

    /// Seconds between cache sweeps.
    #[clap(long = "matchmaker.match.cleanup", env = "MATCHMAKER_MATCH_CLEANUP", default_value = "300")]
    match_cleanup_secs: u64,

    /// Fleet allocator URL; without one a fixed local endpoint is handed
    /// out.
    #[clap(long = "matchmaker.allocator.url", env = "MATCHMAKER_ALLOCATOR_URL")]
    allocator_url: Option<String>,

    /// HMAC key for JWT verification; without one tokens are accepted
    /// unverified, as legacy clients require.
    #[clap(long = "matchmaker.auth.hmac_key", env = "MATCHMAKER_AUTH_HMAC_KEY")]
    hmac_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .format_target(false)
        .format_timestamp_micros()
        .init();
    let args = Args::parse();

    let cache = TtlCache::new();
    let _sweeper_guard = spawn_sweeper(
        cache.clone(),
        Duration::from_secs(args.match_cleanup_secs),
    );

    let allocator: Arc<dyn melee_arena_matchmaker::Allocator> = match &args.allocator_url {
        Some(url) => Arc::new(HttpAllocator::new(url.clone())),
        None => Arc::new(StaticAllocator::default()),
    };
    let validator = match &args.hmac_key {
        Some(key) => TokenValidator::with_hmac_key(key.as_bytes().to_vec()),
        None => TokenValidator::unverified(),
    };

    let server = MatchmakerServer::new(
        MatchmakerConfig {
            lobby_size: args.lobby_size,
            matchmaking_delay: Duration::from_secs(args.lobby_delay_secs),
            match_keep: Duration::from_secs(args.match_expiration_secs),
        },
        allocator,
        cache,
    );
    let _packer_guard = server.spawn_packer();

    let addr = SocketAddr::new(
        std::net::IpAddr::from_str(&args.address)?,
        args.port,
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("matchmaker listening on {addr}");
    let state = Arc::new(ApiState { server, validator });
    axum::serve(listener, router(state)).await?;

    Ok(())
}
