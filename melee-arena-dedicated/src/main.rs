use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use melee_arena_map::Map;
use melee_arena_server::{GameServer, MatchHandle};
use melee_arena_session::GameSession;
use melee_arena_stats::UsersServiceClient;

mod config;

use config::Args;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .format_target(false)
        .format_timestamp_micros()
        .init();
    let config = Args::parse().resolve()?;

    let map = Arc::new(
        Map::load(&config.map_file)
            .with_context(|| format!("unable to load map {}", config.map_file.display()))?,
    );
    let (session, events) = GameSession::new(config.session.clone(), map)?;
    let session = Arc::new(session);

    let (server, ready_rx) = GameServer::new(Arc::clone(&session));
    let users = Arc::new(UsersServiceClient::new(config.users.clone()));
    let handle = MatchHandle::spawn(Arc::clone(&server), events, ready_rx, users);

    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("session server listening on {addr}");

    let app = server.router();
    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            result.context("http server failed")?;
        }
        _ = handle.finished() => {
            log::info!("match complete, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, shutting down");
        }
    }

    Ok(())
}
