mod connections;
mod context;
mod errors;
mod gateway;
mod schemas;
mod serialized;

use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::http::Method;
use log::info;
use stranger_core::Matchmaker;
use tokio::{net::TcpListener, time::interval};
use tower_http::cors::{Any, CorsLayer};

pub use connections::Connections;
pub use context::ServerContext;
pub use errors::FrameError;
pub use serialized::{ServerEvent, SYSTEM_SENDER};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 3001;

pub type Router = axum::Router<ServerContext>;

/// The configuration of the transport
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Also send rejections as plain system messages, for clients that predate `join_rejected`
    pub legacy_system_messages: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            legacy_system_messages: true,
        }
    }
}

/// Builds the router with every route the server exposes.
pub fn router(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .nest("/v1", gateway::router())
        .layer(cors)
        .with_state(context)
}

/// Starts the stranger server and runs until it fails.
pub async fn run_server(matchmaker: Arc<Matchmaker>, config: ServerConfig) -> io::Result<()> {
    let connections = Connections::new(config.legacy_system_messages);
    connections.spawn_dispatcher(matchmaker.events());

    tokio::spawn(sweep_ledger(matchmaker.clone()));

    let context = ServerContext {
        matchmaker,
        connections,
    };

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("SERVER RUNNING on port {}", config.port);

    axum::serve(listener, router(context)).await
}

/// Periodically drops usage records from previous days.
async fn sweep_ledger(matchmaker: Arc<Matchmaker>) {
    let mut ticker = interval(matchmaker.config().ledger_sweep_interval);

    loop {
        ticker.tick().await;

        let evicted = matchmaker.evict_stale_usage();

        if evicted > 0 {
            info!("Evicted {} stale usage records", evicted);
        }
    }
}
