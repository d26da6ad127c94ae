use anyhow::Result;
use clap::Parser;
use huddle_server::{AppState, RoomManager, SignalingService, router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle-server", about = "Signaling relay for huddle rooms")]
struct Args {
    /// Address the relay listens on.
    #[arg(long, default_value = "127.0.0.1:3333")]
    listen: SocketAddr,

    /// Seconds an empty room survives before it is closed.
    #[arg(long, default_value_t = 300)]
    room_idle_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let signaling = SignalingService::new();
    let rooms = RoomManager::new(
        Arc::new(signaling.clone()),
        Duration::from_secs(args.room_idle_secs),
    );
    let app = router(AppState { rooms, signaling });

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Relay listening on {}", args.listen);
    axum::serve(listener, app).await?;
    Ok(())
}
