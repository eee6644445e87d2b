use chat_server::{AppState, Config, app, init_logging, shutdown_on};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = Config::parse();
    init_logging(&cfg.log_level);

    let backend = cfg.backend()?;
    info!(backend = backend.name(), "inference backend ready");
    let state = AppState::new(backend, &cfg.settings());
    let app = app(state);

    let addr: SocketAddr = cfg.addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;
    info!("server stopped");
    Ok(())
}
