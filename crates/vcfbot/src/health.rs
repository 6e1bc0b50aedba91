//! Keep-alive endpoint for hosts that expect the process to answer HTTP.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get, Router};

async fn alive() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Bot is alive!")
}

pub fn app() -> Router {
    Router::new().route("/", get(alive))
}

pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("keep-alive endpoint listening on http://{addr}");
    axum::serve(listener, app()).await?;
    Ok(())
}
