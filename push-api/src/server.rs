use anyhow::Result;
use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use push_core::PushContext;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing;

use crate::handlers;

pub async fn run(ctx: PushContext) -> Result<()> {
    let host = ctx.config.server.host.clone();
    let api_port = ctx.config.server.api_port;

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/hooks/events", post(handlers::db_event))
        .route("/hooks/trip-reminders", post(handlers::trip_reminders))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(ctx))
                .layer(TraceLayer::new_for_http()),
        );

    let addr: SocketAddr = format!("{}:{}", host, api_port).parse()?;
    tracing::info!("Starting webhook server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
