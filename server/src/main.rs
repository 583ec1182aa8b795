use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post, put},
};
use logbook_data_management::DataManager;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod server_state;

use server_state::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all("server/log")?;
    let log_file = "server/log/server.log";

    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let data_manager = DataManager::start().await?;

    let server_state = Arc::new(ServerState { data_manager });

    let app = Router::new()
        .nest_service("/frontend/dist", ServeDir::new("frontend/dist"))
        .fallback_service(ServeFile::new("frontend/dist/index.html"))
        .route("/api/tracking/start", post(api::tracking::start_tracking))
        .route(
            "/api/tracking/{session_id}/point",
            post(api::tracking::append_point),
        )
        .route(
            "/api/tracking/{session_id}/stop",
            post(api::tracking::stop_tracking),
        )
        .route("/api/tracking/{session_id}", get(api::tracking::get_session))
        .route(
            "/api/trips",
            get(api::trips::list_trips).post(api::trips::create_trip),
        )
        .route(
            "/api/trips/from_session/{session_id}",
            post(api::trips::create_trip_from_session),
        )
        .route(
            "/api/trips/{trip_id}",
            get(api::trips::get_trip)
                .put(api::trips::update_trip)
                .delete(api::trips::delete_trip),
        )
        .route(
            "/api/boats",
            get(api::boats::list_boats).post(api::boats::create_boat),
        )
        .route(
            "/api/boats/{boat_id}",
            put(api::boats::update_boat).delete(api::boats::delete_boat),
        )
        .with_state(server_state);

    let addr: SocketAddr = std::env::var("LOGBOOK_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
