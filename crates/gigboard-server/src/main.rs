use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use gigboard_db::AppState;

mod api;
mod error;

#[derive(Serialize)]
struct ApiStatus {
    name: &'static str,
    status: &'static str,
    version: &'static str,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Database connection
    let db_config = gigboard_db::DatabaseConfig::from_env();
    tracing::info!("connecting to database...");
    let db = gigboard_db::connect(&db_config)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("running database migrations...");
    gigboard_migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    tracing::info!("migrations complete");

    let state = Arc::new(AppState { db });

    let venue_routes = Router::new()
        .route("/venues", get(api::venues::list_venues))
        .route("/venues/search", post(api::venues::search_venues))
        .route(
            "/venues/{id}",
            get(api::venues::get_venue).delete(api::venues::delete_venue),
        )
        .route("/venues/create", post(api::venues::create_venue))
        .route("/venues/{id}/edit", post(api::venues::update_venue));

    // No DELETE route here: artist deletion has no external surface.
    let artist_routes = Router::new()
        .route("/artists", get(api::artists::list_artists))
        .route("/artists/search", post(api::artists::search_artists))
        .route("/artists/{id}", get(api::artists::get_artist))
        .route("/artists/create", post(api::artists::create_artist))
        .route("/artists/{id}/edit", post(api::artists::update_artist));

    let show_routes = Router::new()
        .route("/shows", get(api::shows::list_shows))
        .route("/shows/create", post(api::shows::create_show));

    // CORS configuration — restrict to configured origins
    let cors = {
        let allowed_origins_str = std::env::var("CORS_ORIGINS").unwrap_or_default();
        if allowed_origins_str.is_empty() {
            tracing::warn!(
                "CORS_ORIGINS not set — allowing any origin. \
                 Set CORS_ORIGINS=https://gigboard.example for production."
            );
            CorsLayer::permissive()
        } else {
            let origins: Vec<HeaderValue> = allowed_origins_str
                .split(',')
                .filter_map(|s| HeaderValue::from_str(s.trim()).ok())
                .collect();
            tracing::info!("CORS allowed origins: {:?}", origins);
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                ])
                .allow_headers(tower_http::cors::Any)
        }
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .merge(venue_routes)
        .merge(artist_routes)
        .merge(show_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "server started");

    axum::serve(
        tokio::net::TcpListener::bind(addr).await.expect("bind"),
        app,
    )
    .await
    .expect("server error");
}

/// Landing payload; the rendered home page belongs to the frontend.
async fn index() -> Json<ApiStatus> {
    Json(ApiStatus {
        name: "gigboard",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        name: "gigboard",
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
