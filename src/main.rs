use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use movie_db_api::config;
use movie_db_api::database::Store;
use movie_db_api::handlers::{movies, users, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up MONGODB_URI, PORT, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("Starting movie-db API in {:?} mode", config.environment);

    // The driver connects lazily; an unreachable server surfaces on the
    // first request, not here. Only a malformed URI is fatal.
    let store = Store::connect(&config.database).await?;
    let app = app(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("movie-db API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Listings
        .route("/", get(movies::list_all))
        .route("/movies", get(movies::list_movies))
        .route("/movies/featured", get(movies::featured))
        .route("/movies/top-rated", get(movies::top_rated))
        .route("/movies/my-collection", get(movies::my_collection))
        // Single-movie operations
        .route("/movies/:id", get(movies::get_movie))
        .route("/movies/add", post(movies::add_movie))
        .route("/movies/update/:id", put(movies::update_movie))
        .route("/movies/delete/:id", delete(movies::delete_movie))
        .route("/movies/:id/watchlist", patch(movies::toggle_watchlist))
        // Misc
        .route("/users", get(users::user_count))
        .route("/health", get(health))
        .with_state(state)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
