// routes.rs
use axum::{
    routing::{get, post},
    Router,
};
use http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .nest("/api/auth", auth_routes())
        .nest("/api/polls", poll_routes())
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

fn poll_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_polls).post(handlers::create_poll))
        .route(
            "/{id}",
            get(handlers::get_poll)
                .put(handlers::update_poll)
                .delete(handlers::delete_poll),
        )
        .route("/{id}/vote", post(handlers::vote))
}

/// Allow the configured origin, or any origin when none is set.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => {
            if let Some(bad) = origin {
                tracing::warn!(origin = bad, "ignoring unparsable CORS origin");
            }
            cors.allow_origin(Any)
        }
    }
}
