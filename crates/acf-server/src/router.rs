use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{auth, chat, donations, handler};

/// Build the axum router with every pass-service endpoint.
pub fn build_router(state: AppState) -> Router {
    let image_limit = DefaultBodyLimit::max(state.max_image_bytes);
    Router::new()
        .route("/api/health", get(handler::health_handler))
        .route("/api/info", get(handler::info_handler))
        .route("/api/admin-auth", post(auth::admin_auth_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/donations", post(donations::create_donation))
        .route(
            "/api/passes/:pass_id/image",
            put(donations::upload_pass_image).layer(image_limit),
        )
        .route("/api/verify", get(donations::verify_pass))
        .route("/api/admin/donations", get(donations::list_donations))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
