use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no identity required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Engine routes — identity headers required; role checks live in the
    // handlers since most operations are scoped per-role.
    let api = Router::new()
        // Orders
        .route("/api/orders", get(handlers::orders::list).post(handlers::orders::create))
        .route("/api/orders/:id", get(handlers::orders::detail))
        .route("/api/orders/:id/cancel", post(handlers::orders::cancel))
        .route("/api/orders/:id/assign-rider", post(handlers::orders::assign_rider))
        .route("/api/orders/:id/rider-progress", post(handlers::orders::rider_progress))
        .route("/api/orders/:id/status", post(handlers::orders::update_status))
        // Settlement ledger
        .route("/api/transactions/all", get(handlers::transactions::list_all))
        .route("/api/transactions/user/me", get(handlers::transactions::user_me))
        .route("/api/transactions/seller/me", get(handlers::transactions::seller_me))
        .route("/api/transactions/:id/proof", post(handlers::transactions::submit_proof))
        .route("/api/transactions/:id/confirm", post(handlers::transactions::confirm))
        .route("/api/transactions/:id/admin-approve", post(handlers::transactions::admin_approve))
        .route("/api/transactions/:id/admin-success", post(handlers::transactions::admin_success))
        // Rider pool
        .route("/api/riders", get(handlers::riders::list).post(handlers::riders::create))
        .route("/api/riders/:id", put(handlers::riders::update))
        // Platform settings
        .route("/api/settings", get(handlers::settings::get).put(handlers::settings::update))
        // Shipping quote
        .route("/api/shipping/calc", post(handlers::shipping::calc));

    // CORS: the gateway proxies from the same origin; direct access still
    // carries identity headers.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
