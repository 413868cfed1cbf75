pub mod auth;
pub mod health;
pub mod metrics;
pub mod receipts;
pub mod templates;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{middleware::auth::auto_refresh, AppState};

/// Builds the full route tree. Everything registered on `protected` sits behind
/// the auto-refresh gate; the rest is public.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/receipts", post(receipts::create_receipt))
        .route("/receipts/all", get(receipts::list_receipts))
        .route("/receipts/stats", get(receipts::receipt_stats))
        .route(
            "/receipt_template",
            get(templates::get_template)
                .post(templates::create_template)
                .patch(templates::update_template)
                .delete(templates::delete_template),
        )
        .route_layer(from_fn_with_state(state.clone(), auto_refresh));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Auth
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}
