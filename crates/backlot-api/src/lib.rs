//! # backlot-api — Axum API Services for BackLot
//!
//! The HTTP surface of the dealership back office: inventory and sales,
//! the arbitration outcome workflow, user administration, task/event
//! scheduling, and internal chat.
//!
//! ## API Surface
//!
//! | Prefix                     | Module              | Domain              |
//! |----------------------------|---------------------|---------------------|
//! | `/api/arb*`, `/api/vehicles/{id}/arb*` | [`routes::arb`]      | Arbitration workflow |
//! | `/api/vehicles*`           | [`routes::vehicles`] | Inventory & sales   |
//! | `/api/users*`              | [`routes::users`]    | User administration |
//! | `/api/tasks*`              | [`routes::tasks`]    | Scheduled tasks     |
//! | `/api/events*`             | [`routes::events`]   | Calendar events     |
//! | `/api/chat/*`              | [`routes::chat`]     | Internal chat       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI 3.1 spec via utoipa derive macros at
//! `/openapi.json`.

pub mod auth;
pub mod chat;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Authenticated API routes.
    let api = Router::new()
        .merge(routes::arb::router())
        .merge(routes::vehicles::router())
        .merge(routes::users::router())
        .merge(routes::tasks::router())
        .merge(routes::events::router())
        .merge(routes::chat::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    // Unauthenticated health probes.
    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
