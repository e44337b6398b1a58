//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: identity store, credential service, authorizer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `notes.rs`: the `notes` resource model, store and permissions
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: domain error → transport status translation

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod notes;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = services.auth_state();

    // Intercepted routes: every call gets a CallState (real or anonymous identity).
    let intercepted = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth_router())
        .merge(intercepted)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

pub use services::{build_services, AppServices};
