use axum::{routing::{get, post}, Router};

pub mod auth;
pub mod notes;
pub mod system;

/// Routes behind the auth interceptor (caller may be anonymous).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/notes", notes::router())
}

/// Credential endpoints. Not behind the interceptor: a caller refreshing an
/// expired access token must not be rejected for still sending it.
pub fn auth_router() -> Router {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
}
