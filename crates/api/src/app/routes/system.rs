use axum::{http::StatusCode, Json};

use crate::app::dto::WhoAmIResponse;
use crate::context::Caller;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Caller(identity): Caller) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::from(&identity))
}
