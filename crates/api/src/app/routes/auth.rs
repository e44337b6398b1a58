use std::sync::Arc;

use axum::{extract::Extension, Json};

use crate::app::dto::{LoginRequest, RefreshRequest, TokenPairResponse};
use crate::app::errors::TransportStatus;
use crate::app::services::AppServices;
use crate::extract::ApiJson;

/// POST /auth/login - exchange login id + secret for a token pair
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, TransportStatus> {
    let pair = services
        .credentials
        .issue_for_credentials(&body.login_id, &body.secret)
        .await?;
    Ok(Json(pair.into()))
}

/// POST /auth/refresh - exchange a refresh token for a new pair
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, TransportStatus> {
    let pair = services.credentials.refresh(&body.refresh_token)?;
    Ok(Json(pair.into()))
}
