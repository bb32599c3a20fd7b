use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        extractors::{AuthUser, ValidJson},
        services::CredentialService,
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(service, payload))]
pub async fn register(
    State(service): State<CredentialService>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AuthError> {
    let res = service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(service, payload))]
pub async fn login(
    State(service): State<CredentialService>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    Ok(Json(service.login(payload).await?))
}

#[instrument(skip(service))]
pub async fn get_me(
    State(service): State<CredentialService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AuthError> {
    Ok(Json(service.profile(user_id).await?))
}
