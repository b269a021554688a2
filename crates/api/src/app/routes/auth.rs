use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    routing::{get, post},
    Json, Router,
};

use ers_auth::{AuthService, LoginRequest, RegisterRequest};

use crate::app::dto::{LoginResponse, MeResponse, MessageResponse};
use crate::app::errors::ApiResult;
use crate::context::PrincipalContext;

/// Unauthenticated endpoints: they are how a caller obtains a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

pub fn protected_router() -> Router {
    Router::new().route("/me", get(me))
}

pub async fn login(
    Extension(auth): Extension<Arc<AuthService>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let issued = auth.login(&req).await?;
    Ok(Json(issued.into()))
}

pub async fn register(
    Extension(auth): Extension<Arc<AuthService>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(req) = body?;
    auth.register(req).await?;
    Ok(Json(MessageResponse {
        message: "User registered successfully",
    }))
}

pub async fn me(principal: PrincipalContext) -> Json<MeResponse> {
    Json(MeResponse::from(principal.principal()))
}
