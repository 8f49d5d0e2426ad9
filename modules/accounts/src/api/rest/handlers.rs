use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{StatusCode, Uri},
    Json,
};
use modkit::{api::problem::ProblemResponse, Authenticated, JsonBody, Problem};
use tracing::{error, info};

use crate::api::rest::dto::{LoginReq, LoginResp, RegisterReq, UpdateMeReq, UserDto};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

/// Register a new account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "accounts.register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Conflict", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn register(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req): JsonBody<RegisterReq>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    info!(email = %req.email, "Registering account");

    match svc.register(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user.into()))),
        Err(e) => {
            error!("Failed to register account: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Exchange email and password for an API token
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    operation_id = "accounts.login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token and profile", body = LoginResp),
        (status = 400, description = "Missing or invalid credentials", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn login(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req): JsonBody<LoginReq>,
) -> Result<Json<LoginResp>, ProblemResponse> {
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    svc.login(&email, &password)
        .await
        .map(|r| Json(r.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Profile of the caller
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    operation_id = "accounts.me",
    security(("token" = [])),
    responses(
        (status = 200, description = "Caller profile", body = UserDto),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn me(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<UserDto>, ProblemResponse> {
    svc.get_user(caller.user_id)
        .await
        .map(|u| Json(u.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Update the caller's profile
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    operation_id = "accounts.update_me",
    security(("token" = [])),
    request_body = UpdateMeReq,
    responses(
        (status = 200, description = "Updated profile", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn update_me(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    JsonBody(req): JsonBody<UpdateMeReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!(user_id = caller.user_id, "Updating own profile");

    match svc.update_profile(caller.user_id, req.into()).await {
        Ok(user) => Ok(Json(user.into())),
        Err(e) => {
            error!("Failed to update profile {}: {}", caller.user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
