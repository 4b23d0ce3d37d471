// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, registration and token verification endpoints of the issuer.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    auth::{AdminOnly, AuthError, NewUser, USER_ROLE},
    error::ApiError,
    models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserAccount, VerifyResponse},
    state::IssuerState,
};

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Access and refresh tokens", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<IssuerState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let tokens = state
        .issuer
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(ApiResponse::success(
        "Login successful",
        LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        },
    )))
}

/// Public self-registration. Always grants only the `USER` role.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "User created", body = UserAccount),
        (status = 400, description = "Missing username or password"),
        (status = 500, description = "Registration failed")
    )
)]
pub async fn register(
    State(state): State<IssuerState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserAccount>>), ApiError> {
    let user = new_user(request, vec![USER_ROLE.to_string()])?;
    let account = state.issuer.register(user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered", account)),
    ))
}

/// Admin registration. Honors the requested roles.
#[utoipa::path(
    post,
    path = "/api/admin/register",
    request_body = RegisterRequest,
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "User created", body = UserAccount),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 500, description = "Registration failed")
    )
)]
pub async fn admin_register(
    AdminOnly(admin): AdminOnly,
    State(state): State<IssuerState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserAccount>>), ApiError> {
    let roles = if request.roles.is_empty() {
        vec![USER_ROLE.to_string()]
    } else {
        request.roles.clone()
    };
    let user = new_user(request, roles)?;

    tracing::info!(admin = %admin.username, username = %user.username, "Admin registering user");
    let account = state.issuer.register(user).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered by admin", account)),
    ))
}

/// Verify a token sent as the raw request body.
///
/// A validly signed but expired token answers 401 with `valid: false` and
/// the token's details. Malformed or tampered tokens answer 401 without
/// details.
#[utoipa::path(
    post,
    path = "/api/verify",
    request_body(content = String, content_type = "text/plain", description = "Raw token"),
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Token is missing, invalid or expired", body = VerifyResponse)
    )
)]
pub async fn verify(State(state): State<IssuerState>, body: String) -> Result<Response, ApiError> {
    let token = body.trim().trim_matches('"').trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    let claims = state.codec.decode(token)?;
    if claims.sub.trim().is_empty() {
        return Err(AuthError::MissingSubject.into());
    }

    let expired = claims.is_expired_at(Utc::now().timestamp());
    let result = VerifyResponse {
        valid: !expired,
        is_refresh_token: claims.is_refresh(),
        username: Some(claims.sub.clone()),
        expiration: claims.expires_at(),
    };

    if expired {
        tracing::debug!(username = %claims.sub, "Verification of expired token");
        let body = ApiResponse::error(AuthError::TokenExpired.to_string(), Some(result));
        return Ok((StatusCode::UNAUTHORIZED, Json(body)).into_response());
    }

    Ok(Json(ApiResponse::success("Token is valid", result)).into_response())
}

fn new_user(request: RegisterRequest, roles: Vec<String>) -> Result<NewUser, ApiError> {
    let username = request.username.trim().to_string();
    if username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    Ok(NewUser {
        username,
        password: request.password,
        roles,
    })
}
