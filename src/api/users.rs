// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::{Auth, AuthenticatedPrincipal},
    error::ApiError,
    models::{ApiResponse, UserAccount},
    state::IssuerState,
};

/// Get the current authenticated principal.
///
/// Served by both services; the principal comes from the validated token.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated principal", body = AuthenticatedPrincipal),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn current_user(Auth(principal): Auth) -> Json<ApiResponse<AuthenticatedPrincipal>> {
    Json(ApiResponse::success("Authenticated", principal))
}

/// Look up a registered user by username.
#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(("username" = String, Path, description = "Username to look up")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User found", body = UserAccount),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Auth(_principal): Auth,
    Path(username): Path<String>,
    State(state): State<IssuerState>,
) -> Result<Json<ApiResponse<UserAccount>>, ApiError> {
    let account = state
        .users
        .account(&username)
        .map_err(|error| {
            tracing::error!(error = %error, "User lookup failed");
            ApiError::internal("User lookup failed")
        })?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success("User found", account)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::issuer_state;
    use axum::http::StatusCode;

    fn principal() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            username: "user".into(),
            user_id: 1,
            roles: vec!["USER".into()],
        }
    }

    #[tokio::test]
    async fn current_user_echoes_principal() {
        let Json(body) = current_user(Auth(principal())).await;
        assert_eq!(body.data, Some(principal()));
    }

    #[tokio::test]
    async fn get_user_returns_account_without_hash() {
        let Json(body) = get_user(
            Auth(principal()),
            Path("admin".to_string()),
            State(issuer_state()),
        )
        .await
        .unwrap();

        let account = body.data.unwrap();
        assert_eq!(account.id, 2);
        assert_eq!(account.roles, vec!["USER", "ADMIN"]);
    }

    #[tokio::test]
    async fn get_unknown_user_is_404() {
        let error = get_user(
            Auth(principal()),
            Path("ghost".to_string()),
            State(issuer_state()),
        )
        .await
        .unwrap_err();
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
