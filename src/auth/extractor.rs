// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated principal.
//!
//! The extractors never look at the `Authorization` header. They read the
//! [`AuthenticatedPrincipal`] the authentication gate placed in the request
//! extensions, so a request can only be authenticated once.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is AuthenticatedPrincipal
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{policy, AuthError, AuthenticatedPrincipal};

/// Extractor for authenticated requests.
///
/// Rejects with 401 when the gate installed no principal, which happens on
/// public paths and under the pass-through missing-token policy.
pub struct Auth(pub AuthenticatedPrincipal);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::MissingToken)
    }
}

/// Extractor that requires the admin role.
pub struct AdminOnly(pub AuthenticatedPrincipal);

impl<S: Send + Sync> FromRequestParts<S> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(principal) = Auth::from_request_parts(parts, state).await?;
        policy::require_admin(&principal)?;
        Ok(AdminOnly(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, Request};

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn principal(roles: &[&str]) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            username: "user".to_string(),
            user_id: 5,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn auth_requires_principal() {
        let result = Auth::from_request_parts(&mut parts(), &()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn auth_ignores_raw_header() {
        let mut parts = Request::builder()
            .uri("/test")
            .header(AUTHORIZATION, "Bearer some.raw.token")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn auth_reads_extensions() {
        let mut parts = parts();
        parts.extensions.insert(principal(&["USER"]));

        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.username, "user");
        assert_eq!(found.user_id, 5);
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let mut parts = parts();
        parts.extensions.insert(principal(&["USER"]));

        let result = AdminOnly::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::InsufficientRole(role)) if role == "admin"));
    }

    #[tokio::test]
    async fn admin_only_accepts_uppercase_admin_role() {
        let mut parts = parts();
        parts.extensions.insert(principal(&["USER", "ADMIN"]));

        assert!(AdminOnly::from_request_parts(&mut parts, &()).await.is_ok());
    }

    #[tokio::test]
    async fn admin_only_without_principal_is_401() {
        let result = AdminOnly::from_request_parts(&mut parts(), &()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }
}
