// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication and authorization error type.
///
/// Token problems surface as 401, role and ownership problems as 403.
/// Messages are safe to return to clients: they never carry token
/// material, secrets, or internal error chains.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No bearer token on a request that requires one
    #[error("Token not provided")]
    MissingToken,
    /// Token structure or encoding is invalid
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature does not match (tampered or wrong secret)
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// Token signature is valid but it is past its expiration
    #[error("Token has expired")]
    TokenExpired,
    /// Token carries no username
    #[error("Token does not identify a user")]
    MissingSubject,
    /// The issuing service reported the token as not valid
    #[error("Token was rejected by the issuing service")]
    TokenRejected,
    /// The issuing service could not be reached or answered with an error
    #[error("Token could not be verified by the issuing service")]
    RemoteVerificationUnavailable,
    /// Login failed
    #[error("Invalid credentials")]
    CredentialsInvalid,
    /// Authenticated, but lacking the required role
    #[error("Role '{0}' is required for this operation")]
    InsufficientRole(String),
    /// Authenticated, but not the owner of the resource
    #[error("Only the owner of this resource may perform this operation")]
    NotOwner,
    /// User creation failed on the persistence side
    #[error("User registration failed")]
    RegistrationFailed,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingSubject => "missing_subject",
            AuthError::TokenRejected => "token_rejected",
            AuthError::RemoteVerificationUnavailable => "remote_verification_unavailable",
            AuthError::CredentialsInvalid => "invalid_credentials",
            AuthError::InsufficientRole(_) => "insufficient_role",
            AuthError::NotOwner => "not_owner",
            AuthError::RegistrationFailed => "registration_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::MissingSubject
            | AuthError::TokenRejected
            | AuthError::RemoteVerificationUnavailable
            | AuthError::CredentialsInvalid => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole(_) | AuthError::NotOwner => StatusCode::FORBIDDEN,
            AuthError::RegistrationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_token_returns_401() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_code"], "missing_token");
        assert_eq!(body["message"], "Token not provided");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn insufficient_role_returns_403() {
        let response = AuthError::InsufficientRole("admin".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn token_failures_share_one_status() {
        for error in [
            AuthError::MalformedToken,
            AuthError::SignatureInvalid,
            AuthError::TokenExpired,
            AuthError::TokenRejected,
            AuthError::RemoteVerificationUnavailable,
        ] {
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED, "{error}");
        }
    }

    #[test]
    fn authorization_failures_are_403() {
        assert_eq!(AuthError::NotOwner.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::RegistrationFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
