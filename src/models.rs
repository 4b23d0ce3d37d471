// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response data structures used by both services. Every JSON
//! response is wrapped in an [`ApiResponse`] envelope:
//!
//! ```json
//! { "status": "success", "message": "...", "data": { ... } }
//! ```
//!
//! ## Model Categories
//!
//! - **Credentials**: login and registration payloads
//! - **Tokens**: login response and verification result
//! - **Tasks**: owned resources served by the consuming service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::UserId;

/// Identifier of an owned resource.
pub type ResourceId = i64;

// =============================================================================
// Response Envelope
// =============================================================================

/// Outcome marker carried in every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

// =============================================================================
// Credential Models
// =============================================================================

/// Login request body.
#[derive(Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration request body.
///
/// `roles` is honored only on the admin registration route; public
/// registration always grants the `USER` role.
#[derive(Clone, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

/// A registered user account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub roles: Vec<String>,
}

// =============================================================================
// Token Models
// =============================================================================

/// Tokens returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of the token verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub is_refresh_token: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl VerifyResponse {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            is_refresh_token: false,
            username: None,
            expiration: None,
        }
    }
}

// =============================================================================
// Task Models
// =============================================================================

/// A task owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub owner_id: UserId,
}

/// Create a task owned by the caller.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial task update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_lowercase_status() {
        let body = ApiResponse::success("ok", 1);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], 1);

        let body: ApiResponse<()> = ApiResponse::error("nope", None);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["data"].is_null());
    }

    #[test]
    fn login_response_uses_camel_case() {
        let json = serde_json::to_value(LoginResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
    }

    #[test]
    fn verify_response_uses_camel_case() {
        let json = serde_json::to_value(VerifyResponse::invalid()).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["isRefreshToken"], false);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let request = LoginRequest {
            username: "user".into(),
            password: "password123".into(),
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("password123"));

        let request = RegisterRequest {
            username: "user".into(),
            password: "password123".into(),
            roles: vec![],
        };
        assert!(!format!("{request:?}").contains("password123"));
    }

    #[test]
    fn register_roles_default_empty() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"username":"u","password":"p"}"#).unwrap();
        assert!(request.roles.is_empty());
    }
}
