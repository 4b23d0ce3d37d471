// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the request-scoped authenticated principal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::JwtSettings;

/// Numeric user identifier carried in the `userId` claim.
pub type UserId = i64;

/// Kind of token, carried in the `tokenType` claim.
///
/// Access tokens omit the claim entirely; refresh tokens carry
/// `"tokenType": "refresh"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every protected request
    #[default]
    Access,
    /// Long-lived token used to obtain new access tokens
    Refresh,
}

impl TokenKind {
    fn is_access(&self) -> bool {
        *self == TokenKind::Access
    }
}

/// Claims carried in the payload of a signed token.
///
/// Field order here is the serialization order, which makes the encoded
/// payload deterministic across services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Numeric user ID
    #[serde(rename = "userId")]
    pub user_id: UserId,

    /// Granted role names, in the order they were assigned
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at (epoch seconds)
    pub iat: i64,

    /// Expiration (epoch seconds)
    pub exp: i64,

    /// Token kind (absent means access)
    #[serde(rename = "tokenType", default, skip_serializing_if = "TokenKind::is_access")]
    pub kind: TokenKind,
}

impl Claims {
    /// Build claims whose expiration is derived from `issued_at` and the
    /// configured lifetime for `kind`.
    pub fn issue(
        subject: impl Into<String>,
        user_id: UserId,
        roles: Vec<String>,
        kind: TokenKind,
        issued_at: i64,
        lifetimes: &TokenLifetimes,
    ) -> Self {
        Self {
            sub: subject.into(),
            user_id,
            roles,
            iat: issued_at,
            exp: issued_at + lifetimes.lifetime(kind).num_seconds(),
            kind,
        }
    }

    /// Whether the token is past its expiration at `now` (epoch seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }

    /// Whether this is a refresh token.
    pub fn is_refresh(&self) -> bool {
        self.kind == TokenKind::Refresh
    }

    /// Expiration as a UTC timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Access and refresh token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    access: Duration,
    refresh_multiplier: i32,
}

impl TokenLifetimes {
    pub fn new(access: Duration, refresh_multiplier: i32) -> Self {
        Self {
            access,
            refresh_multiplier: refresh_multiplier.max(1),
        }
    }

    /// Lifetimes from loaded settings. `AppConfig` rejects values whose
    /// refresh lifetime would not fit in a `Duration`.
    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self::new(
            Duration::minutes(settings.expiration_minutes),
            settings.refresh_multiplier,
        )
    }

    /// Lifetime of a token of the given kind.
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access,
            TokenKind::Refresh => self.access * self.refresh_multiplier,
        }
    }
}

/// The authenticated identity of the current request.
///
/// Built from validated claims by the authentication gate and attached to
/// the request's extensions. Never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedPrincipal {
    /// Username (`sub` claim)
    pub username: String,

    /// Numeric user ID (`userId` claim)
    pub user_id: UserId,

    /// Granted role names
    pub roles: Vec<String>,
}

impl From<Claims> for AuthenticatedPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            user_id: claims.user_id,
            roles: claims.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifetimes() -> TokenLifetimes {
        TokenLifetimes::new(Duration::minutes(60), 168)
    }

    #[test]
    fn access_expiration_is_issued_at_plus_lifetime() {
        let claims = Claims::issue("user", 5, vec![], TokenKind::Access, 1_700_000_000, &lifetimes());
        assert_eq!(claims.exp, 1_700_000_000 + 3600);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_expiration_uses_multiplier() {
        let claims = Claims::issue("user", 5, vec![], TokenKind::Refresh, 1_700_000_000, &lifetimes());
        assert_eq!(claims.exp, 1_700_000_000 + 3600 * 168);
        assert!(claims.is_refresh());
    }

    #[test]
    fn zero_multiplier_is_clamped() {
        let lifetimes = TokenLifetimes::new(Duration::minutes(10), 0);
        assert_eq!(lifetimes.lifetime(TokenKind::Refresh), Duration::minutes(10));
    }

    #[test]
    fn access_tokens_omit_token_type() {
        let claims = Claims::issue("user", 5, vec!["USER".into()], TokenKind::Access, 100, &lifetimes());
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("tokenType").is_none());
        assert_eq!(json["userId"], 5);
        assert_eq!(json["roles"], serde_json::json!(["USER"]));
    }

    #[test]
    fn refresh_tokens_carry_token_type() {
        let claims = Claims::issue("user", 5, vec![], TokenKind::Refresh, 100, &lifetimes());
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["tokenType"], "refresh");
    }

    #[test]
    fn missing_roles_and_kind_default() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"user","userId":7,"iat":1,"exp":2}"#).unwrap();
        assert!(claims.roles.is_empty());
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn expiry_is_strictly_after_exp() {
        let claims = Claims::issue("user", 5, vec![], TokenKind::Access, 100, &lifetimes());
        assert!(!claims.is_expired_at(claims.exp));
        assert!(claims.is_expired_at(claims.exp + 1));
    }

    #[test]
    fn principal_from_claims() {
        let claims = Claims::issue(
            "user",
            5,
            vec!["USER".into(), "ADMIN".into()],
            TokenKind::Access,
            100,
            &lifetimes(),
        );
        let principal = AuthenticatedPrincipal::from(claims);
        assert_eq!(principal.username, "user");
        assert_eq!(principal.user_id, 5);
        assert_eq!(principal.roles, vec!["USER", "ADMIN"]);
    }
}
