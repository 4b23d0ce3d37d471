// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token validation strategies.

use std::sync::Arc;

use chrono::Utc;

use super::{AuthError, Claims, RemoteVerificationClient, TokenCodec};

/// How a bearer token is turned into trusted claims.
#[derive(Clone, Debug)]
pub enum TokenValidator {
    /// Verify the signature with the shared secret
    Local(Arc<TokenCodec>),
    /// Ask the issuing service
    Remote(RemoteVerificationClient),
}

impl TokenValidator {
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        match self {
            TokenValidator::Local(codec) => {
                validate_locally(codec, token, Utc::now().timestamp())
            }
            TokenValidator::Remote(client) => client.validate(token).await,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            TokenValidator::Local(_) => "local",
            TokenValidator::Remote(_) => "remote",
        }
    }
}

/// Verify signature, subject and expiration at `now` (epoch seconds).
///
/// Refresh tokens are accepted like access tokens.
pub fn validate_locally(codec: &TokenCodec, token: &str, now: i64) -> Result<Claims, AuthError> {
    let claims = codec.decode(token)?;

    if claims.sub.trim().is_empty() {
        return Err(AuthError::MissingSubject);
    }
    if claims.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenKind, TokenLifetimes};
    use chrono::Duration;

    const SECRET: &str = "dGhpcy1pcy1hLXRlc3Qtc2lnbmluZy1zZWNyZXQtMzItYnl0ZXMhIQ==";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SECRET).unwrap())
    }

    fn claims(subject: &str, issued_at: i64, kind: TokenKind) -> Claims {
        Claims::issue(
            subject,
            5,
            vec!["USER".into()],
            kind,
            issued_at,
            &TokenLifetimes::new(Duration::minutes(60), 168),
        )
    }

    #[test]
    fn fresh_token_is_valid() {
        let codec = codec();
        let token = codec.encode(&claims("user", 1_000, TokenKind::Access));
        let validated = validate_locally(&codec, &token, 1_000 + 60).unwrap();
        assert_eq!(validated.sub, "user");
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec.encode(&claims("user", 1_000, TokenKind::Access));
        assert_eq!(
            validate_locally(&codec, &token, 1_000 + 3601),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let codec = codec();
        let token = codec.encode(&claims("user", 1_000, TokenKind::Refresh));
        assert!(validate_locally(&codec, &token, 1_000 + 7200).is_ok());
    }

    #[test]
    fn empty_subject_is_rejected() {
        let codec = codec();
        let token = codec.encode(&claims("", 1_000, TokenKind::Access));
        assert_eq!(
            validate_locally(&codec, &token, 1_000),
            Err(AuthError::MissingSubject)
        );
    }

    #[tokio::test]
    async fn local_validator_uses_current_time() {
        let codec = codec();
        let validator = TokenValidator::Local(codec.clone());
        assert_eq!(validator.mode(), "local");

        let fresh = codec.encode(&claims("user", Utc::now().timestamp(), TokenKind::Access));
        assert!(validator.validate(&fresh).await.is_ok());

        let stale = codec.encode(&claims("user", Utc::now().timestamp() - 7200, TokenKind::Access));
        assert_eq!(validator.validate(&stale).await, Err(AuthError::TokenExpired));
    }
}
