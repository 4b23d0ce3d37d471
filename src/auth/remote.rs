// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Delegated token verification against the issuing service.
//!
//! ## Protocol
//!
//! ```text
//! POST {AUTH_SERVICE_URL}/api/verify
//! Content-Type: text/plain
//!
//! <raw token>
//! ```
//!
//! The token is trusted only if the response is 2xx, the envelope status is
//! `success`, and `data.valid` is `true`. Everything else is a rejection.
//!
//! ## Security
//!
//! - Fail-closed: connection errors, timeouts, 4xx, 5xx and unreadable
//!   bodies all reject the token
//! - A cheap local pre-check (subject, expiration) on the unverified payload
//!   avoids a round-trip for tokens that cannot be valid
//! - No retries; one call per request, bounded by the client timeout

use std::time::Duration;

use chrono::Utc;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{codec, AuthError, Claims};

/// Why the issuing service did not vouch for a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteRejection {
    #[error("token payload could not be read")]
    Unparsable,
    #[error("token subject does not match the expected user")]
    UsernameMismatch,
    #[error("token has expired")]
    Expired,
    #[error("issuer unreachable: {0}")]
    Connection(String),
    #[error("issuer rejected the request with {0}")]
    ClientError(StatusCode),
    #[error("issuer failed with {0}")]
    ServerError(StatusCode),
    #[error("issuer response could not be read: {0}")]
    InvalidResponse(String),
    #[error("issuer reported the token as not valid")]
    NotValid,
}

impl From<RemoteRejection> for AuthError {
    fn from(rejection: RemoteRejection) -> Self {
        match rejection {
            RemoteRejection::Unparsable => AuthError::MalformedToken,
            RemoteRejection::Expired => AuthError::TokenExpired,
            RemoteRejection::UsernameMismatch
            | RemoteRejection::ClientError(_)
            | RemoteRejection::NotValid => AuthError::TokenRejected,
            RemoteRejection::Connection(_)
            | RemoteRejection::ServerError(_)
            | RemoteRejection::InvalidResponse(_) => AuthError::RemoteVerificationUnavailable,
        }
    }
}

#[derive(Deserialize)]
struct VerifyEnvelope {
    status: String,
    #[serde(default)]
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    #[serde(default)]
    valid: bool,
}

/// HTTP client for the issuer's verification endpoint.
#[derive(Clone, Debug)]
pub struct RemoteVerificationClient {
    client: reqwest::Client,
    verify_url: String,
    health_url: String,
}

impl RemoteVerificationClient {
    /// Create a client for the issuer at `base_url`.
    ///
    /// # Errors
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base = base_url.as_str().trim_end_matches('/');

        Ok(Self {
            client,
            verify_url: format!("{base}/api/verify"),
            health_url: format!("{base}/health"),
        })
    }

    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }

    /// Whether the issuer vouches for `token` as belonging to `expected_username`.
    pub async fn verify(&self, token: &str, expected_username: &str) -> bool {
        self.check(token, expected_username).await.is_ok()
    }

    /// Categorized form of [`verify`](Self::verify).
    pub async fn check(&self, token: &str, expected_username: &str) -> Result<(), RemoteRejection> {
        let claims = codec::peek(token).map_err(|_| RemoteRejection::Unparsable)?;
        self.precheck(&claims, expected_username)?;
        self.ask_issuer(token).await
    }

    /// Validate a token whose subject is not known in advance.
    ///
    /// The unverified claims are returned only after the issuer vouched for
    /// this exact token.
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = codec::peek(token)?;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }

        self.precheck(&claims, &claims.sub)?;
        self.ask_issuer(token).await?;
        Ok(claims)
    }

    /// Whether the issuer answers its health endpoint.
    pub async fn issuer_reachable(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!(error = %error, "Issuer health probe failed");
                false
            }
        }
    }

    fn precheck(&self, claims: &Claims, expected_username: &str) -> Result<(), RemoteRejection> {
        if claims.sub != expected_username {
            tracing::debug!(expected = %expected_username, "Token subject mismatch");
            return Err(RemoteRejection::UsernameMismatch);
        }
        if claims.is_expired_at(Utc::now().timestamp()) {
            tracing::debug!(username = %claims.sub, "Token expired before remote check");
            return Err(RemoteRejection::Expired);
        }
        Ok(())
    }

    async fn ask_issuer(&self, token: &str) -> Result<(), RemoteRejection> {
        let response = self
            .client
            .post(&self.verify_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(token.to_owned())
            .send()
            .await
            .map_err(|error| {
                tracing::error!(url = %self.verify_url, error = %error, "Issuer connection failed");
                RemoteRejection::Connection(error.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = %status, "Issuer rejected token verification request");
            return Err(RemoteRejection::ClientError(status));
        }
        if status.is_server_error() {
            tracing::error!(status = %status, "Issuer failed during token verification");
            return Err(RemoteRejection::ServerError(status));
        }
        if !status.is_success() {
            tracing::warn!(status = %status, "Unexpected issuer status");
            return Err(RemoteRejection::InvalidResponse(status.to_string()));
        }

        let envelope: VerifyEnvelope = response.json().await.map_err(|error| {
            tracing::error!(error = %error, "Issuer verification response unreadable");
            RemoteRejection::InvalidResponse(error.to_string())
        })?;

        let valid = envelope.status.eq_ignore_ascii_case("success")
            && envelope.data.is_some_and(|data| data.valid);
        if valid {
            Ok(())
        } else {
            tracing::debug!("Issuer reported token as not valid");
            Err(RemoteRejection::NotValid)
        }
    }
}
