// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate for Axum.
//!
//! Runs once per request, before any handler:
//!
//! 1. A CORS preflight (`OPTIONS` with `Origin` and
//!    `Access-Control-Request-Method`) is answered directly
//! 2. Public paths continue without a principal
//! 3. The bearer token is extracted; a missing token is handled by the
//!    configured [`MissingTokenPolicy`]
//! 4. The token is validated by the configured [`TokenValidator`]
//! 5. The resulting [`AuthenticatedPrincipal`] is inserted into the
//!    request's extensions for the extractors in `extractor.rs`
//!
//! The gate only ever produces 401. Role and ownership decisions (403) are
//! made later by handlers through `policy.rs`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(gate, auth_gate));
//! ```

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION, ORIGIN, VARY,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedPrincipal, TokenValidator};

/// Methods advertised on preflight responses.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Request headers advertised on preflight responses.
pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type";

/// What to do with a non-public request that carries no bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTokenPolicy {
    /// Answer 401 immediately
    Reject,
    /// Continue without a principal; extractors reject if one is required
    PassThrough,
}

impl FromStr for MissingTokenPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reject" => Ok(MissingTokenPolicy::Reject),
            "pass_through" | "passthrough" => Ok(MissingTokenPolicy::PassThrough),
            _ => Err(()),
        }
    }
}

/// Paths reachable without authentication.
///
/// A pattern is either an exact path or a prefix ending in `/**`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicPaths {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl PublicPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match pattern.strip_suffix("/**") {
                Some(prefix) => paths.prefixes.push(prefix.to_string()),
                None => paths.exact.push(pattern.to_string()),
            }
        }
        paths
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.exact.iter().any(|exact| exact == path)
            || self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Shared gate configuration.
#[derive(Clone, Debug)]
pub struct AuthGate {
    validator: TokenValidator,
    public_paths: Arc<PublicPaths>,
    missing_token: MissingTokenPolicy,
    allowed_origins: Arc<Vec<String>>,
}

impl AuthGate {
    pub fn new(
        validator: TokenValidator,
        public_paths: PublicPaths,
        missing_token: MissingTokenPolicy,
        allowed_origins: Vec<String>,
    ) -> Self {
        Self {
            validator,
            public_paths: Arc::new(public_paths),
            missing_token,
            allowed_origins: Arc::new(allowed_origins),
        }
    }

    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    fn preflight(&self, origin: Option<&HeaderValue>) -> Response {
        let mut response = StatusCode::OK.into_response();
        let headers = response.headers_mut();

        let allowed = origin.filter(|origin| {
            origin
                .to_str()
                .is_ok_and(|origin| self.allowed_origins.iter().any(|o| o == origin))
        });
        if let Some(origin) = allowed {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }

        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        response
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// A blank token counts as absent.
pub fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn is_preflight(request: &Request) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(ORIGIN)
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// Authentication gate middleware function.
pub async fn auth_gate(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    if is_preflight(&request) {
        return gate.preflight(request.headers().get(ORIGIN));
    }

    let path = request.uri().path();
    if gate.public_paths.is_public(path) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(&request) else {
        return match gate.missing_token {
            MissingTokenPolicy::Reject => {
                tracing::debug!(path = %path, "Rejected request without bearer token");
                AuthError::MissingToken.into_response()
            }
            MissingTokenPolicy::PassThrough => next.run(request).await,
        };
    };

    match gate.validator.validate(token).await {
        Ok(claims) => {
            tracing::debug!(
                username = %claims.sub,
                user_id = claims.user_id,
                mode = gate.validator.mode(),
                "Request authenticated"
            );
            request
                .extensions_mut()
                .insert(AuthenticatedPrincipal::from(claims));
            next.run(request).await
        }
        Err(error) => {
            tracing::warn!(
                path = %request.uri().path(),
                error_code = error.error_code(),
                mode = gate.validator.mode(),
                "Token validation failed"
            );
            error.into_response()
        }
    }
}
