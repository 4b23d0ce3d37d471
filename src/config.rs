// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and parsed
//! into an [`AppConfig`]. Any invalid value aborts startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SERVICE_KIND` | `issuer` or `consumer` | `issuer` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | Base64 HS256 secret (at least 32 bytes decoded) | Required unless remote consumer |
//! | `JWT_EXPIRATION_MINUTES` | Access token lifetime | `60` |
//! | `JWT_REFRESH_MULTIPLIER` | Refresh lifetime as a multiple of the access lifetime | `168` |
//! | `TOKEN_VALIDATION` | `local` or `remote` (consumer only) | `local` |
//! | `AUTH_SERVICE_URL` | Issuer base URL for remote validation | `http://localhost:8080` |
//! | `REMOTE_VERIFY_TIMEOUT_SECS` | Timeout for one remote verification call | `5` |
//! | `MISSING_TOKEN_POLICY` | `reject` or `pass_through` | issuer `reject`, consumer `pass_through` |
//! | `PUBLIC_PATHS` | Comma-separated exact paths or `/**` prefixes | Per service kind |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated preflight origins | `http://localhost:4200,http://localhost,http://host.docker.internal` |
//! | `SEED_ADMIN_PASSWORD` | Creates an `admin` user at startup (issuer) | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, str::FromStr, time::Duration};

use chrono::TimeDelta;
use url::Url;

use crate::auth::{MissingTokenPolicy, PublicPaths};

pub const SERVICE_KIND_ENV: &str = "SERVICE_KIND";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRATION_MINUTES_ENV: &str = "JWT_EXPIRATION_MINUTES";
pub const JWT_REFRESH_MULTIPLIER_ENV: &str = "JWT_REFRESH_MULTIPLIER";
pub const TOKEN_VALIDATION_ENV: &str = "TOKEN_VALIDATION";
pub const AUTH_SERVICE_URL_ENV: &str = "AUTH_SERVICE_URL";
pub const REMOTE_VERIFY_TIMEOUT_ENV: &str = "REMOTE_VERIFY_TIMEOUT_SECS";
pub const MISSING_TOKEN_POLICY_ENV: &str = "MISSING_TOKEN_POLICY";
pub const PUBLIC_PATHS_ENV: &str = "PUBLIC_PATHS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_EXPIRATION_MINUTES: i64 = 60;
pub const DEFAULT_REFRESH_MULTIPLIER: i32 = 168;
pub const DEFAULT_AUTH_SERVICE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REMOTE_VERIFY_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:4200",
    "http://localhost",
    "http://host.docker.internal",
];

const ISSUER_PUBLIC_PATHS: &[&str] = &[
    "/api/login",
    "/api/register",
    "/api/verify",
    "/health/**",
    "/docs/**",
    "/api-doc/**",
];

const CONSUMER_PUBLIC_PATHS: &[&str] = &["/health/**", "/docs/**", "/api-doc/**"];

/// Configuration errors raised at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is required")]
    Missing { name: &'static str },

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Which of the two services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Owns credentials, mints and verifies tokens
    Issuer,
    /// Owns protected tasks, validates tokens locally or remotely
    Consumer,
}

impl FromStr for ServiceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "issuer" => Ok(ServiceKind::Issuer),
            "consumer" => Ok(ServiceKind::Consumer),
            _ => Err(()),
        }
    }
}

/// How the consuming service validates bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Verify signatures with the shared secret
    Local,
    /// Delegate to the issuer's verification endpoint
    Remote,
}

impl FromStr for ValidationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(ValidationMode::Local),
            "remote" => Ok(ValidationMode::Remote),
            _ => Err(()),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Token signing settings.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSettings {
    /// Base64-encoded HMAC secret
    pub secret: String,
    pub expiration_minutes: i64,
    pub refresh_multiplier: i32,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("expiration_minutes", &self.expiration_minutes)
            .field("refresh_multiplier", &self.refresh_multiplier)
            .finish()
    }
}

/// Settings for delegating validation to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub auth_service_url: Url,
    pub timeout: Duration,
}

/// Fully parsed process configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub kind: ServiceKind,
    pub bind_addr: SocketAddr,
    /// `None` only for a consumer in remote mode without a secret
    pub jwt: Option<JwtSettings>,
    pub validation: ValidationMode,
    pub remote: RemoteSettings,
    pub missing_token: MissingTokenPolicy,
    pub public_paths: PublicPaths,
    pub allowed_origins: Vec<String>,
    pub seed_admin_password: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("kind", &self.kind)
            .field("bind_addr", &self.bind_addr)
            .field("jwt", &self.jwt)
            .field("validation", &self.validation)
            .field("remote", &self.remote)
            .field("missing_token", &self.missing_token)
            .field("public_paths", &self.public_paths)
            .field("allowed_origins", &self.allowed_origins)
            .field("seed_admin", &self.seed_admin_password.is_some())
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let kind = parse_or(&var, SERVICE_KIND_ENV, ServiceKind::Issuer)?;
        let validation = match kind {
            ServiceKind::Issuer => ValidationMode::Local,
            ServiceKind::Consumer => parse_or(&var, TOKEN_VALIDATION_ENV, ValidationMode::Local)?,
        };

        let host = var(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&var, PORT_ENV, 8080)?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: HOST_ENV,
                value: host.clone(),
            })?;

        let jwt = match var(JWT_SECRET_ENV) {
            Some(secret) => {
                let expiration_minutes = parse_positive(
                    &var,
                    JWT_EXPIRATION_MINUTES_ENV,
                    DEFAULT_EXPIRATION_MINUTES,
                )?;
                let refresh_multiplier = parse_positive(
                    &var,
                    JWT_REFRESH_MULTIPLIER_ENV,
                    DEFAULT_REFRESH_MULTIPLIER,
                )?;
                check_lifetimes(expiration_minutes, refresh_multiplier)?;
                Some(JwtSettings {
                    secret,
                    expiration_minutes,
                    refresh_multiplier,
                })
            }
            None if validation == ValidationMode::Remote => None,
            None => {
                return Err(ConfigError::Missing {
                    name: JWT_SECRET_ENV,
                })
            }
        };

        let url = var(AUTH_SERVICE_URL_ENV).unwrap_or_else(|| DEFAULT_AUTH_SERVICE_URL.to_string());
        let auth_service_url = Url::parse(&url).map_err(|_| ConfigError::Invalid {
            name: AUTH_SERVICE_URL_ENV,
            value: url.clone(),
        })?;
        let timeout_secs: u64 =
            parse_positive(&var, REMOTE_VERIFY_TIMEOUT_ENV, DEFAULT_REMOTE_VERIFY_TIMEOUT_SECS)?;

        let default_policy = match kind {
            ServiceKind::Issuer => MissingTokenPolicy::Reject,
            ServiceKind::Consumer => MissingTokenPolicy::PassThrough,
        };
        let missing_token = parse_or(&var, MISSING_TOKEN_POLICY_ENV, default_policy)?;

        let public_paths = match var(PUBLIC_PATHS_ENV) {
            Some(list) => PublicPaths::new(split_list(&list)),
            None => PublicPaths::new(match kind {
                ServiceKind::Issuer => ISSUER_PUBLIC_PATHS,
                ServiceKind::Consumer => CONSUMER_PUBLIC_PATHS,
            }),
        };

        let allowed_origins = match var(CORS_ALLOWED_ORIGINS_ENV) {
            Some(list) => split_list(&list),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            kind,
            bind_addr,
            jwt,
            validation,
            remote: RemoteSettings {
                auth_service_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            missing_token,
            public_paths,
            allowed_origins,
            seed_admin_password: var(SEED_ADMIN_PASSWORD_ENV),
        })
    }
}

/// Both lifetimes must be representable, or minting tokens would overflow.
fn check_lifetimes(expiration_minutes: i64, refresh_multiplier: i32) -> Result<(), ConfigError> {
    let access = TimeDelta::try_minutes(expiration_minutes).ok_or(ConfigError::Invalid {
        name: JWT_EXPIRATION_MINUTES_ENV,
        value: expiration_minutes.to_string(),
    })?;

    access
        .checked_mul(refresh_multiplier)
        .map(|_| ())
        .ok_or(ConfigError::Invalid {
            name: JWT_REFRESH_MULTIPLIER_ENV,
            value: refresh_multiplier.to_string(),
        })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    V: Fn(&'static str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_positive<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + ToString,
    V: Fn(&'static str) -> Option<String>,
{
    let value = parse_or(var, name, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}
