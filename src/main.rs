// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, sync::Arc};

use axum::Router;
use tracing_subscriber::EnvFilter;

use bearer_trust_server::{
    api::{consumer_router, issuer_router},
    auth::{
        AuthGate, NewUser, RemoteVerificationClient, TokenCodec, TokenIssuer, TokenLifetimes,
        TokenValidator, ADMIN_ROLE, USER_ROLE,
    },
    config::{AppConfig, JwtSettings, LogFormat, ServiceKind, ValidationMode},
    state::{ConsumerState, IssuerState},
    store::{TaskStore, UserStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        kind = ?config.kind,
        validation = ?config.validation,
        missing_token = ?config.missing_token,
        "Configuration loaded"
    );

    let app = match config.kind {
        ServiceKind::Issuer => build_issuer(&config).await?,
        ServiceKind::Consumer => build_consumer(&config)?,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        kind = ?config.kind,
        "Bearer trust server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn codec_from(
    settings: Option<&JwtSettings>,
) -> Result<Arc<TokenCodec>, Box<dyn std::error::Error>> {
    let settings = settings.ok_or("JWT_SECRET is required")?;
    Ok(Arc::new(TokenCodec::from_settings(settings)?))
}

async fn build_issuer(config: &AppConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let settings = config.jwt.as_ref().ok_or("JWT_SECRET is required")?;
    let codec = codec_from(Some(settings))?;
    let users = UserStore::new();
    let issuer = TokenIssuer::new(
        codec.clone(),
        TokenLifetimes::from_settings(settings),
        Arc::new(users.clone()),
    );

    if let Some(password) = &config.seed_admin_password {
        seed_admin(&issuer, password.clone()).await?;
    }

    let gate = AuthGate::new(
        TokenValidator::Local(codec.clone()),
        config.public_paths.clone(),
        config.missing_token,
        config.allowed_origins.clone(),
    );
    Ok(issuer_router(IssuerState::new(issuer, codec, users, gate)))
}

fn build_consumer(config: &AppConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let validator = match config.validation {
        ValidationMode::Local => TokenValidator::Local(codec_from(config.jwt.as_ref())?),
        ValidationMode::Remote => {
            let client = RemoteVerificationClient::new(
                &config.remote.auth_service_url,
                config.remote.timeout,
            )?;
            tracing::info!(url = %client.verify_url(), "Delegating token validation to issuer");
            TokenValidator::Remote(client)
        }
    };

    let gate = AuthGate::new(
        validator,
        config.public_paths.clone(),
        config.missing_token,
        config.allowed_origins.clone(),
    );
    Ok(consumer_router(ConsumerState::new(TaskStore::new(), gate)))
}

/// Create the bootstrap `admin` account.
async fn seed_admin(issuer: &TokenIssuer, password: String) -> Result<(), Box<dyn std::error::Error>> {
    issuer
        .register(NewUser {
            username: "admin".to_string(),
            password,
            roles: vec![USER_ROLE.to_string(), ADMIN_ROLE.to_uppercase()],
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
