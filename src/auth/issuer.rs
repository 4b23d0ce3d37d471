// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential checks and token minting.
//!
//! ## Flow
//!
//! ```text
//! login(username, password)
//!   -> CredentialStore::find_by_username
//!   -> bcrypt::verify            (blocking pool)
//!   -> Claims { sub, userId, roles, iat = now }
//!   -> access token + refresh token
//! ```
//!
//! Every failure on the login path collapses into
//! [`AuthError::CredentialsInvalid`] for the caller. The real cause is logged
//! server-side only. Plaintext passwords never leave this module and are
//! never logged.

use std::sync::Arc;

use chrono::Utc;

use super::{AuthError, Claims, TokenCodec, TokenKind, TokenLifetimes, UserId};
use crate::models::UserAccount;
use crate::store::StoreError;

/// A user record as held by the credential store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: UserId,
    pub username: String,
    /// bcrypt hash, never the plaintext
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl std::fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

/// A user about to be inserted. The password is already hashed.
#[derive(Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// A registration request as seen by the issuer.
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
}

/// Persistence boundary for user credentials.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>, StoreError>;

    fn insert(&self, record: NewUserRecord) -> Result<StoredUser, StoreError>;
}

/// Access and refresh tokens minted by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Internal login failure causes. Logged, never returned.
#[derive(Debug, thiserror::Error)]
enum LoginFailure {
    #[error("unknown user")]
    UnknownUser,
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
    #[error("password check failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password check task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Authenticates users and mints their tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    lifetimes: TokenLifetimes,
    credentials: Arc<dyn CredentialStore>,
    hash_cost: u32,
}

impl TokenIssuer {
    pub fn new(
        codec: Arc<TokenCodec>,
        lifetimes: TokenLifetimes,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            codec,
            lifetimes,
            credentials,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor used for new passwords.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn lifetimes(&self) -> &TokenLifetimes {
        &self.lifetimes
    }

    /// Check credentials and mint an access and a refresh token.
    ///
    /// # Errors
    /// [`AuthError::CredentialsInvalid`] for any failure.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedTokens, AuthError> {
        let user = match self.check_credentials(username, password).await {
            Ok(user) => user,
            Err(failure) => {
                tracing::warn!(username = %username, reason = %failure, "Login rejected");
                return Err(AuthError::CredentialsInvalid);
            }
        };

        let now = Utc::now().timestamp();
        let tokens = IssuedTokens {
            access_token: self.mint(&user, TokenKind::Access, now),
            refresh_token: self.mint(&user, TokenKind::Refresh, now),
        };

        tracing::info!(username = %user.username, user_id = user.id, "Tokens issued");
        Ok(tokens)
    }

    /// Mint a refresh token for a known user without a password check.
    ///
    /// # Errors
    /// [`AuthError::CredentialsInvalid`] if the user does not exist.
    pub fn issue_refresh_token(&self, username: &str) -> Result<String, AuthError> {
        let user = self
            .credentials
            .find_by_username(username)
            .map_err(|error| {
                tracing::warn!(username = %username, error = %error, "Credential lookup failed");
                AuthError::CredentialsInvalid
            })?
            .ok_or(AuthError::CredentialsInvalid)?;

        Ok(self.mint(&user, TokenKind::Refresh, Utc::now().timestamp()))
    }

    /// Hash the password and store a new user.
    ///
    /// # Errors
    /// [`AuthError::RegistrationFailed`] on duplicate username, hashing
    /// failure, or store failure.
    pub async fn register(&self, user: NewUser) -> Result<UserAccount, AuthError> {
        let NewUser {
            username,
            password,
            roles,
        } = user;

        let cost = self.hash_cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|error| {
                tracing::error!(username = %username, error = %error, "Password hashing task failed");
                AuthError::RegistrationFailed
            })?
            .map_err(|error| {
                tracing::error!(username = %username, error = %error, "Password hashing failed");
                AuthError::RegistrationFailed
            })?;

        let stored = self
            .credentials
            .insert(NewUserRecord {
                username: username.clone(),
                password_hash,
                roles,
            })
            .map_err(|error| {
                tracing::warn!(username = %username, error = %error, "User registration failed");
                AuthError::RegistrationFailed
            })?;

        tracing::info!(username = %stored.username, user_id = stored.id, roles = ?stored.roles, "User registered");
        Ok(UserAccount::from(stored))
    }

    async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<StoredUser, LoginFailure> {
        let password = password.to_owned();
        let Some(user) = self.credentials.find_by_username(username)? else {
            // An unknown user pays for one hash at the configured cost, the
            // same work as verifying a stored hash.
            let cost = self.hash_cost;
            tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
            return Err(LoginFailure::UnknownUser);
        };

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;

        if matches {
            Ok(user)
        } else {
            Err(LoginFailure::PasswordMismatch)
        }
    }

    fn mint(&self, user: &StoredUser, kind: TokenKind, now: i64) -> String {
        let claims = Claims::issue(
            user.username.clone(),
            user.id,
            user.roles.clone(),
            kind,
            now,
            &self.lifetimes,
        );
        self.codec.encode(&claims)
    }
}
