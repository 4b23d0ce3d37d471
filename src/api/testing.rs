// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for handler and router tests.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    auth::{
        AuthGate, Claims, CredentialStore, MissingTokenPolicy, NewUserRecord, PublicPaths,
        TokenCodec, TokenIssuer, TokenKind, TokenLifetimes, TokenValidator, UserId,
    },
    state::{ConsumerState, IssuerState},
    store::{TaskStore, UserStore},
};

pub const SECRET: &str = "dGhpcy1pcy1hLXRlc3Qtc2lnbmluZy1zZWNyZXQtMzItYnl0ZXMhIQ==";

const TEST_COST: u32 = 4;

pub fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(SECRET).unwrap())
}

pub fn lifetimes() -> TokenLifetimes {
    TokenLifetimes::new(Duration::minutes(60), 168)
}

pub fn gate(validator: TokenValidator, policy: MissingTokenPolicy, public: &[&str]) -> AuthGate {
    AuthGate::new(
        validator,
        PublicPaths::new(public),
        policy,
        vec!["http://localhost:4200".to_string()],
    )
}

/// Issuer with `user`/`password123` (id 1, USER) and
/// `admin`/`adminpass` (id 2, USER + ADMIN).
pub fn issuer_state() -> IssuerState {
    let codec = codec();
    let users = UserStore::new();
    for (username, password, roles) in [
        ("user", "password123", vec!["USER"]),
        ("admin", "adminpass", vec!["USER", "ADMIN"]),
    ] {
        users
            .insert(NewUserRecord {
                username: username.to_string(),
                password_hash: bcrypt::hash(password, TEST_COST).unwrap(),
                roles: roles.into_iter().map(str::to_string).collect(),
            })
            .unwrap();
    }

    let issuer = TokenIssuer::new(codec.clone(), lifetimes(), Arc::new(users.clone()))
        .with_hash_cost(TEST_COST);
    let gate = gate(
        TokenValidator::Local(codec.clone()),
        MissingTokenPolicy::Reject,
        &["/api/login", "/api/register", "/api/verify", "/health/**", "/docs/**", "/api-doc/**"],
    );
    IssuerState::new(issuer, codec, users, gate)
}

pub fn consumer_state(validator: TokenValidator) -> ConsumerState {
    let gate = gate(
        validator,
        MissingTokenPolicy::PassThrough,
        &["/health/**", "/docs/**", "/api-doc/**"],
    );
    ConsumerState::new(TaskStore::new(), gate)
}

/// A fresh access token.
pub fn bearer(codec: &TokenCodec, username: &str, user_id: UserId, roles: &[&str]) -> String {
    codec.encode(&Claims::issue(
        username,
        user_id,
        roles.iter().map(|r| r.to_string()).collect(),
        TokenKind::Access,
        Utc::now().timestamp(),
        &lifetimes(),
    ))
}
