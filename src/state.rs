// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::RwLock;

use crate::auth::{AuthGate, TokenCodec, TokenIssuer};
use crate::store::{TaskStore, UserStore};

/// Shared state of the issuing service.
#[derive(Clone)]
pub struct IssuerState {
    pub issuer: TokenIssuer,
    pub codec: Arc<TokenCodec>,
    pub users: UserStore,
    pub gate: AuthGate,
}

impl IssuerState {
    pub fn new(issuer: TokenIssuer, codec: Arc<TokenCodec>, users: UserStore, gate: AuthGate) -> Self {
        Self {
            issuer,
            codec,
            users,
            gate,
        }
    }
}

/// Shared state of the consuming service.
#[derive(Clone)]
pub struct ConsumerState {
    pub tasks: Arc<RwLock<TaskStore>>,
    pub gate: AuthGate,
}

impl ConsumerState {
    pub fn new(tasks: TaskStore, gate: AuthGate) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
            gate,
        }
    }
}

impl FromRef<IssuerState> for AuthGate {
    fn from_ref(state: &IssuerState) -> Self {
        state.gate.clone()
    }
}

impl FromRef<ConsumerState> for AuthGate {
    fn from_ref(state: &ConsumerState) -> Self {
        state.gate.clone()
    }
}
