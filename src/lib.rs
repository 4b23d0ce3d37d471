// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer Trust Server - HMAC-signed bearer tokens for cooperating services
//!
//! One crate, two deployments:
//!
//! - **Issuer**: owns credentials, mints access and refresh tokens, and
//!   answers token verification requests
//! - **Consumer**: owns protected tasks and validates tokens either locally
//!   (shared secret) or remotely (issuer's verification endpoint)
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and routers (Axum)
//! - `auth` - Token codec, issuer, validation gate and access policy
//! - `config` - Environment configuration
//! - `store` - In-memory user and task stores

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
