// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! HMAC-signed bearer tokens shared by the issuing and consuming services.
//!
//! ## Auth Flow
//!
//! 1. Client posts credentials to the issuer's `/api/login`
//! 2. Issuer checks the bcrypt hash and returns an access and a refresh token
//! 3. Client sends `Authorization: Bearer <token>` to either service
//! 4. The authentication gate validates the token:
//!    - locally, by recomputing the HMAC with the shared secret, or
//!    - remotely, by asking the issuer's `/api/verify` endpoint
//! 5. Handlers read the principal through extractors and apply role and
//!    ownership checks from [`policy`]
//!
//! ## Security
//!
//! - Signatures are compared in constant time
//! - Remote verification fails closed
//! - Token failures are 401, authorization failures are 403
//! - Secrets, password hashes and token material are never logged

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod issuer;
pub mod middleware;
pub mod policy;
pub mod remote;
pub mod validator;

pub use claims::{AuthenticatedPrincipal, Claims, TokenKind, TokenLifetimes, UserId};
pub use codec::{KeyError, TokenCodec};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use issuer::{CredentialStore, IssuedTokens, NewUser, NewUserRecord, StoredUser, TokenIssuer};
pub use middleware::{auth_gate, AuthGate, MissingTokenPolicy, PublicPaths};
pub use policy::{OwnedResource, ResourceLookup, ADMIN_ROLE, USER_ROLE};
pub use remote::{RemoteRejection, RemoteVerificationClient};
pub use validator::TokenValidator;
