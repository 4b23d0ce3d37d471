// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact HS256 token encoding and verification.
//!
//! ## Wire Format
//!
//! ```text
//! base64url(header) "." base64url(payload) "." base64url(signature)
//! ```
//!
//! - Header is fixed to `{"typ":"JWT","alg":"HS256"}`
//! - Payload is the JSON-encoded [`Claims`]
//! - Signature is HMAC-SHA256 over `header "." payload`
//!
//! All segments use unpadded URL-safe base64. The encoding is deterministic,
//! so every service holding the same secret produces the same token for the
//! same claims.
//!
//! ## Verification Order
//!
//! `decode` checks structure, then the header, then the signature (constant
//! time), and only then parses the payload. A modified payload therefore
//! always fails as [`AuthError::SignatureInvalid`]. Expiration is not
//! checked here; see [`super::validator`].
//!
//! [`peek`] reads claims without a key. It exists for services that hold no
//! secret and must decide whether a token is worth sending to the issuer.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{AuthError, Claims};
use crate::config::JwtSettings;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm declared in every header.
pub const ALGORITHM: &str = "HS256";

/// Minimum decoded secret length for HS256 (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

/// Errors raised while deriving the signing key at startup.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signing secret is not valid base64")]
    InvalidEncoding,

    #[error("signing secret must decode to at least {MIN_SECRET_BYTES} bytes, got {0}")]
    TooShort(usize),

    #[error("signing secret was rejected by HMAC-SHA256")]
    InvalidLength,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    alg: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            typ: Some("JWT".to_string()),
            alg: ALGORITHM.to_string(),
        }
    }
}

/// Token encoder/decoder bound to one signing key.
///
/// The key is derived once and never changes. Share the codec behind an
/// `Arc`; it is read-only and safe for concurrent use.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    header_segment: String,
}

impl TokenCodec {
    /// Create a codec from a base64-encoded secret.
    ///
    /// # Errors
    /// Returns [`KeyError`] if the secret is not base64 or is shorter than
    /// [`MIN_SECRET_BYTES`] once decoded.
    pub fn new(secret: &str) -> Result<Self, KeyError> {
        let key = Base64::decode_vec(secret.trim()).map_err(|_| KeyError::InvalidEncoding)?;
        if key.len() < MIN_SECRET_BYTES {
            return Err(KeyError::TooShort(key.len()));
        }

        let mac = HmacSha256::new_from_slice(&key).map_err(|_| KeyError::InvalidLength)?;
        let header_json =
            serde_json::to_vec(&TokenHeader::hs256()).map_err(|_| KeyError::InvalidLength)?;

        Ok(Self {
            mac,
            header_segment: Base64UrlUnpadded::encode_string(&header_json),
        })
    }

    /// Create a codec from the configured JWT settings.
    ///
    /// Produces byte-identical tokens to [`TokenCodec::new`] given the same
    /// secret.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, KeyError> {
        Self::new(&settings.secret)
    }

    /// Encode and sign claims.
    pub fn encode(&self, claims: &Claims) -> String {
        // Claims hold only strings and integers, which always serialize.
        let payload = serde_json::to_vec(claims).unwrap_or_default();
        let signing_input = format!(
            "{}.{}",
            self.header_segment,
            Base64UrlUnpadded::encode_string(&payload)
        );
        let signature = self.sign(signing_input.as_bytes());
        format!("{signing_input}.{signature}")
    }

    /// Verify a token's signature and return its claims.
    ///
    /// # Errors
    /// - [`AuthError::MalformedToken`] if the token does not have three
    ///   segments, the header is unreadable or not HS256, or the payload is
    ///   not valid claims JSON
    /// - [`AuthError::SignatureInvalid`] if the signature does not match
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let segments = split_token(token)?;
        check_header(segments.header)?;

        let provided = Base64UrlUnpadded::decode_vec(segments.signature)
            .map_err(|_| AuthError::SignatureInvalid)?;

        let mut mac = self.mac.clone();
        mac.update(segments.signing_input.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| AuthError::SignatureInvalid)?;

        parse_payload(segments.payload)
    }

    fn sign(&self, signing_input: &[u8]) -> String {
        let mut mac = self.mac.clone();
        mac.update(signing_input);
        Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("key", &"<redacted>")
            .finish()
    }
}

struct Segments<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

fn split_token(token: &str) -> Result<Segments<'_>, AuthError> {
    let token = token.trim();
    let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;
    let (header, payload) = signing_input
        .split_once('.')
        .ok_or(AuthError::MalformedToken)?;

    if header.is_empty() || payload.is_empty() || payload.contains('.') {
        return Err(AuthError::MalformedToken);
    }

    Ok(Segments {
        header,
        payload,
        signature,
        signing_input,
    })
}

fn check_header(segment: &str) -> Result<(), AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)?;
    let header: TokenHeader =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    if header.alg != ALGORITHM {
        return Err(AuthError::MalformedToken);
    }
    Ok(())
}

/// Parse a token's claims without verifying its signature.
///
/// The result must never be trusted for authorization.
pub fn peek(token: &str) -> Result<Claims, AuthError> {
    let segments = split_token(token)?;
    check_header(segments.header)?;
    parse_payload(segments.payload)
}

fn parse_payload(segment: &str) -> Result<Claims, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)
}
