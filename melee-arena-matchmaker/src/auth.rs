//! Bearer-JWT extraction and validation.
//!
//! Legacy clients ship tokens the matchmaker historically accepted without
//! checking the signature. Verification is therefore keyed on
//! configuration: with an HMAC key present, HS256 signatures are enforced;
//! without one, claims are taken at face value. Expiry is always enforced.

use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization failed - no bearer token")]
    MissingToken,

    #[error("authorization failed - invalid header/token")]
    Malformed,

    #[error("authorization failed - bad signature")]
    BadSignature,

    #[error("authorization failed - token expired")]
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GameClaims {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Unix seconds.
    pub exp: i64,
}

#[derive(Clone, Default)]
pub struct TokenValidator {
    hmac_key: Option<Vec<u8>>,
}

impl TokenValidator {
    /// Accepts any well-formed token; legacy mode.
    pub fn unverified() -> Self {
        Self { hmac_key: None }
    }

    /// Enforces HS256 signatures with the given key.
    pub fn with_hmac_key(key: impl Into<Vec<u8>>) -> Self {
        Self {
            hmac_key: Some(key.into()),
        }
    }

    /// Pulls the bearer token out of the `Authorization` header and
    /// validates it.
    pub fn claims_from_headers(&self, headers: &HeaderMap) -> Result<GameClaims, AuthError> {
        let header = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::MissingToken)?;
        self.validate(token)
    }

    pub fn validate(&self, token: &str) -> Result<GameClaims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        if let Some(key) = &self.hmac_key {
            let signature = URL_SAFE_NO_PAD
                .decode(signature)
                .map_err(|_| AuthError::Malformed)?;
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|_| AuthError::BadSignature)?;
            mac.update(header.as_bytes());
            mac.update(b".");
            mac.update(payload.as_bytes());
            mac.verify_slice(&signature)
                .map_err(|_| AuthError::BadSignature)?;
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: GameClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}
