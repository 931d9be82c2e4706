//! Access-token expiry checks.
//!
//! The access token is a JWT (`header.payload.signature`, base64url). Only the
//! payload's `exp` claim is read; signatures are the API's concern. Every
//! failure to read `exp` is reported as expired so callers fail closed.

use crate::session::clock::{Clock, SystemClock};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("missing expiration claim")]
    MissingExp,
    #[error("invalid expiration claim")]
    InvalidExp,
}

fn payload_segment(token: &str) -> Result<&str, TokenError> {
    let mut parts = token.split('.');
    let _header = parts.next().ok_or(TokenError::TokenFormat)?;
    let payload = parts.next().ok_or(TokenError::TokenFormat)?;
    let _signature = parts.next().ok_or(TokenError::TokenFormat)?;
    if parts.next().is_some() || payload.is_empty() {
        return Err(TokenError::TokenFormat);
    }
    Ok(payload)
}

/// Decode the `exp` claim as whole Unix seconds, rounded up.
///
/// # Errors
///
/// Returns an error if the token is not a three-part JWT, the payload is not
/// a base64url JSON object, or `exp` is missing or not a finite number.
#[allow(clippy::cast_possible_truncation)]
pub fn expires_at(token: &str) -> Result<i64, TokenError> {
    let payload = payload_segment(token.trim())?;
    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Base64)?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes)?;
    let exp = match claims.get("exp") {
        None | Some(Value::Null) => return Err(TokenError::MissingExp),
        Some(value) => value.as_f64().ok_or(TokenError::InvalidExp)?,
    };
    if !exp.is_finite() {
        return Err(TokenError::InvalidExp);
    }

    // `now` is whole seconds, so `exp <= now` holds iff `ceil(exp) <= now`.
    Ok(exp.ceil() as i64)
}

/// True when the token cannot be used at `now_unix_seconds`: expired (no
/// grace period) or unreadable.
#[must_use]
pub fn is_expired_at(token: &str, now_unix_seconds: i64) -> bool {
    match expires_at(token) {
        Ok(exp) => exp <= now_unix_seconds,
        Err(err) => {
            tracing::debug!("access token treated as expired: {err}");
            true
        }
    }
}

/// [`is_expired_at`] against the wall clock.
#[must_use]
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, SystemClock.now_unix_seconds())
}
