//! # Authentication Module
//!
//! Optional API key authentication for the SmartRaise HTTP API.
//!
//! ## Configuration
//!
//! - `SMARTRAISE_API_KEY`: if set, every request except `/` and `/health`
//!   must carry `Authorization: Bearer <key>`

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SMARTRAISE_API_KEY";

/// Paths reachable without a key.
const PUBLIC_PATHS: [&str; 2] = ["/", "/health"];

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// Get API key from environment variable.
///
/// Returns `None` (authentication disabled) when unset or empty.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

/// Compare keys in constant time over the longer of the two lengths.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::unauthorized(message)),
    )
        .into_response()
}

/// API key authentication middleware.
pub async fn api_key_auth_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(expected) = get_api_key_from_env() else {
        return next.run(request).await;
    };

    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                "Authentication failed: invalid API key"
            );
            unauthorized("invalid API key")
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                "Missing Authorization header"
            );
            unauthorized("missing 'Authorization: Bearer <key>' header")
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_comparison() {
        assert!(keys_match(b"secret", b"secret"));
        assert!(!keys_match(b"secret", b"secreT"));
        assert!(!keys_match(b"secret", b"secret-longer"));
        assert!(!keys_match(b"", b"secret"));
    }
}
