//! # Middleware Module
//!
//! Rate limiting for the SmartRaise HTTP API.
//!
//! ## Configuration
//!
//! - `SMARTRAISE_RATE_LIMIT`: requests per second across all clients
//!   (default 100, `0` disables limiting)

use super::types::ErrorResponse;
use axum::{
    BoxError, Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Environment variable holding the limit.
pub const RATE_LIMIT_ENV: &str = "SMARTRAISE_RATE_LIMIT";

/// Default rate limit: 100 requests per second.
const DEFAULT_RPS: NonZeroU32 = NonZeroU32::MIN.saturating_add(99);

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter. Zero falls back to the default.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Get rate limit from environment variable, or the default.
pub fn get_rate_limit_from_env() -> u32 {
    std::env::var(RATE_LIMIT_ENV)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RPS.get())
}

/// Rate limiting middleware.
///
/// Returns 429 Too Many Requests if the limit is exceeded.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::rate_limited("too many requests, retry later")),
            )
                .into_response()
        }
    }
}

// =============================================================================
// TIMEOUT
// =============================================================================

/// Turn errors from the tower service stack into the JSON error schema.
///
/// Only the request timeout produces errors today; anything else is a 500.
pub async fn handle_layer_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorResponse::timeout("request took too long")),
        )
            .into_response()
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::internal("request failed")),
        )
            .into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_hundred() {
        assert_eq!(DEFAULT_RPS.get(), 100);
    }

    #[test]
    fn zero_falls_back_to_default() {
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn burst_beyond_quota_is_refused() {
        let limiter = create_rate_limiter(1);
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    #[tokio::test]
    async fn elapsed_maps_to_json_408() {
        let err: BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let response = handle_layer_error(err).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "timeout");
        assert!(body["expected"].is_null());
    }

    #[tokio::test]
    async fn other_errors_map_to_json_500() {
        let err: BoxError = "boom".into();
        let response = handle_layer_error(err).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "internal");
    }
}
