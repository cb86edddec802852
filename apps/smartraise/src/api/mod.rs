//! # SmartRaise HTTP API Module
//!
//! This module implements the prediction service using axum.
//!
//! ## Endpoints
//!
//! - `GET /` - Plain-text welcome message
//! - `GET /health` - Health check
//! - `GET /model` - Loaded artifact description
//! - `POST /predict` - Predict from one feature vector
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SMARTRAISE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `SMARTRAISE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SMARTRAISE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ErrorResponse, HealthResponse, ModelInfoResponse, PredictRequest, PredictResponse,
    PredictionValue, WELCOME_TEXT, codes,
};

use crate::config::{PredictionShape, ServerConfig};
use axum::{
    Router,
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use smartraise_core::{InferencePipeline, Result, SmartRaiseError};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "SMARTRAISE_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    /// The loaded scaler and model.
    pub pipeline: Arc<InferencePipeline>,
    /// How predictions are wrapped in responses.
    pub prediction_shape: PredictionShape,
}

impl AppState {
    #[must_use]
    pub fn new(pipeline: InferencePipeline, prediction_shape: PredictionShape) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            prediction_shape,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `SMARTRAISE_CORS_ORIGINS`.
///
/// `*` allows every origin; unset or unparsable falls back to localhost.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins ({}=*). This is insecure for production!",
                CORS_ORIGINS_ENV
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!(
                "CORS: No {} set, defaulting to localhost only",
                CORS_ORIGINS_ENV
            );
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:5000",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5000",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Timeout - bounds each request
/// 4. Body limit
/// 5. Rate Limiting (if enabled)
/// 6. Authentication (if configured)
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - /predict and /model are publicly accessible. \
             Set {} to enable authentication.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/model", get(handlers::model_info_handler))
        .route("/predict", post(handlers::predict_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(middleware::handle_layer_error))
                .timeout(Duration::from_secs(server.request_timeout_secs)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the HTTP server. Artifacts must already be loaded into `state`.
pub async fn run_server(state: AppState, server: &ServerConfig) -> Result<()> {
    let router = create_router(state, server);
    let addr = format!("{}:{}", server.host, server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SmartRaiseError::IoError(format!("Bind {} failed: {}", addr, e)))?;

    tracing::info!("SmartRaise prediction service listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SmartRaiseError::IoError(format!("Server error: {}", e)))
}
