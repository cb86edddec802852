//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ErrorResponse, HealthResponse, ModelInfoResponse, PredictRequest, PredictResponse,
        WELCOME_TEXT,
    },
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use smartraise_core::SmartRaiseError;

// =============================================================================
// ROOT HANDLER
// =============================================================================

/// Plain-text welcome message.
pub async fn root_handler() -> &'static str {
    WELCOME_TEXT
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// MODEL INFO HANDLER
// =============================================================================

/// Describe the loaded artifacts.
pub async fn model_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = ModelInfoResponse::new(state.pipeline.info(), state.prediction_shape);
    (StatusCode::OK, Json(response))
}

// =============================================================================
// PREDICT HANDLER
// =============================================================================

/// Map a core error onto the HTTP error schema.
fn error_response(err: &SmartRaiseError) -> Response {
    let status = if err.is_client_error() {
        tracing::debug!(error = %err, "Prediction request rejected");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %err, "Prediction failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Map a body extraction failure onto the HTTP error schema.
fn rejection_response(rejection: &JsonRejection) -> Response {
    let (status, body) = match rejection {
        JsonRejection::MissingJsonContentType(_) => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorResponse::unsupported_media_type("expected 'Content-Type: application/json'"),
        ),
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::payload_too_large(other.body_text()),
        ),
        other => (
            StatusCode::BAD_REQUEST,
            ErrorResponse::malformed(other.body_text()),
        ),
    };
    tracing::debug!(status = %status, reason = %body.message, "Prediction request rejected");
    (status, Json(body)).into_response()
}

/// Predict from one feature vector.
pub async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    let features = match request.feature_vector() {
        Ok(features) => features,
        Err(e) => return error_response(&e),
    };

    match state.pipeline.predict(&features) {
        Ok(prediction) => {
            tracing::debug!(%prediction, "Prediction served");
            (
                StatusCode::OK,
                Json(PredictResponse::new(prediction, state.prediction_shape)),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}
