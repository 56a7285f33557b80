use crate::api::AppState;
use crate::api::schemas::registration::{RegisterDeviceRequest, RegisterDeviceResponse};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

/// Registers a device push token for a user.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is malformed or fails validation.
pub async fn register_device(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterDeviceRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected registration body");
        AppError::BadRequest("Bad registration request".into())
    })?;
    let registration = payload.validate().map_err(AppError::BadRequest)?;

    state.registration_service.register(registration.platform, registration.user_id, registration.token);

    let message =
        format!("Firebase registration ID for {} device registered successfully", registration.platform.display_name());
    Ok((StatusCode::OK, Json(RegisterDeviceResponse { message })))
}
