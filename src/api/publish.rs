use crate::api::AppState;
use crate::api::schemas::publish::PublishRequest;
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::Instrument;

/// Queues a notification for every device of a user.
///
/// Delivery happens in the background; the response only confirms the batch was started.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is malformed or has no user id.
pub async fn publish(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PublishRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected publish body");
        AppError::BadRequest("Bad publish request".into())
    })?;
    payload.validate().map_err(AppError::BadRequest)?;

    let service = state.publish_service.clone();
    let span = tracing::info_span!("publish_batch", user_id = %payload.user_id);
    state.tasks.spawn(
        async move {
            service.publish(&payload.user_id, &payload.title, &payload.body).await;
        }
        .instrument(span),
    );

    Ok(StatusCode::ACCEPTED)
}
