use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::controller::ApiResponse;
use crate::params::notification::CreateParams;
use crate::{AppState, Error};
use log::*;

/// POST inject a chapter release onto the notification bus
///
/// Only reachable through the admin guard.
pub async fn create(
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST chapter release: {params:?}");

    let notification = params.into_notification(Utc::now())?;
    app_state
        .bridge
        .publish_notification(notification.clone())
        .inspect_err(|e| warn!("Dropping chapter release for {}: {e}", notification.manga_id))?;

    info!(
        "Queued chapter release {} chapter {}",
        notification.manga_title, notification.chapter_number
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(StatusCode::ACCEPTED.into(), notification)),
    ))
}
