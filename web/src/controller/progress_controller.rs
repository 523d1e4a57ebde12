use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::progress::UpdateParams;
use crate::{AppState, Error};
use log::*;

/// PUT record the caller's reading progress and fan it out to every sync session
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<UpdateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT progress from {}: {params:?}", user.user_id);

    let event = params.into_event(user, Utc::now())?;
    app_state
        .bridge
        .publish_progress(event.clone())
        .inspect_err(|e| warn!("Dropping progress update of {}: {e}", event.user_id))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(StatusCode::ACCEPTED.into(), event)),
    ))
}
