//! Authorization guards layered in front of the mutation routes.

use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use log::*;

/// Lets the request through only when the bearer token belongs to a configured admin.
/// Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn admin(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    if app_state.is_admin(&user.user_id) {
        next.run(request).await
    } else {
        warn!(
            "User {} ({}) attempted an admin operation",
            user.username, user.user_id
        );
        (StatusCode::FORBIDDEN, "FORBIDDEN").into_response()
    }
}
