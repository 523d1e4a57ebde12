use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use log::*;
use progress_sync::Identity;

pub(crate) struct AuthenticatedUser(pub Identity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Reads an `Authorization: Bearer <token>` header and resolves it through the
    // same credential validator the progress sync handshake uses.
    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthorized)?;

        match app_state.validator.validate(token).await {
            Ok(identity) => Ok(AuthenticatedUser(identity)),
            Err(e) => {
                debug!("Rejecting bearer token: {e}");
                Err(unauthorized())
            }
        }
    }
}

fn unauthorized() -> RejectionType {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}
