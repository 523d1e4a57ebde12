use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::controller::ApiResponse;
use crate::{AppState, Error};
use chat::ChatStats;
use log::*;
use notification::NotificationStats;
use progress_sync::SyncStats;

#[derive(Debug, Serialize)]
pub(crate) struct BridgeStats {
    progress_queued: usize,
    notification_queued: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct Stats {
    progress_sync: SyncStats,
    notification: NotificationStats,
    chat: ChatStats,
    bridge: BridgeStats,
}

/// GET point-in-time counters of every bus
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    debug!("GET realtime statistics");

    let (progress_queued, notification_queued) = app_state.bridge.queued();
    let stats = Stats {
        progress_sync: app_state.progress_sync.stats(),
        notification: app_state.notifier.stats(),
        chat: app_state.chat.stats().await?,
        bridge: BridgeStats {
            progress_queued,
            notification_queued,
        },
    };

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), stats)))
}
