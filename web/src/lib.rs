//! Admin HTTP surface of the realtime services.
//!
//! Serves liveness and statistics for the three buses and the two mutation
//! entry points that feed the event bridge: operator-injected chapter
//! releases and authenticated progress updates.

use chat::Hub;
use events::Bridge;
use log::*;
use notification::Notifier;
use progress_sync::{CredentialValidator, ProgressSync};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

mod controller;
mod error;
mod extractors;
mod params;
mod protect;
pub mod router;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub bridge: Bridge,
    pub progress_sync: ProgressSync,
    pub notifier: Notifier,
    pub chat: Hub,
    pub validator: Arc<dyn CredentialValidator>,
    pub admin_user_ids: Arc<HashSet<String>>,
}

impl AppState {
    pub fn new(
        bridge: Bridge,
        progress_sync: ProgressSync,
        notifier: Notifier,
        chat: Hub,
        validator: Arc<dyn CredentialValidator>,
        admin_user_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            bridge,
            progress_sync,
            notifier,
            chat,
            validator,
            admin_user_ids: Arc::new(admin_user_ids.into_iter().collect()),
        }
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user_ids.contains(user_id)
    }
}

/// Serves the admin routes on `listener` until `cancel` fires.
pub async fn init_server(
    listener: TcpListener,
    app_state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Admin HTTP surface listening on {local_addr}");

    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Admin HTTP surface stopped");
    Ok(())
}
