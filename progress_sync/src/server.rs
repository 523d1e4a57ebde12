use crate::auth::CredentialValidator;
use crate::config::SyncConfig;
use crate::error::Error;
use crate::manager::{FanOut, ProgressSync};
use crate::session::{self, SessionContext};
use log::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Pause after a failed `accept` before polling the listener again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP front end of the progress sync service.
pub struct ProgressSyncServer {
    listener: TcpListener,
    ctx: Arc<SessionContext>,
    fan_out: FanOut,
}

impl ProgressSyncServer {
    /// Binds the listener. No connection is accepted until [`run`](Self::run).
    pub async fn bind(
        addr: impl ToSocketAddrs,
        config: SyncConfig,
        validator: Arc<dyn CredentialValidator>,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let (sync, fan_out) = ProgressSync::new(&config);

        Ok(Self {
            listener,
            ctx: Arc::new(SessionContext {
                sync,
                validator,
                config,
            }),
            fan_out,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle used to publish events and read counters.
    pub fn handle(&self) -> ProgressSync {
        self.ctx.sync.clone()
    }

    /// Accepts connections until `cancel` fires, then closes every session
    /// and waits for their tasks to finish.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), Error> {
        let Self {
            listener,
            ctx,
            fan_out,
        } = self;

        info!(
            "Progress sync server listening on {}",
            listener.local_addr()?
        );

        let fan_out = tokio::spawn(fan_out.run(cancel.clone()));
        let sessions = TaskTracker::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!("Failed to set TCP_NODELAY for {peer}: {e}");
                        }
                        sessions.spawn(session::run(stream, peer, ctx.clone(), cancel.clone()));
                    }
                    Err(e) => {
                        // Typically EMFILE; give sessions a chance to release descriptors.
                        error!("Failed to accept progress sync connection: {e}");
                        if !back_off(&cancel).await {
                            break;
                        }
                    }
                },
            }
        }

        drop(listener);
        ctx.sync.registry().close_all();
        sessions.close();
        sessions.wait().await;
        let _ = fan_out.await;

        info!("Progress sync server stopped");
        Ok(())
    }
}

/// Waits out [`ACCEPT_BACKOFF`]; `false` when cancellation arrived first.
async fn back_off(cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn back_off_pauses_before_the_next_accept() {
        let started = Instant::now();
        assert!(back_off(&CancellationToken::new()).await);
        assert!(started.elapsed() >= ACCEPT_BACKOFF);
    }

    #[tokio::test]
    async fn back_off_yields_to_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = Instant::now();
        assert!(!back_off(&cancel).await);
        assert!(started.elapsed() < ACCEPT_BACKOFF);
    }
}
