use chat::{ChatAnnouncer, ChatConfig, ChatServer};
use events::{Bridge, BridgeConfig, EventPublisher};
use log::*;
use notification::{NotificationConfig, NotificationEventHandler, NotificationServer};
use progress_sync::{JwtValidator, ProgressSyncEventHandler, ProgressSyncServer, SyncConfig};
use service::config::Config;
use service::logging::Logger;
use std::fmt::Display;
use std::future::Future;
use std::process;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start logger: {e}");
        process::exit(1);
    }

    info!("Starting up MangaHub realtime services...");

    let Some(jwt_secret) = config.jwt_secret() else {
        error!("JWT_SECRET must be set to validate client credentials");
        process::exit(1);
    };
    let validator = Arc::new(JwtValidator::new(jwt_secret));

    let interface = config.interface();

    let progress_server = exit_on_bind_error(
        "progress sync",
        ProgressSyncServer::bind(
            (interface, config.tcp_port),
            sync_config(&config),
            validator.clone(),
        )
        .await,
    );
    let notification_server = exit_on_bind_error(
        "notification",
        NotificationServer::bind((interface, config.udp_port), notification_config(&config))
            .await,
    );
    let chat_server = exit_on_bind_error(
        "chat",
        ChatServer::bind((interface, config.websocket_port), chat_config(&config)).await,
    );
    let http_listener = exit_on_bind_error(
        "admin HTTP",
        TcpListener::bind((interface, config.http_port)).await,
    );

    let progress_sync = progress_server.handle();
    let notifier = notification_server.handle();
    let hub = chat_server.handle();

    let (bridge, relay) = Bridge::new(&BridgeConfig {
        capacity: config.bridge_capacity,
    });
    let publisher = EventPublisher::new()
        .with_handler(Arc::new(ProgressSyncEventHandler::new(
            progress_sync.clone(),
        )))
        .with_handler(Arc::new(NotificationEventHandler::new(notifier.clone())))
        .with_handler(Arc::new(ChatAnnouncer::new(hub.clone())));

    let app_state = web::AppState::new(
        bridge,
        progress_sync,
        notifier,
        hub,
        validator,
        config.admin_user_ids.clone(),
    );

    debug!(
        "Event bridge relaying to {} handlers",
        publisher.handler_count()
    );

    let cancel = CancellationToken::new();
    let mut services = JoinSet::new();

    services.spawn(relay.run(publisher, cancel.child_token()));
    spawn_service(
        &mut services,
        "progress sync",
        &cancel,
        progress_server.run(cancel.child_token()),
    );
    spawn_service(
        &mut services,
        "notification",
        &cancel,
        notification_server.run(cancel.child_token()),
    );
    spawn_service(
        &mut services,
        "chat",
        &cancel,
        chat_server.run(cancel.child_token()),
    );
    spawn_service(
        &mut services,
        "admin HTTP",
        &cancel,
        web::init_server(http_listener, app_state, cancel.child_token()),
    );

    tokio::select! {
        _ = shutdown_signal() => info!("Received shutdown signal"),
        _ = cancel.cancelled() => warn!("A service stopped unexpectedly, shutting down"),
    }
    cancel.cancel();

    let drain = async {
        while let Some(joined) = services.join_next().await {
            if let Err(e) = joined {
                error!("Service task failed: {e}");
            }
        }
    };
    if tokio::time::timeout(config.shutdown_timeout(), drain)
        .await
        .is_err()
    {
        warn!(
            "Services did not stop within {:?}, exiting anyway",
            config.shutdown_timeout()
        );
    }

    info!("MangaHub realtime services stopped");
}

fn exit_on_bind_error<T, E: Display>(service: &str, bound: Result<T, E>) -> T {
    match bound {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind the {service} listener: {e}");
            process::exit(1);
        }
    }
}

/// Runs a service to completion; a service that fails takes the whole process down with it.
fn spawn_service<F, E>(
    services: &mut JoinSet<()>,
    name: &'static str,
    cancel: &CancellationToken,
    service: F,
) where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    let cancel = cancel.clone();
    services.spawn(async move {
        if let Err(e) = service.await {
            error!("The {name} service failed: {e}");
            cancel.cancel();
        }
    });
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn sync_config(config: &Config) -> SyncConfig {
    SyncConfig {
        auth_timeout: config.auth_timeout(),
        write_timeout: config.write_timeout(),
        session_queue_capacity: config.session_queue_capacity,
        ingress_capacity: config.progress_ingress_capacity,
        ..SyncConfig::default()
    }
}

fn notification_config(config: &Config) -> NotificationConfig {
    NotificationConfig {
        ingress_capacity: config.notification_ingress_capacity,
        stale_threshold: config.stale_threshold(),
        reap_interval: config.reap_interval(),
        buffer_size: config.udp_buffer_size,
    }
}

fn chat_config(config: &Config) -> ChatConfig {
    ChatConfig {
        default_room: config.chat_default_room.clone(),
        member_queue_capacity: config.chat_queue_capacity,
        ingress_capacity: config.chat_ingress_capacity,
        ..ChatConfig::default()
    }
}
