use crate::config::ChatConfig;
use crate::error::Error;
use crate::hub::{Hub, HubTask};
use crate::member;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::*;
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub username: Option<String>,
    pub room: Option<String>,
}

#[derive(Clone)]
struct ChatState {
    hub: Hub,
    cancel: CancellationToken,
    max_message_size: usize,
}

/// WebSocket front end of the chat hub, served on its own port.
pub struct ChatServer {
    listener: TcpListener,
    hub: Hub,
    hub_task: HubTask,
    config: ChatConfig,
}

impl ChatServer {
    pub async fn bind(addr: impl ToSocketAddrs, config: ChatConfig) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let (hub, hub_task) = Hub::new(config.clone());

        Ok(Self {
            listener,
            hub,
            hub_task,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> Hub {
        self.hub.clone()
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<(), Error> {
        let Self {
            listener,
            hub,
            hub_task,
            config,
        } = self;

        info!("Chat server listening on ws://{}/ws", listener.local_addr()?);

        let hub_task = tokio::spawn(hub_task.run(cancel.clone()));
        let app = router(hub, cancel.clone(), config.max_message_size);

        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .await?;

        let _ = hub_task.await;
        info!("Chat server stopped");
        Ok(())
    }
}

fn router(hub: Hub, cancel: CancellationToken, max_message_size: usize) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(ChatState {
        hub,
        cancel,
        max_message_size,
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<ChatState>,
) -> Response {
    let Some(username) = params
        .username
        .map(|username| username.trim().to_string())
        .filter(|username| !username.is_empty())
    else {
        return (StatusCode::BAD_REQUEST, "username is required").into_response();
    };

    debug!("Upgrading chat connection for {username}");

    let ChatState {
        hub,
        cancel,
        max_message_size,
    } = state;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| member::run(socket, hub, username, params.room, cancel))
}
