//! Read and write pumps of one WebSocket member.

use crate::hub::{Hub, Membership};
use crate::request::MemberRequest;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use log::*;
use tokio_util::sync::CancellationToken;

pub(crate) async fn run(
    socket: WebSocket,
    hub: Hub,
    username: String,
    room: Option<String>,
    cancel: CancellationToken,
) {
    let Membership {
        id,
        room,
        outbound: mut queue,
    } = match hub.connect(&username, room.as_deref()).await {
        Ok(membership) => membership,
        Err(e) => {
            warn!("Could not register chat member {username}: {e}");
            return;
        }
    };
    debug!("Chat member {username} ({id}) connected to room {room}");

    let (mut sink, mut stream) = socket.split();

    // Ends when the hub drops the queue: on disconnect, eviction or shutdown.
    let writer = tokio::spawn(async move {
        while let Some(frame) = queue.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.to_string().into())).await {
                debug!("Chat write failed: {e}");
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                let Some(request) = MemberRequest::parse(text.as_str()) else {
                    continue;
                };
                if hub.submit(id, request).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!("Chat read from {username} failed: {e}");
                break;
            }
        }
    }

    let _ = hub.disconnect(id).await;
    let _ = writer.await;
    debug!("Chat member {username} ({id}) disconnected");
}
