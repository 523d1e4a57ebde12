use crate::config::ChatConfig;
use crate::error::{Error, ErrorKind};
use crate::request::MemberRequest;
use crate::rooms::{Member, Rooms};
use log::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wire::chat::ChatEvent;

/// Unique identifier for a chat member (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChatStats {
    pub total_rooms: usize,
    pub total_members: usize,
}

/// A registered member's side of the hub: its id, the room it was placed in
/// and the queue of encoded frames addressed to it.
pub struct Membership {
    pub id: MemberId,
    pub room: String,
    pub outbound: mpsc::Receiver<Arc<str>>,
}

enum Command {
    Register {
        id: MemberId,
        username: String,
        room: String,
        outbound: mpsc::Sender<Arc<str>>,
    },
    Unregister {
        id: MemberId,
    },
    Request {
        id: MemberId,
        request: MemberRequest,
    },
    Broadcast(ChatEvent),
    Stats(oneshot::Sender<ChatStats>),
}

/// Handle to the hub task. Cheap to clone.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<Command>,
    config: Arc<ChatConfig>,
}

/// The task that owns every room.
pub struct HubTask {
    commands: mpsc::Receiver<Command>,
    rooms: Rooms,
    default_room: String,
}

impl Hub {
    pub fn new(config: ChatConfig) -> (Hub, HubTask) {
        let (tx, rx) = mpsc::channel(config.ingress_capacity);
        let task = HubTask {
            commands: rx,
            rooms: Rooms::default(),
            default_room: config.default_room.clone(),
        };

        (
            Hub {
                commands: tx,
                config: Arc::new(config),
            },
            task,
        )
    }

    pub fn default_room(&self) -> &str {
        &self.config.default_room
    }

    /// Registers a member in `room`, or in the default room when none is given.
    pub async fn connect(&self, username: &str, room: Option<&str>) -> Result<Membership, Error> {
        let room = room
            .map(str::trim)
            .filter(|room| !room.is_empty())
            .unwrap_or(&self.config.default_room)
            .to_string();
        let (tx, rx) = mpsc::channel(self.config.member_queue_capacity);
        let id = MemberId::new();

        self.commands
            .send(Command::Register {
                id,
                username: username.to_string(),
                room: room.clone(),
                outbound: tx,
            })
            .await?;

        Ok(Membership {
            id,
            room,
            outbound: rx,
        })
    }

    pub async fn disconnect(&self, id: MemberId) -> Result<(), Error> {
        Ok(self.commands.send(Command::Unregister { id }).await?)
    }

    pub async fn submit(&self, id: MemberId, request: MemberRequest) -> Result<(), Error> {
        Ok(self.commands.send(Command::Request { id, request }).await?)
    }

    /// Queues an event for its room (the default room when it names none)
    /// without waiting.
    pub fn broadcast(&self, event: ChatEvent) -> Result<(), Error> {
        self.commands
            .try_send(Command::Broadcast(event))
            .map_err(|e| {
                let err = Error::from(e);
                warn!("Dropping chat broadcast: {err}");
                err
            })
    }

    pub async fn stats(&self) -> Result<ChatStats, Error> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Stats(tx)).await?;
        rx.await.map_err(|_| Error::new(ErrorKind::Closed))
    }
}

impl HubTask {
    /// Applies commands in arrival order until cancelled or until every
    /// [`Hub`] handle is dropped. On exit every member queue is closed.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let command = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            self.apply(command);
        }

        self.rooms.clear();
        debug!("Chat hub stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Register {
                id,
                username,
                room,
                outbound,
            } => {
                info!("User {username} joined room {room}");
                let notice = ChatEvent::system(&room, format!("{username} joined the chat"));
                self.rooms.insert(&room, id, Member { username, outbound });
                self.rooms.deliver(&room, &notice);
            }
            Command::Unregister { id } => {
                if let Some((room, member)) = self.rooms.remove(id) {
                    info!("User {} left room {room}", member.username);
                    let notice =
                        ChatEvent::system(&room, format!("{} left the chat", member.username));
                    self.rooms.deliver(&room, &notice);
                }
            }
            Command::Request { id, request } => self.handle_request(id, request),
            Command::Broadcast(event) => {
                let room = event
                    .room
                    .clone()
                    .unwrap_or_else(|| self.default_room.clone());
                let delivered = self.rooms.deliver(&room, &event);
                debug!("Broadcast to room {room} reached {delivered} member(s)");
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.rooms.stats());
            }
        }
    }

    fn handle_request(&mut self, id: MemberId, request: MemberRequest) {
        // Requests can still arrive from a member that was just evicted.
        let (Some(room), Some(username)) = (self.rooms.room_of(id), self.rooms.username_of(id))
        else {
            return;
        };
        let (room, username) = (room.to_string(), username.to_string());

        match request {
            MemberRequest::Chat { content } => {
                let event = ChatEvent::chat(&username, &room, content);
                self.rooms.deliver(&room, &event);
            }
            MemberRequest::JoinRoom { room: target } => {
                self.move_member(id, &username, &room, &target);
            }
            MemberRequest::LeaveRoom => {
                let target = self.default_room.clone();
                self.move_member(id, &username, &room, &target);
            }
            MemberRequest::Rejected { reason } => {
                self.rooms.send_to(id, &ChatEvent::error(reason));
            }
        }
    }

    fn move_member(&mut self, id: MemberId, username: &str, from: &str, to: &str) {
        if from == to {
            return;
        }
        let Some((_, member)) = self.rooms.remove(id) else {
            return;
        };

        self.rooms
            .deliver(from, &ChatEvent::system(from, format!("{username} left the room")));
        self.rooms.insert(to, id, member);
        self.rooms
            .deliver(to, &ChatEvent::system(to, format!("{username} joined the room")));

        info!("User {username} moved from room {from} to {to}");
    }
}
