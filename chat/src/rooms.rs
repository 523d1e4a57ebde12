use crate::hub::{ChatStats, MemberId};
use log::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use wire::chat::ChatEvent;

pub(crate) struct Member {
    pub(crate) username: String,
    pub(crate) outbound: mpsc::Sender<Arc<str>>,
}

/// Room membership, owned by the hub task.
///
/// Every member is in exactly one room and no room is ever empty.
#[derive(Default)]
pub(crate) struct Rooms {
    rooms: HashMap<String, HashMap<MemberId, Member>>,
    locations: HashMap<MemberId, String>,
}

impl Rooms {
    pub(crate) fn insert(&mut self, room: &str, id: MemberId, member: Member) {
        self.remove(id);
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(id, member);
        self.locations.insert(id, room.to_string());
    }

    /// Removes a member, dropping its room when it was the last one.
    pub(crate) fn remove(&mut self, id: MemberId) -> Option<(String, Member)> {
        let room = self.locations.remove(&id)?;
        let members = self.rooms.get_mut(&room)?;
        let member = members.remove(&id);
        if members.is_empty() {
            self.rooms.remove(&room);
            debug!("Room {room} is empty, dropping it");
        }
        member.map(|member| (room, member))
    }

    pub(crate) fn room_of(&self, id: MemberId) -> Option<&str> {
        self.locations.get(&id).map(String::as_str)
    }

    pub(crate) fn username_of(&self, id: MemberId) -> Option<&str> {
        let room = self.locations.get(&id)?;
        self.rooms
            .get(room)?
            .get(&id)
            .map(|member| member.username.as_str())
    }

    /// Queues `event` for every member of `room`, evicting members whose
    /// queue is full or gone. Returns the number of members it was queued for.
    pub(crate) fn deliver(&mut self, room: &str, event: &ChatEvent) -> usize {
        let frame: Arc<str> = match event.encode() {
            Ok(frame) => frame.into(),
            Err(e) => {
                error!("Failed to encode chat event: {e}");
                return 0;
            }
        };

        let Some(members) = self.rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        let mut evicted = Vec::new();
        for (id, member) in members {
            match member.outbound.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Evicting slow chat member {} from room {room}",
                        member.username
                    );
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => evicted.push(*id),
            }
        }

        for id in evicted {
            self.remove(id);
        }
        delivered
    }

    /// Queues `event` for a single member, evicting it on failure.
    pub(crate) fn send_to(&mut self, id: MemberId, event: &ChatEvent) -> bool {
        let frame: Arc<str> = match event.encode() {
            Ok(frame) => frame.into(),
            Err(e) => {
                error!("Failed to encode chat event: {e}");
                return false;
            }
        };

        let queued = match self.room_of(id).and_then(|room| self.rooms.get(room)?.get(&id)) {
            Some(member) => member.outbound.try_send(frame).is_ok(),
            None => return false,
        };

        if !queued {
            warn!("Evicting chat member {id}: outbound queue unavailable");
            self.remove(id);
        }
        queued
    }

    pub(crate) fn stats(&self) -> ChatStats {
        ChatStats {
            total_rooms: self.rooms.len(),
            total_members: self.locations.len(),
        }
    }

    /// Drops every member, closing their queues.
    pub(crate) fn clear(&mut self) {
        self.rooms.clear();
        self.locations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, capacity: usize) -> (Member, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Member {
                username: name.to_string(),
                outbound: tx,
            },
            rx,
        )
    }

    #[test]
    fn moving_a_member_drops_the_emptied_room() {
        let mut rooms = Rooms::default();
        let id = MemberId::new();
        let (alice, _rx) = member("alice", 4);

        rooms.insert("r1", id, alice);
        let (_, alice) = rooms.remove(id).unwrap();
        rooms.insert("r2", id, alice);

        assert_eq!(rooms.room_of(id), Some("r2"));
        assert_eq!(
            rooms.stats(),
            ChatStats {
                total_rooms: 1,
                total_members: 1
            }
        );
    }

    #[test]
    fn reinserting_keeps_member_in_one_room() {
        let mut rooms = Rooms::default();
        let id = MemberId::new();
        let (first, _rx1) = member("alice", 4);
        let (second, _rx2) = member("alice", 4);

        rooms.insert("r1", id, first);
        rooms.insert("r2", id, second);

        assert_eq!(rooms.stats().total_rooms, 1);
        assert_eq!(rooms.stats().total_members, 1);
    }

    #[test]
    fn delivery_is_limited_to_the_target_room() {
        let mut rooms = Rooms::default();
        let (m1, mut rx1) = member("m1", 4);
        let (m2, mut rx2) = member("m2", 4);
        rooms.insert("r1", MemberId::new(), m1);
        rooms.insert("r2", MemberId::new(), m2);

        let delivered = rooms.deliver("r1", &ChatEvent::chat("m1", "r1", "hello"));

        assert_eq!(delivered, 1);
        assert!(rx1.try_recv().unwrap().contains("hello"));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn closed_queue_evicts_member() {
        let mut rooms = Rooms::default();
        let id = MemberId::new();
        let (gone, rx) = member("gone", 4);
        rooms.insert("r1", id, gone);
        drop(rx);

        assert_eq!(rooms.deliver("r1", &ChatEvent::system("r1", "ping")), 0);
        assert!(rooms.room_of(id).is_none());
        assert_eq!(rooms.stats().total_rooms, 0);
    }
}
