use crate::auth::Identity;
use crate::error::Error;
use crate::outbound::Outbound;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

pub type UserId = String;

/// Unique identifier for a session (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// An authenticated session as seen by the fan-out path.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub user_id: UserId,
    pub username: String,
    outbound: Outbound,
}

impl SessionHandle {
    pub fn new(id: ConnectionId, peer: SocketAddr, identity: Identity, outbound: Outbound) -> Self {
        Self {
            id,
            peer,
            user_id: identity.user_id,
            username: identity.username,
            outbound,
        }
    }

    pub fn enqueue(&self, frame: Arc<str>) -> Result<(), Error> {
        self.outbound.enqueue(frame)
    }

    pub fn close(&self) {
        self.outbound.close();
    }
}

#[derive(Default)]
struct Index {
    sessions: HashMap<ConnectionId, SessionHandle>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl Index {
    fn insert(&mut self, handle: SessionHandle) {
        self.by_user
            .entry(handle.user_id.clone())
            .or_default()
            .insert(handle.id.clone());
        self.sessions.insert(handle.id.clone(), handle);
    }
}

/// Registry of authenticated sessions with a secondary per-user index.
///
/// Both indexes live behind one lock and are only ever changed together, so
/// a reader never sees a session in one index and not the other.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<Index>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handle: SessionHandle) {
        let mut index = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        index.insert(handle);
    }

    /// Queues `first_frame` for the session, then adds it.
    ///
    /// Both happen under the write lock, so any broadcast dispatched after the
    /// session becomes visible is queued behind `first_frame`.
    pub fn add_after(&self, handle: SessionHandle, first_frame: Arc<str>) -> Result<(), Error> {
        let mut index = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        handle.enqueue(first_frame)?;
        index.insert(handle);
        Ok(())
    }

    pub fn remove(&self, id: &ConnectionId) -> Option<SessionHandle> {
        let mut index = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let handle = index.sessions.remove(id)?;

        if let Some(ids) = index.by_user.get_mut(&handle.user_id) {
            ids.remove(id);
            if ids.is_empty() {
                index.by_user.remove(&handle.user_id);
            }
        }

        Some(handle)
    }

    /// Copy of every registered session, taken under the read lock.
    pub fn snapshot(&self) -> Vec<SessionHandle> {
        let index = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        index.sessions.values().cloned().collect()
    }

    pub fn sessions_for_user(&self, user_id: &str) -> Vec<SessionHandle> {
        let index = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        index
            .by_user
            .get(user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| index.sessions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `(sessions, distinct users)`
    pub fn counts(&self) -> (usize, usize) {
        let index = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (index.sessions.len(), index.by_user.len())
    }

    /// Removes every session and closes it.
    pub fn close_all(&self) {
        let drained: Vec<SessionHandle> = {
            let mut index = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            index.by_user.clear();
            index.sessions.drain().map(|(_, handle)| handle).collect()
        };

        for handle in drained {
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn handle(user_id: &str) -> (SessionHandle, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(8);
        let identity = Identity {
            user_id: user_id.to_string(),
            username: format!("{user_id}-name"),
        };
        let outbound = Outbound::new(tx, CancellationToken::new());
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        (
            SessionHandle::new(ConnectionId::new(), peer, identity, outbound),
            rx,
        )
    }

    #[test]
    fn indexes_sessions_by_user() {
        let registry = SessionRegistry::new();
        let (phone, _rx1) = handle("alice");
        let (laptop, _rx2) = handle("alice");
        let (other, _rx3) = handle("bob");

        registry.add(phone.clone());
        registry.add(laptop);
        registry.add(other);

        assert_eq!(registry.counts(), (3, 2));
        assert_eq!(registry.sessions_for_user("alice").len(), 2);
        assert_eq!(registry.sessions_for_user("bob").len(), 1);
        assert!(registry.sessions_for_user("carol").is_empty());

        registry.remove(&phone.id);
        assert_eq!(registry.counts(), (2, 2));
        assert_eq!(registry.sessions_for_user("alice").len(), 1);
    }

    #[test]
    fn removing_last_session_drops_user_entry() {
        let registry = SessionRegistry::new();
        let (session, _rx) = handle("alice");
        registry.add(session.clone());

        assert!(registry.remove(&session.id).is_some());
        assert!(registry.remove(&session.id).is_none());
        assert_eq!(registry.counts(), (0, 0));
    }

    #[test]
    fn add_after_queues_first_frame_before_registration() {
        let registry = SessionRegistry::new();
        let (session, mut rx) = handle("alice");

        registry.add_after(session, "welcome".into()).unwrap();

        assert_eq!(registry.counts(), (1, 1));
        assert_eq!(rx.try_recv().unwrap().as_ref(), "welcome");
    }

    #[test]
    fn close_all_empties_registry() {
        let registry = SessionRegistry::new();
        let (session, _rx) = handle("alice");
        registry.add(session.clone());

        registry.close_all();

        assert_eq!(registry.counts(), (0, 0));
        assert!(session.enqueue("late".into()).is_err());
    }
}
