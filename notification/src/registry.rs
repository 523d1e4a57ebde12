use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::*;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A client registered for chapter-release datagrams.
#[derive(Debug, Clone, PartialEq)]
pub struct Registrant {
    pub client_id: String,
    pub user_id: Option<String>,
    pub username: Option<String>,
    /// Address the client last registered from.
    pub addr: SocketAddr,
    pub last_seen: Instant,
}

/// Registrants keyed by `client_id`.
#[derive(Default)]
pub struct RegistrantRegistry {
    clients: DashMap<String, Registrant>,
}

impl RegistrantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a registrant, or refreshes the address, user fields and
    /// `last_seen` of an existing one. Returns `true` for a new client id.
    pub fn register(&self, registrant: Registrant) -> bool {
        match self.clients.entry(registrant.client_id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.addr = registrant.addr;
                existing.user_id = registrant.user_id;
                existing.username = registrant.username;
                existing.last_seen = existing.last_seen.max(registrant.last_seen);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(registrant);
                true
            }
        }
    }

    pub fn unregister(&self, client_id: &str) -> Option<Registrant> {
        self.clients.remove(client_id).map(|(_, registrant)| registrant)
    }

    /// Refreshes `last_seen` of every registrant at `addr`; returns how many matched.
    pub fn touch(&self, addr: SocketAddr, now: Instant) -> usize {
        let mut touched = 0;
        for mut entry in self.clients.iter_mut() {
            if entry.addr == addr {
                entry.last_seen = entry.last_seen.max(now);
                touched += 1;
            }
        }
        touched
    }

    pub fn get(&self, client_id: &str) -> Option<Registrant> {
        self.clients.get(client_id).map(|entry| entry.clone())
    }

    /// Addresses of every registrant at this moment.
    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.clients.iter().map(|entry| entry.addr).collect()
    }

    /// Removes registrants silent for longer than `threshold` as of `now`.
    ///
    /// Victims are collected first and then removed one by one, re-checking
    /// each, so a registrant refreshed in between survives.
    pub fn reap(&self, now: Instant, threshold: Duration) -> Vec<String> {
        let is_stale =
            |registrant: &Registrant| now.saturating_duration_since(registrant.last_seen) > threshold;

        let candidates: Vec<String> = self
            .clients
            .iter()
            .filter(|entry| is_stale(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        let reaped: Vec<String> = candidates
            .into_iter()
            .filter_map(|client_id| {
                self.clients
                    .remove_if(&client_id, |_, registrant| is_stale(registrant))
                    .map(|(client_id, _)| client_id)
            })
            .collect();

        for client_id in &reaped {
            info!("Removed stale notification client: {client_id}");
        }
        reaped
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
