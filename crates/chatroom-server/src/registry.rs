//! Username → connection map shared by every task.
//!
//! Mutations take the write lock; [`Registry::snapshot`] takes the read lock
//! and hands back owned handles, so fan-out never writes to a socket while
//! holding the lock. Closing a removed transport also happens after the lock
//! is released.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chatroom_core::Username;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::connection::Connection;

/// The set of currently connected clients, keyed by identity.
#[derive(Default)]
pub struct Registry {
    members: RwLock<HashMap<Username, Arc<Connection>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `conn` under its username if the name is free.
    ///
    /// Check and insert happen under one write lock, so of several
    /// concurrent registrations for the same name exactly one succeeds.
    pub fn register(&self, conn: Arc<Connection>) -> bool {
        let mut members = self.members.write();
        match members.entry(conn.username().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                debug!(username = %conn.username(), conn_id = %conn.id(), "registered");
                let _ = slot.insert(conn);
                true
            }
        }
    }

    /// The connection registered under `username`, if any.
    pub fn lookup(&self, username: &str) -> Option<Arc<Connection>> {
        self.members.read().get(username).cloned()
    }

    /// Whether `username` is taken.
    pub fn contains(&self, username: &str) -> bool {
        self.members.read().contains_key(username)
    }

    /// Remove `username` and close its transport.
    ///
    /// Returns `false` (and does nothing) if the name is not registered.
    pub async fn unsubscribe(&self, username: &str) -> bool {
        let removed = self.members.write().remove(username);
        match removed {
            Some(conn) => {
                let _ = conn.close().await;
                info!(username = %conn.username(), conn_id = %conn.id(), "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Remove `conn` only if it is still the registered holder of its name,
    /// then close it.
    ///
    /// A later connection that reused the name after `conn` left is not
    /// touched.
    pub async fn unsubscribe_connection(&self, conn: &Connection) -> bool {
        let removed = {
            let mut members = self.members.write();
            let current = members
                .get(conn.username().as_str())
                .is_some_and(|held| held.id() == conn.id());
            if current {
                members.remove(conn.username().as_str())
            } else {
                None
            }
        };
        match removed {
            Some(conn) => {
                let _ = conn.close().await;
                info!(username = %conn.username(), conn_id = %conn.id(), "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Owned handles to every current member.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.members.read().values().cloned().collect()
    }

    /// Sorted list of registered usernames.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .read()
            .keys()
            .map(|name| name.as_str().to_owned())
            .collect();
        names.sort();
        names
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Remove and close every member. Returns how many were removed.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<Arc<Connection>> = self.members.write().drain().map(|(_, c)| c).collect();
        let count = drained.len();
        let _ = futures::future::join_all(drained.iter().map(|conn| conn.close())).await;
        count
    }
}
