//! Live session registry and room membership.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::auth::Principal;

use super::events::{rooms, ServerEvent};

/// Per-session state. Mutated only by its own connection handler and by
/// room-membership calls.
pub struct SessionEntry {
    pub session_id: String,
    pub principal: Principal,
    pub rooms: HashSet<String>,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// A snapshot handle for delivering to one session.
#[derive(Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Registry of all connected sessions plus a user-id index for targeted
/// fan-out and presence queries.
///
/// Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
/// entry for non-poisoning, fast locking. Invariant: a session id appears
/// in the user index under exactly one user, and removing the last session
/// of a user removes the user's index entry entirely.
pub struct SessionRegistry {
    sessions: DashMap<String, Mutex<SessionEntry>>,
    by_user: DashMap<String, HashSet<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            by_user: DashMap::new(),
        }
    }

    /// Register an authenticated session. Auto-joins its user and role
    /// rooms and records it in the user index.
    pub fn register(
        &self,
        session_id: String,
        principal: Principal,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let mut room_set = HashSet::new();
        room_set.insert(rooms::user(&principal.user_id));
        room_set.insert(rooms::role(&principal.role));

        self.by_user
            .entry(principal.user_id.clone())
            .or_default()
            .insert(session_id.clone());

        let entry = SessionEntry {
            session_id: session_id.clone(),
            principal,
            rooms: room_set,
            sender,
        };
        self.sessions.insert(session_id, Mutex::new(entry));
    }

    /// Remove a session on disconnect. Also drops it from the user index,
    /// deleting the user's entry when its last session goes away.
    pub fn deregister(&self, session_id: &str) -> Option<String> {
        let (_, entry) = self.sessions.remove(session_id)?;
        let user_id = entry.into_inner().principal.user_id;

        let now_empty = match self.by_user.get_mut(&user_id) {
            Some(mut set) => {
                set.remove(session_id);
                set.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_user.remove_if(&user_id, |_, set| set.is_empty());
        }
        Some(user_id)
    }

    /// Add a session to a room. Returns `None` for unknown sessions,
    /// otherwise whether the membership is new (joins are idempotent).
    pub fn join_room(&self, session_id: &str, room: &str) -> Option<bool> {
        let entry = self.sessions.get(session_id)?;
        let mut e = entry.lock();
        Some(e.rooms.insert(room.to_string()))
    }

    /// Remove a session from a room. Returns `None` for unknown sessions,
    /// otherwise whether the session was a member.
    pub fn leave_room(&self, session_id: &str, room: &str) -> Option<bool> {
        let entry = self.sessions.get(session_id)?;
        let mut e = entry.lock();
        Some(e.rooms.remove(room))
    }

    /// Snapshot every session that is a member of at least one of `rooms`.
    /// Each session appears once, however many of the rooms it is in, so
    /// delivery stays at-most-once per session.
    pub fn members_of_any(&self, rooms: &[String]) -> Vec<SessionHandle> {
        let mut handles = Vec::new();
        for item in self.sessions.iter() {
            let e = item.value().lock();
            if rooms.iter().any(|room| e.rooms.contains(room)) {
                handles.push(SessionHandle {
                    session_id: e.session_id.clone(),
                    sender: e.sender.clone(),
                });
            }
        }
        handles
    }

    /// Snapshot every connected session.
    pub fn all_sessions(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|item| {
                let e = item.value().lock();
                SessionHandle {
                    session_id: e.session_id.clone(),
                    sender: e.sender.clone(),
                }
            })
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn online_user_ids(&self) -> Vec<String> {
        self.by_user.iter().map(|e| e.key().clone()).collect()
    }

    pub fn is_user_online(&self, user_id: &str) -> bool {
        self.by_user
            .get(user_id)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// Room membership check, for diagnostics and tests.
    pub fn in_room(&self, session_id: &str, room: &str) -> bool {
        self.sessions
            .get(session_id)
            .map(|entry| entry.lock().rooms.contains(room))
            .unwrap_or(false)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
