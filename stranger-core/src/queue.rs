use std::collections::VecDeque;

use crate::{GenderFilter, JoinRequest, SessionId};

/// A session waiting for a partner, with the criteria it joined with.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub session_id: SessionId,
    pub nickname: String,
    pub gender: String,
    pub gender_filter: GenderFilter,
}

impl QueueEntry {
    pub fn new(session_id: SessionId, request: &JoinRequest) -> Self {
        Self {
            session_id,
            nickname: request.nickname.clone(),
            gender: request.gender.clone(),
            gender_filter: request.gender_filter.clone(),
        }
    }

    /// Returns true if both sides accept each other's gender.
    pub fn is_compatible_with(&self, other: &QueueEntry) -> bool {
        self.gender_filter.accepts(&other.gender) && other.gender_filter.accepts(&self.gender)
    }
}

/// Sessions seeking a partner, oldest first.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    entries: VecDeque<QueueEntry>,
}

impl WaitingQueue {
    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    /// Puts an entry back at the head of the queue, keeping its place in line.
    pub fn restore(&mut self, entry: QueueEntry) {
        self.entries.push_front(entry);
    }

    /// Removes and returns the oldest entry compatible with the candidate.
    /// The candidate never matches its own entry.
    pub fn take_first_match(&mut self, candidate: &QueueEntry) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|entry| {
            entry.session_id != candidate.session_id && candidate.is_compatible_with(entry)
        })?;

        self.entries.remove(index)
    }

    /// Removes every entry belonging to the session, returning true if any existed.
    pub fn remove(&mut self, session_id: SessionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.session_id != session_id);

        before != self.entries.len()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.entries.iter().any(|e| e.session_id == session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
