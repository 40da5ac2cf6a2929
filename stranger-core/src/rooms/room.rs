use std::fmt::Display;

use crate::SessionId;

/// Identifies a room. Also the scope messages are relayed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Derives the id from its two members. Order matters, the requester comes first.
    pub fn for_pair(requester: SessionId, partner: SessionId) -> Self {
        Self(format!("room_{requester}_{partner}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A session's presence in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub session_id: SessionId,
    /// The nickname the session joined with, attached to every message it sends.
    pub nickname: String,
}

/// An active pairing of exactly two sessions.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    members: [Member; 2],
}

impl Room {
    pub(super) fn new(requester: Member, partner: Member) -> Self {
        Self {
            id: RoomId::for_pair(requester.session_id, partner.session_id),
            members: [requester, partner],
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn members(&self) -> &[Member; 2] {
        &self.members
    }

    pub fn member(&self, session_id: SessionId) -> Option<&Member> {
        self.members.iter().find(|m| m.session_id == session_id)
    }

    /// Returns the other member, or [None] if the session is not in this room.
    pub fn partner_of(&self, session_id: SessionId) -> Option<&Member> {
        match &self.members {
            [a, b] if a.session_id == session_id => Some(b),
            [a, b] if b.session_id == session_id => Some(a),
            _ => None,
        }
    }
}
