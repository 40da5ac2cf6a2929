mod room;

use std::collections::HashMap;

pub use room::*;
use thiserror::Error;

use crate::SessionId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Session {0} is already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),
    #[error("A session cannot be paired with itself")]
    SelfPairing,
}

/// Tracks active rooms and which session is in which.
///
/// Both maps are always updated together, so a room is either fully
/// registered with both members or not registered at all.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    memberships: HashMap<SessionId, RoomId>,
}

impl RoomRegistry {
    /// Pairs two sessions in a new room.
    pub fn create(&mut self, requester: Member, partner: Member) -> Result<&Room, RoomError> {
        if requester.session_id == partner.session_id {
            return Err(RoomError::SelfPairing);
        }

        for member in [&requester, &partner] {
            if let Some(existing) = self.memberships.get(&member.session_id) {
                return Err(RoomError::AlreadyInRoom(
                    member.session_id,
                    existing.clone(),
                ));
            }
        }

        let room = Room::new(requester, partner);
        let id = room.id().clone();

        for member in room.members() {
            self.memberships.insert(member.session_id, id.clone());
        }

        Ok(&*self.rooms.entry(id).or_insert(room))
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Returns the room the session is currently in, if any
    pub fn room_of(&self, session_id: SessionId) -> Option<&Room> {
        self.memberships
            .get(&session_id)
            .and_then(|id| self.rooms.get(id))
    }

    /// Tears down the session's room, returning it so the partner can be notified.
    pub fn remove_by_member(&mut self, session_id: SessionId) -> Option<Room> {
        let room_id = self.memberships.get(&session_id)?.clone();
        let room = self
            .rooms
            .remove(&room_id)
            .expect("membership always points to an existing room");

        for member in room.members() {
            self.memberships.remove(&member.session_id);
        }

        Some(room)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
