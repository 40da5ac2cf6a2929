use crossbeam::channel::{Receiver, Sender};

use crate::{RoomId, SessionId};

pub type EventSender = Sender<Delivery>;
pub type EventReceiver = Receiver<Delivery>;

/// An event addressed to a single session.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: SessionId,
    pub event: SessionEvent,
}

/// Describes the events the engine sends to sessions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session was paired and placed in a room.
    MatchFound { room_id: RoomId },
    /// A chat message relayed from the partner.
    Chat {
        /// The nickname the partner joined with.
        sender: String,
        message: String,
    },
    /// A human readable notice from the system itself.
    System { message: String },
    /// The partner left, reported, or disconnected. The room no longer exists.
    PartnerLeft,
    /// A join attempt was refused. Only sent to the session that attempted it.
    Rejected {
        reason: Rejection,
        message: String,
    },
}

/// Why a join attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The device used up its filtered searches for today.
    DailyLimitReached,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyLimitReached => "daily_limit_reached",
        }
    }
}
