//! Everything sent down a gateway socket is defined here
//! along with the conversion from engine events

use serde::Serialize;
use stranger_core::SessionEvent;

/// The sender shown for notices that come from the system itself
pub const SYSTEM_SENDER: &str = "System";

/// A single outbound frame: `{"event": "...", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "data")]
pub enum ServerEvent {
    /// The session was paired
    MatchFound {
        #[serde(rename = "roomID")]
        room_id: String,
    },
    /// A chat message, or a notice from [SYSTEM_SENDER]
    ReceiveMessage { sender: String, message: String },
    /// The partner is gone, the room no longer exists
    PartnerLeft,
    /// A join attempt was refused
    JoinRejected {
        reason: &'static str,
        message: String,
    },
    /// An inbound frame could not be handled
    Error { message: String },
}

impl ServerEvent {
    fn system(message: String) -> Self {
        Self::ReceiveMessage {
            sender: SYSTEM_SENDER.to_string(),
            message,
        }
    }

    /// Encodes the frame as JSON text.
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).expect("server events always serialize")
    }
}

/// Helper trait to convert engine events into the frames clients understand
pub trait ToSerialized {
    /// Older clients only know `receive_message`, so control signals may be
    /// duplicated as system messages when `legacy` is set.
    fn to_serialized(self, legacy: bool) -> Vec<ServerEvent>;
}

impl ToSerialized for SessionEvent {
    fn to_serialized(self, legacy: bool) -> Vec<ServerEvent> {
        match self {
            SessionEvent::MatchFound { room_id } => vec![ServerEvent::MatchFound {
                room_id: room_id.to_string(),
            }],
            SessionEvent::Chat { sender, message } => {
                vec![ServerEvent::ReceiveMessage { sender, message }]
            }
            SessionEvent::System { message } => vec![ServerEvent::system(message)],
            SessionEvent::PartnerLeft => vec![ServerEvent::PartnerLeft],
            SessionEvent::Rejected { reason, message } => {
                let rejected = ServerEvent::JoinRejected {
                    reason: reason.as_str(),
                    message: message.clone(),
                };

                if legacy {
                    vec![rejected, ServerEvent::system(message)]
                } else {
                    vec![rejected]
                }
            }
        }
    }
}
