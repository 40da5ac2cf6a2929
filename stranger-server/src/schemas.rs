use serde::Deserialize;
use stranger_core::{GenderFilter, JoinRequest, RoomId};
use validator::Validate;

use crate::errors::FrameError;

/// A single inbound frame: `{"event": "...", "data": {...}}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "data")]
pub enum ClientFrame {
    JoinQueue(JoinQueueSchema),
    SendMessage(SendMessageSchema),
    ReportUser,
    LeaveRoom,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQueueSchema {
    #[validate(length(min = 1, max = 32))]
    pub nickname: String,
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
    #[validate(length(min = 1, max = 32))]
    pub gender_filter: String,
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,
}

/// Clients also send a `sender` field. It is ignored, relayed messages
/// carry the nickname the session joined with.
#[derive(Debug, Validate, Deserialize)]
pub struct SendMessageSchema {
    #[serde(rename = "roomID")]
    #[validate(length(min = 1, max = 128))]
    pub room_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

impl ClientFrame {
    /// Parses and validates a text frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let frame: Self = serde_json::from_str(text)?;

        match &frame {
            Self::JoinQueue(schema) => schema.validate()?,
            Self::SendMessage(schema) => schema.validate()?,
            Self::ReportUser | Self::LeaveRoom => {}
        }

        Ok(frame)
    }
}

impl From<JoinQueueSchema> for JoinRequest {
    fn from(value: JoinQueueSchema) -> Self {
        Self {
            nickname: value.nickname,
            gender: value.gender,
            gender_filter: GenderFilter::from(value.gender_filter),
            device_id: value.device_id,
        }
    }
}

impl SendMessageSchema {
    pub fn room_id(&self) -> RoomId {
        RoomId::from(self.room_id.clone())
    }
}
