use std::fmt::Display;

use crate::Id;

/// A connected participant. Only its id lives in the engine; the
/// transport owns the connection itself.
pub struct Session;

pub type SessionId = Id<Session>;

/// A participant's constraint on their partner's gender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenderFilter {
    /// No constraint
    Any,
    /// Only partners with exactly this gender
    Only(String),
}

impl GenderFilter {
    /// The sentinel used on the wire for [GenderFilter::Any].
    pub const ANY: &'static str = "Any";

    /// Returns true if a partner with the given gender satisfies this filter.
    pub fn accepts(&self, gender: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(wanted) => wanted == gender,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl From<String> for GenderFilter {
    fn from(value: String) -> Self {
        if value == Self::ANY {
            Self::Any
        } else {
            Self::Only(value)
        }
    }
}

impl From<&str> for GenderFilter {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl Display for GenderFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str(Self::ANY),
            Self::Only(gender) => f.write_str(gender),
        }
    }
}

/// Everything a session supplies when it starts a search.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub nickname: String,
    pub gender: String,
    pub gender_filter: GenderFilter,
    /// Stable client-supplied token. Only used for rate limiting.
    pub device_id: String,
}
