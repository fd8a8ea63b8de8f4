use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one queued send, so replies can be matched to the turn that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub turn: TurnId,
    pub role: Role,
    pub text: String,
    pub ts_unix_ms: i64,
}

impl ChatMessage {
    pub fn new(turn: TurnId, role: Role, text: impl Into<String>, ts_unix_ms: i64) -> Self {
        Self {
            turn,
            role,
            text: text.into(),
            ts_unix_ms,
        }
    }
}
