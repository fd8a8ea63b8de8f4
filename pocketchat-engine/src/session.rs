use serde::{Deserialize, Serialize};

/// Lifecycle of one voice input session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    #[default]
    Idle,
    // Waiting on the microphone permission prompt.
    PendingPermission,
    Listening,
}

impl VoiceState {
    pub fn is_listening(self) -> bool {
        matches!(self, VoiceState::Listening)
    }

    // A stable string label for UI display.
    pub fn label(self) -> &'static str {
        match self {
            VoiceState::Idle => "idle",
            VoiceState::PendingPermission => "pending_permission",
            VoiceState::Listening => "listening",
        }
    }
}

impl std::fmt::Display for VoiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the voice adapter, kept alongside the state machine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceSession {
    pub state: VoiceState,
    pub last_volume: f32,
    pub last_transcript: Option<String>,
    pub last_error: Option<String>,
}

impl VoiceSession {
    pub fn reset_for_start(&mut self) {
        self.last_volume = 0.0;
        self.last_transcript = None;
        self.last_error = None;
    }
}
