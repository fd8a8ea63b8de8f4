use pocketchat_core::completion::model_info_text;
use serde::Serialize;

pub const STATUS_ONLINE: &str = "Online";
pub const STATUS_TYPING: &str = "Typing...";
pub const STATUS_LISTENING: &str = "Listening...";
pub const MODEL_INFO_PROCESSING: &str = "Processing your request...";

/// Prompts offered as one-tap chips on the welcome screen.
pub const SUGGESTED_PROMPTS: &[&str] = &[
    "Tell me a joke",
    "Explain quantum physics",
    "Write a poem",
    "Help with coding",
    "What can you help me with?",
];

/// The longer list shown from the "Example Prompts" dialog.
pub const EXAMPLE_PROMPTS: &[&str] = &[
    "Tell me a joke",
    "Explain quantum physics",
    "Write a poem about nature",
    "Help me debug this code",
    "Summarize the latest tech news",
    "Create a workout plan",
    "Translate text to Spanish",
    "Generate creative writing ideas",
];

/// 1-based lookup, as the prompts are numbered on screen.
pub fn numbered_prompt(prompts: &[&'static str], n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| prompts.get(i)).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WelcomeShown,
    Chatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Recording,
}

/// Everything the chat screen renders, apart from the transcript itself.
///
/// Owned by the UI loop and passed into every handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenState {
    pub phase: Phase,
    pub recording: RecordingState,
    // User sends since the last clear.
    pub message_count: usize,
    pub draft: String,
    pub typing: bool,
    pub status_text: String,
    pub model_info: String,
    pub volume: f32,
    pub text_size: f32,
}

impl ScreenState {
    pub fn new(preferred_model: Option<&str>, text_size: f32) -> Self {
        Self {
            phase: Phase::WelcomeShown,
            recording: RecordingState::Idle,
            message_count: 0,
            draft: String::new(),
            typing: false,
            status_text: STATUS_ONLINE.into(),
            model_info: ready_text(preferred_model),
            volume: 0.0,
            text_size,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording == RecordingState::Recording
    }

    pub(crate) fn show_typing(&mut self) {
        self.typing = true;
        self.status_text = STATUS_TYPING.into();
        self.model_info = MODEL_INFO_PROCESSING.into();
    }

    pub(crate) fn hide_typing(&mut self, model: Option<&str>) {
        self.typing = false;
        self.status_text = if self.is_recording() {
            STATUS_LISTENING.into()
        } else {
            STATUS_ONLINE.into()
        };
        self.model_info = ready_text(model);
    }
}

fn ready_text(model: Option<&str>) -> String {
    match model {
        Some(m) => model_info_text(m),
        None => "No model configured".into(),
    }
}
