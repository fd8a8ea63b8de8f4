pub mod screen;
pub mod service;

pub use screen::{Phase, RecordingState, ScreenState};
pub use service::{Account, ChatEvents, ChatService, Collaborators, UiEvent};
