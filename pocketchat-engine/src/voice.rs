use crate::session::{VoiceSession, VoiceState};
use crate::traits::{
    Permission, PermissionRequester, PermissionStatus, RecognitionOptions, SpeechRecognizer,
    SpeechService,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Device recognizer error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerErrorCode {
    NetworkTimeout,
    Network,
    Audio,
    Server,
    Client,
    SpeechTimeout,
    NoMatch,
    RecognizerBusy,
    InsufficientPermissions,
    Unknown(i32),
}

impl RecognizerErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NetworkTimeout,
            2 => Self::Network,
            3 => Self::Audio,
            4 => Self::Server,
            5 => Self::Client,
            6 => Self::SpeechTimeout,
            7 => Self::NoMatch,
            8 => Self::RecognizerBusy,
            9 => Self::InsufficientPermissions,
            other => Self::Unknown(other),
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Audio => "Audio recording error",
            Self::Client => "Client side error",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::Network => "Network error",
            Self::NetworkTimeout => "Network timeout",
            Self::NoMatch => "No speech input recognized",
            Self::RecognizerBusy => "Recognition service busy",
            Self::Server => "Server error",
            Self::SpeechTimeout => "No speech input detected",
            Self::Unknown(_) => "Unknown error occurred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("Speech recognition not available on this device")]
    RecognitionUnavailable,

    #[error("Microphone permission is required for voice input")]
    PermissionDenied,

    #[error("Failed to start voice recognition: {0}")]
    StartFailed(String),

    #[error("No speech recognized")]
    NoSpeechRecognized,

    #[error("{}", .0.message())]
    Recognizer(RecognizerErrorCode),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    Started,
    Transcript { text: String, is_final: bool },
    /// Normalized to `0.0..=1.0`.
    Volume(f32),
    Failed(VoiceError),
    Stopped,
}

/// Raw callbacks from the speech engine, already moved onto the owning task.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerSignal {
    ReadyForSpeech,
    BeginningOfSpeech,
    /// Level in dB relative to the engine's reference.
    RmsChanged(f32),
    PartialResults(Vec<String>),
    Results(Vec<String>),
    EndOfSpeech,
    Error(i32),
}

pub fn normalize_volume(db: f32) -> f32 {
    if db.is_nan() {
        return 0.0;
    }
    ((db + 10.0) / 20.0).clamp(0.0, 1.0)
}

/// Toggle-style voice input over one exclusively owned recognizer handle.
///
/// The handle is created once in [`VoiceInputAdapter::new`] and released by
/// [`VoiceInputAdapter::release`], which consumes the adapter. If no recognizer
/// could be created, every `start` reports `RecognitionUnavailable`.
pub struct VoiceInputAdapter {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    permissions: Arc<dyn PermissionRequester>,
    options: RecognitionOptions,
    session: VoiceSession,
    events: mpsc::UnboundedSender<VoiceEvent>,
}

impl VoiceInputAdapter {
    pub fn new(
        speech: &dyn SpeechService,
        permissions: Arc<dyn PermissionRequester>,
    ) -> (Self, mpsc::UnboundedReceiver<VoiceEvent>) {
        let recognizer = if speech.is_recognition_available() {
            match speech.create_recognizer() {
                Ok(r) => Some(r),
                Err(e) => {
                    log::warn!("speech recognizer could not be created: {e:#}");
                    None
                }
            }
        } else {
            log::info!("speech recognition not available on this device");
            None
        };

        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                recognizer,
                permissions,
                options: RecognitionOptions::default(),
                session: VoiceSession::default(),
                events,
            },
            rx,
        )
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> VoiceState {
        self.session.state
    }

    pub fn session(&self) -> &VoiceSession {
        &self.session
    }

    pub fn options(&self) -> &RecognitionOptions {
        &self.options
    }

    /// Start listening, or stop if a session is already running.
    pub async fn start(&mut self) {
        if self.session.state == VoiceState::Listening {
            self.stop();
            return;
        }

        if self.recognizer.is_none() {
            self.fail(VoiceError::RecognitionUnavailable);
            return;
        }

        if !self.permissions.is_granted(Permission::RecordAudio) {
            self.session.state = VoiceState::PendingPermission;
            let answer = self.permissions.request(Permission::RecordAudio).await;
            self.session.state = VoiceState::Idle;
            if answer == PermissionStatus::Denied {
                self.fail(VoiceError::PermissionDenied);
                return;
            }
        }

        self.begin_listening();
    }

    fn begin_listening(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            self.fail(VoiceError::RecognitionUnavailable);
            return;
        };

        self.session.reset_for_start();
        match recognizer.start_listening(&self.options) {
            Ok(()) => {
                log::info!("voice session started");
                self.session.state = VoiceState::Listening;
            }
            Err(e) => {
                self.session.state = VoiceState::Idle;
                self.fail(VoiceError::StartFailed(format!("{e:#}")));
            }
        }
    }

    /// Best-effort stop; `Stopped` is always emitted when a session was running.
    pub fn stop(&mut self) {
        if self.session.state != VoiceState::Listening {
            return;
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop_listening();
        }
        self.finish();
    }

    pub fn handle_signal(&mut self, signal: RecognizerSignal) {
        if self.session.state != VoiceState::Listening {
            log::debug!("ignoring recognizer signal while {}: {signal:?}", self.session.state);
            return;
        }

        match signal {
            RecognizerSignal::ReadyForSpeech => self.emit(VoiceEvent::Started),
            RecognizerSignal::BeginningOfSpeech | RecognizerSignal::EndOfSpeech => {}
            RecognizerSignal::RmsChanged(db) => {
                let level = normalize_volume(db);
                self.session.last_volume = level;
                self.emit(VoiceEvent::Volume(level));
            }
            RecognizerSignal::PartialResults(alternatives) => {
                if let Some(text) = alternatives.into_iter().next() {
                    self.session.last_transcript = Some(text.clone());
                    self.emit(VoiceEvent::Transcript {
                        text,
                        is_final: false,
                    });
                }
            }
            RecognizerSignal::Results(alternatives) => {
                match alternatives.into_iter().next() {
                    Some(text) => {
                        self.session.last_transcript = Some(text.clone());
                        self.emit(VoiceEvent::Transcript {
                            text,
                            is_final: true,
                        });
                    }
                    None => self.fail(VoiceError::NoSpeechRecognized),
                }
                self.finish();
            }
            RecognizerSignal::Error(code) => {
                let code = RecognizerErrorCode::from_code(code);
                self.fail(VoiceError::Recognizer(code));
                self.finish();
            }
        }
    }

    /// Release the recognizer. The adapter is gone afterwards.
    pub fn release(mut self) {
        self.release_recognizer();
    }

    fn release_recognizer(&mut self) {
        if let Some(mut recognizer) = self.recognizer.take() {
            if self.session.state == VoiceState::Listening {
                recognizer.stop_listening();
            }
            recognizer.release();
            self.session.state = VoiceState::Idle;
        }
    }

    fn finish(&mut self) {
        self.session.state = VoiceState::Idle;
        self.emit(VoiceEvent::Stopped);
    }

    fn fail(&mut self, err: VoiceError) {
        log::warn!("voice input error: {err}");
        self.session.last_error = Some(err.to_string());
        self.emit(VoiceEvent::Failed(err));
    }

    fn emit(&self, event: VoiceEvent) {
        let _ = self.events.send(event);
    }
}

impl Drop for VoiceInputAdapter {
    fn drop(&mut self) {
        if self.recognizer.is_some() {
            log::warn!("voice adapter dropped without release; releasing recognizer");
            self.release_recognizer();
        }
    }
}
