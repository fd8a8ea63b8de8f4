use async_trait::async_trait;
use image::DynamicImage;
use pocketchat_providers::chat::CompletionRequest;
use pocketchat_providers::runtime::HttpResponse;
use std::io::Read;
use url::Url;

/// Request/response primitive for the chat endpoint.
///
/// `Err` is reserved for transport faults (connect, timeout, DNS, body read);
/// any HTTP status, including errors, comes back as `Ok`.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn post(&self, request: &CompletionRequest) -> anyhow::Result<HttpResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Camera => "camera",
            Permission::RecordAudio => "record_audio",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[async_trait]
pub trait PermissionRequester: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Ask the user; resolves once with their answer.
    async fn request(&self, permission: Permission) -> PermissionStatus;
}

pub trait ContentResolver: Send + Sync {
    fn display_name(&self, uri: &Url) -> Option<String>;
    fn mime_type(&self, uri: &Url) -> Option<String>;

    /// `Ok(None)` means the provider had nothing to open.
    fn open_stream(&self, uri: &Url) -> std::io::Result<Option<Box<dyn Read + Send>>>;
}

/// What a picker or capture activity handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome<T> {
    /// The user backed out; not an error.
    Cancelled,
    /// The activity returned OK but without data.
    Empty,
    Picked(T),
}

#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// `Err` means the picker could not be launched at all.
    async fn pick_document(&self, mime_types: &[&str]) -> anyhow::Result<PickOutcome<Url>>;
    async fn pick_image(&self, mime_filter: &str) -> anyhow::Result<PickOutcome<Url>>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Whether a capture activity can be resolved on this device.
    fn is_available(&self) -> bool;

    /// Returns the capture thumbnail; the full-resolution file is never read.
    async fn capture(&self) -> anyhow::Result<PickOutcome<DynamicImage>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentChoice {
    Document,
    Image,
    Camera,
    Cancel,
}

#[async_trait]
pub trait ChoicePrompt: Send + Sync {
    async fn choose_attachment(&self) -> AttachmentChoice;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    pub language_model: String,
    // `None` uses the device locale.
    pub locale: Option<String>,
    pub prompt: String,
    pub max_results: u32,
    pub partial_results: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language_model: "free_form".into(),
            locale: None,
            prompt: "Speak now...".into(),
            max_results: 5,
            partial_results: true,
        }
    }
}

/// Handle to the platform speech engine. Owned by exactly one voice adapter.
pub trait SpeechRecognizer: Send {
    fn start_listening(&mut self, options: &RecognitionOptions) -> anyhow::Result<()>;
    fn stop_listening(&mut self);
    fn release(&mut self);
}

pub trait SpeechService: Send + Sync {
    fn is_recognition_available(&self) -> bool;
    fn create_recognizer(&self) -> anyhow::Result<Box<dyn SpeechRecognizer>>;
}
