use anyhow::Context;
use image::DynamicImage;
use pocketchat_engine::traits::{
    Camera, Permission, PermissionRequester, PermissionStatus, PickOutcome, SpeechRecognizer,
    SpeechService,
};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Camera stand-in that "captures" an image file queued by the caller.
#[derive(Debug, Default)]
pub struct StillCamera {
    next: Mutex<Option<PathBuf>>,
}

impl StillCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, path: impl Into<PathBuf>) {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.into());
    }
}

#[async_trait::async_trait]
impl Camera for StillCamera {
    fn is_available(&self) -> bool {
        true
    }

    async fn capture(&self) -> anyhow::Result<PickOutcome<DynamicImage>> {
        let next = self.next.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(path) = next else {
            return Ok(PickOutcome::Empty);
        };

        let img = tokio::task::spawn_blocking(move || {
            image::open(&path).with_context(|| format!("load image {}", path.display()))
        })
        .await
        .context("image loader task failed")??;
        Ok(PickOutcome::Picked(img))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

#[async_trait::async_trait]
impl Camera for UnavailableCamera {
    fn is_available(&self) -> bool {
        false
    }

    async fn capture(&self) -> anyhow::Result<PickOutcome<DynamicImage>> {
        anyhow::bail!("no capture activity on this device")
    }
}

/// No speech engine; the voice adapter reports recognition as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSpeech;

impl SpeechService for UnavailableSpeech {
    fn is_recognition_available(&self) -> bool {
        false
    }

    fn create_recognizer(&self) -> anyhow::Result<Box<dyn SpeechRecognizer>> {
        anyhow::bail!("speech recognition is not available")
    }
}

/// Fixed permission answers. Requests are logged and answered immediately.
#[derive(Debug, Clone)]
pub struct StaticPermissions {
    granted: Vec<Permission>,
    answer: PermissionStatus,
}

impl StaticPermissions {
    pub fn all_granted() -> Self {
        Self {
            granted: vec![Permission::Camera, Permission::RecordAudio],
            answer: PermissionStatus::Granted,
        }
    }

    pub fn none_granted(answer: PermissionStatus) -> Self {
        Self {
            granted: Vec::new(),
            answer,
        }
    }
}

#[async_trait::async_trait]
impl PermissionRequester for StaticPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    async fn request(&self, permission: Permission) -> PermissionStatus {
        log::info!(
            "permission request {} answered {:?}",
            permission.as_str(),
            self.answer
        );
        self.answer
    }
}
