use crate::bitmap;
use crate::traits::{
    AttachmentChoice, Camera, ChoicePrompt, ContentResolver, MediaPicker, Permission,
    PermissionRequester, PermissionStatus, PickOutcome,
};
use image::DynamicImage;
use pocketchat_core::media::{
    CAMERA_IMAGE_NAME, DOCUMENT_MIME_TYPES, IMAGE_MIME_FILTER, MAX_ATTACHMENT_BYTES,
    UNKNOWN_FILE_NAME,
};
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

pub const READ_CHUNK_BYTES: usize = 8 * 1024;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("No image selected")]
    NoImageSelected,

    #[error("No image captured")]
    NoImageCaptured,

    #[error("Unable to read file")]
    Unreadable,

    #[error("File too large. Maximum size is 1MB")]
    TooLarge,

    #[error("Unable to open document picker: {0}")]
    DocumentPickerUnavailable(String),

    #[error("Unable to open image picker: {0}")]
    ImagePickerUnavailable(String),

    #[error("Unable to open camera: {0}")]
    CameraLaunch(String),

    #[error("Camera not available on this device")]
    CameraUnavailable,

    #[error("Camera permission is required to take photos")]
    CameraPermissionDenied,

    #[error("Error reading file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Error processing image: {0}")]
    Image(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub content_base64: String,
}

#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub name: String,
    // Already downscaled; this is what was encoded.
    pub image: DynamicImage,
    pub content_base64: String,
}

#[derive(Debug)]
pub enum AttachmentEvent {
    FileAttached(FileAttachment),
    ImageAttached(ImageAttachment),
    Failed(AttachmentError),
}

/// Read `reader` to the end, failing as soon as more than `limit` bytes have arrived.
///
/// Reads happen in fixed chunks. Once the running total passes `limit` no further
/// read is issued; the oversize payload is rejected, never truncated.
pub fn read_bounded<R: Read + ?Sized>(
    reader: &mut R,
    limit: usize,
) -> Result<Vec<u8>, AttachmentError> {
    let mut out = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(AttachmentError::Read(e)),
        };
        if out.len() + n > limit {
            return Err(AttachmentError::TooLarge);
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

/// Downscale, JPEG-encode and base64 an image under the attachment ceiling.
pub fn encode_image(
    name: String,
    image: DynamicImage,
) -> Result<ImageAttachment, AttachmentError> {
    let image = bitmap::downscale(image);
    let jpeg =
        bitmap::encode_jpeg(&image).map_err(|e| AttachmentError::Image(format!("{e:#}")))?;
    if jpeg.len() > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge);
    }
    Ok(ImageAttachment {
        name,
        image,
        content_base64: bitmap::to_base64(&jpeg),
    })
}

fn open(
    resolver: &dyn ContentResolver,
    uri: &Url,
) -> Result<Box<dyn Read + Send>, AttachmentError> {
    match resolver.open_stream(uri) {
        Ok(Some(stream)) => Ok(stream),
        Ok(None) => Err(AttachmentError::Unreadable),
        Err(e) => Err(AttachmentError::Read(e)),
    }
}

fn join_error(e: tokio::task::JoinError) -> AttachmentError {
    AttachmentError::Read(std::io::Error::other(e.to_string()))
}

/// Turns picker and camera results into attachments.
///
/// Every outcome except a cancelled picker is reported on the event channel.
/// Nothing is returned to the caller and nothing panics.
pub struct AttachmentAdapter {
    picker: Arc<dyn MediaPicker>,
    camera: Arc<dyn Camera>,
    resolver: Arc<dyn ContentResolver>,
    permissions: Arc<dyn PermissionRequester>,
    events: mpsc::UnboundedSender<AttachmentEvent>,
}

impl AttachmentAdapter {
    pub fn new(
        picker: Arc<dyn MediaPicker>,
        camera: Arc<dyn Camera>,
        resolver: Arc<dyn ContentResolver>,
        permissions: Arc<dyn PermissionRequester>,
    ) -> (Self, mpsc::UnboundedReceiver<AttachmentEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                picker,
                camera,
                resolver,
                permissions,
                events,
            },
            rx,
        )
    }

    /// Offer document, gallery and camera, then run the chosen flow.
    pub async fn show_picker(&self, prompt: &dyn ChoicePrompt) {
        match prompt.choose_attachment().await {
            AttachmentChoice::Document => self.pick_document().await,
            AttachmentChoice::Image => self.pick_image().await,
            AttachmentChoice::Camera => self.capture_image().await,
            AttachmentChoice::Cancel => log::debug!("attachment picker dismissed"),
        }
    }

    pub async fn pick_document(&self) {
        let uri = match self.picker.pick_document(DOCUMENT_MIME_TYPES).await {
            Ok(PickOutcome::Picked(uri)) => uri,
            Ok(PickOutcome::Cancelled) => return,
            Ok(PickOutcome::Empty) => return self.fail(AttachmentError::NoFileSelected),
            Err(e) => {
                return self.fail(AttachmentError::DocumentPickerUnavailable(format!("{e:#}")));
            }
        };

        match self.ingest_document(&uri).await {
            Ok(file) => {
                log::info!(
                    "attached document name={} mime={} encoded_len={}",
                    file.name,
                    file.mime_type,
                    file.content_base64.len()
                );
                self.emit(AttachmentEvent::FileAttached(file));
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn pick_image(&self) {
        let uri = match self.picker.pick_image(IMAGE_MIME_FILTER).await {
            Ok(PickOutcome::Picked(uri)) => uri,
            Ok(PickOutcome::Cancelled) => return,
            Ok(PickOutcome::Empty) => return self.fail(AttachmentError::NoImageSelected),
            Err(e) => return self.fail(AttachmentError::ImagePickerUnavailable(format!("{e:#}"))),
        };

        match self.ingest_image(&uri).await {
            Ok(img) => self.attached_image(img),
            Err(e) => self.fail(e),
        }
    }

    pub async fn capture_image(&self) {
        if !self.permissions.is_granted(Permission::Camera) {
            match self.permissions.request(Permission::Camera).await {
                PermissionStatus::Granted => {}
                PermissionStatus::Denied => {
                    return self.fail(AttachmentError::CameraPermissionDenied);
                }
            }
        }

        if !self.camera.is_available() {
            return self.fail(AttachmentError::CameraUnavailable);
        }

        let thumbnail = match self.camera.capture().await {
            Ok(PickOutcome::Picked(img)) => img,
            Ok(PickOutcome::Cancelled) => return,
            Ok(PickOutcome::Empty) => return self.fail(AttachmentError::NoImageCaptured),
            Err(e) => return self.fail(AttachmentError::CameraLaunch(format!("{e:#}"))),
        };

        let result = tokio::task::spawn_blocking(move || {
            encode_image(CAMERA_IMAGE_NAME.to_string(), thumbnail)
        })
        .await
        .map_err(join_error)
        .and_then(|r| r);

        match result {
            Ok(img) => self.attached_image(img),
            Err(e) => self.fail(e),
        }
    }

    /// Name shown for `uri`: provider metadata, then the file name of a `file` URI.
    pub fn display_name(&self, uri: &Url) -> String {
        self.resolver
            .display_name(uri)
            .filter(|n| !n.trim().is_empty())
            .or_else(|| file_uri_name(uri))
            .unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string())
    }

    pub async fn ingest_document(&self, uri: &Url) -> Result<FileAttachment, AttachmentError> {
        let name = self.display_name(uri);
        let mime_type = self
            .resolver
            .mime_type(uri)
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

        let resolver = self.resolver.clone();
        let uri = uri.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            let mut stream = open(resolver.as_ref(), &uri)?;
            read_bounded(&mut stream, MAX_ATTACHMENT_BYTES)
        })
        .await
        .map_err(join_error)??;

        Ok(FileAttachment {
            name,
            mime_type,
            content_base64: bitmap::to_base64(&bytes),
        })
    }

    pub async fn ingest_image(&self, uri: &Url) -> Result<ImageAttachment, AttachmentError> {
        let name = self.display_name(uri);
        let resolver = self.resolver.clone();
        let uri = uri.clone();

        tokio::task::spawn_blocking(move || {
            let mut stream = open(resolver.as_ref(), &uri)?;
            let mut bytes = Vec::new();
            stream
                .read_to_end(&mut bytes)
                .map_err(AttachmentError::Read)?;

            let decoded = image::load_from_memory(&bytes)
                .map_err(|e| AttachmentError::Image(e.to_string()))?;
            encode_image(name, decoded)
        })
        .await
        .map_err(join_error)?
    }

    fn attached_image(&self, img: ImageAttachment) {
        log::info!(
            "attached image name={} size={}x{} encoded_len={}",
            img.name,
            img.image.width(),
            img.image.height(),
            img.content_base64.len()
        );
        self.emit(AttachmentEvent::ImageAttached(img));
    }

    fn fail(&self, err: AttachmentError) {
        log::warn!("attachment failed: {err}");
        self.emit(AttachmentEvent::Failed(err));
    }

    fn emit(&self, event: AttachmentEvent) {
        // The receiver going away just means nobody is listening anymore.
        let _ = self.events.send(event);
    }
}

fn file_uri_name(uri: &Url) -> Option<String> {
    if uri.scheme() != "file" {
        return None;
    }
    let path = uri.to_file_path().ok()?;
    let name = path.file_name()?.to_string_lossy().into_owned();
    (!name.is_empty()).then_some(name)
}
