use anyhow::Context;
use pocketchat_core::media::{is_document_mime_type, mime_type_for_extension};
use pocketchat_engine::traits::{ContentResolver, MediaPicker, PickOutcome};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use url::Url;

fn extension_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    mime_type_for_extension(ext)
}

/// Resolves `file` URIs against the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsContentResolver;

impl ContentResolver for FsContentResolver {
    fn display_name(&self, uri: &Url) -> Option<String> {
        let path = uri.to_file_path().ok()?;
        // Only files that exist have metadata.
        if !path.is_file() {
            return None;
        }
        Some(path.file_name()?.to_string_lossy().into_owned())
    }

    fn mime_type(&self, uri: &Url) -> Option<String> {
        let path = uri.to_file_path().ok()?;
        extension_mime(&path).map(str::to_string)
    }

    fn open_stream(&self, uri: &Url) -> std::io::Result<Option<Box<dyn Read + Send>>> {
        let Ok(path) = uri.to_file_path() else {
            return Ok(None);
        };
        match std::fs::File::open(&path) {
            Ok(f) => Ok(Some(Box::new(f))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Picker fed from the command line: the caller queues a path, the next pick returns it.
///
/// Nothing queued behaves like a picker closed with no selection. A path whose type
/// the picker would not have offered is treated the same way.
#[derive(Debug, Default)]
pub struct PathPicker {
    next: Mutex<Option<PathBuf>>,
}

impl PathPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, path: impl Into<PathBuf>) {
        *self.next.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.into());
    }

    fn take(&self) -> Option<PathBuf> {
        self.next.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn pick<F>(&self, accepts: F) -> anyhow::Result<PickOutcome<Url>>
    where
        F: Fn(&str) -> bool,
    {
        let Some(path) = self.take() else {
            return Ok(PickOutcome::Empty);
        };

        let offered = extension_mime(&path).is_some_and(&accepts);
        if !offered {
            log::warn!("picker would not offer {}; treating as no selection", path.display());
            return Ok(PickOutcome::Empty);
        }

        let abs = std::path::absolute(&path)
            .with_context(|| format!("resolve path {}", path.display()))?;
        let uri = Url::from_file_path(&abs)
            .map_err(|_| anyhow::anyhow!("not a valid file path: {}", abs.display()))?;
        Ok(PickOutcome::Picked(uri))
    }
}

#[async_trait::async_trait]
impl MediaPicker for PathPicker {
    async fn pick_document(&self, mime_types: &[&str]) -> anyhow::Result<PickOutcome<Url>> {
        self.pick(|mime| mime_types.iter().any(|m| *m == mime) && is_document_mime_type(mime))
    }

    async fn pick_image(&self, mime_filter: &str) -> anyhow::Result<PickOutcome<Url>> {
        let prefix = mime_filter.trim_end_matches('*');
        self.pick(|mime| mime.starts_with(prefix))
    }
}
