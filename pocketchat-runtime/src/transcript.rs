use std::path::{Path, PathBuf};

use anyhow::Context;
use pocketchat_core::types::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptExport {
    pub exported_at_unix_ms: i64,
    pub messages: Vec<ChatMessage>,
}

/// Writes a conversation out as a JSON document.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export(&self, messages: &[ChatMessage], now_unix_ms: i64) -> anyhow::Result<()> {
        let doc = TranscriptExport {
            exported_at_unix_ms: now_unix_ms,
            messages: messages.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&doc).context("encode transcript JSON")?;
        crate::files::write_replacing(&self.path, &json)
            .with_context(|| format!("failed to export transcript: {}", self.path.display()))?;
        log::info!(
            "exported {} messages to {}",
            messages.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn load(&self) -> anyhow::Result<TranscriptExport> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read transcript: {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse transcript: {}", self.path.display()))
    }
}
