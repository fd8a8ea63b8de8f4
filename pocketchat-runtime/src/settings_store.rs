use anyhow::Context;
use pocketchat_core::config::AppConfig;
use std::path::{Path, PathBuf};

/// JSON file holding [`AppConfig`]. The API token is never written here.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; a corrupt one is an error.
    pub fn load(&self) -> anyhow::Result<AppConfig> {
        if !self.path.exists() {
            log::info!("no settings at {}; using defaults", self.path.display());
            return Ok(AppConfig::default());
        }

        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read settings: {}", self.path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&bytes).context("decode settings JSON")?;
        Ok(cfg)
    }

    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode settings JSON")?;
        crate::files::write_replacing(&self.path, &json)
            .with_context(|| format!("save settings: {}", self.path.display()))
    }
}
