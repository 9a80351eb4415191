//! Settings persistence.
//!
//! Only settings live on disk; books are always fetched from the server.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use shelftrack_core::Settings;

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Missing file yields defaults; a malformed one is an error.
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        if !self.exists() {
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read settings {}", self.path.display()))?;
        let mut settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("parse settings {}", self.path.display()))?;
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        let raw = serde_json::to_string_pretty(&settings)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp settings in {}", dir.display()))?;
        tmp.write_all(raw.as_bytes())
            .with_context(|| format!("write settings {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("replace settings {}", self.path.display()))?;
        Ok(())
    }
}
