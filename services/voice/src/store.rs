use anyhow::{Context, Result};
use sci_core::credentials::{CredentialStore, StoredCredentials};
use std::fs;
use std::path::PathBuf;

/// File-backed credential store: one JSON document under the platform config
/// directory, standing in for the browser's local storage.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The store at its usual platform location, creating parent directories
    /// as needed.
    pub fn from_platform_dirs() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "sci-voice")
            .context("no home directory for the credential store")?;
        let dir = dirs.config_dir();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config dir {}", dir.display()))?;
        Ok(Self::new(dir.join("credentials.json")))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Option<StoredCredentials> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                // A corrupt file reads as signed-out rather than crashing.
                tracing::warn!("ignoring unreadable credential file: {}", e);
                None
            }
        }
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        let raw = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}
