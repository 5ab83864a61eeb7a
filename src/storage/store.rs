//! State Store
//!
//! Durable, atomic persistence for the environment state. Writes go to a
//! temporary file in the state directory and are renamed over the state
//! file, so a reader never observes a half-written state.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use super::state::{State, STATE_VERSION};

/// Name of the state file inside the state directory
pub const STATE_FILE: &str = "bbl-state.json";

/// Persists the environment state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Persist `state`. A completed call is atomic.
    async fn set(&self, state: &State) -> Result<()>;
}

/// File-backed state store rooted at a state directory
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Load the current state. A missing state file yields the default state.
    pub async fn get(&self) -> Result<State> {
        let path = self.path();

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file found");
                return Ok(State::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn write_atomically(dir: &Path, path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn set(&self, state: &State) -> Result<()> {
        let path = self.path();

        if state.is_empty() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed empty state file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }

        let mut versioned = state.clone();
        versioned.version = STATE_VERSION;
        let contents = serde_json::to_vec_pretty(&versioned)?;

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &contents))
            .await??;

        debug!(path = %path.display(), "State saved");
        Ok(())
    }
}
