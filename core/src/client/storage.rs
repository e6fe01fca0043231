//! The single persisted client key: the last target that passed the probe

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

pub trait TargetStorage: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, target: &str) -> std::io::Result<()>;
    fn clear(&self) -> std::io::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedTarget {
    api_url: String,
}

/// JSON file holding `{"api_url": ...}`
#[derive(Debug, Clone)]
pub struct FileTargetStorage {
    path: PathBuf,
}

impl FileTargetStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TargetStorage for FileTargetStorage {
    fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<SavedTarget>(&content) {
            Ok(saved) => Some(saved.api_url),
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved target {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, target: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let saved = SavedTarget {
            api_url: target.to_string(),
        };
        let content = serde_json::to_string_pretty(&saved)?;
        fs::write(&self.path, content)
    }

    fn clear(&self) -> std::io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-process storage for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTargetStorage {
    value: Mutex<Option<String>>,
}

impl MemoryTargetStorage {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }
}

impl TargetStorage for MemoryTargetStorage {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn save(&self, target: &str) -> std::io::Result<()> {
        if let Ok(mut value) = self.value.lock() {
            *value = Some(target.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        if let Ok(mut value) = self.value.lock() {
            *value = None;
        }
        Ok(())
    }
}
