use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

/// Name of the entry holding the session token in the durable document
pub const TOKEN_ENTRY: &str = "authToken";

/// File name of the durable key/value document inside the storage directory
pub const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt storage document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage directory could not be resolved: {0}")]
    NoDirectory(String),
}

/// Process-wide slot holding at most one session token.
///
/// Reads never fail. Writes are last-write-wins and `clear` is idempotent.
/// An empty token is never held: `set("")` behaves exactly like `clear`.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// The session dependency handed to every Gateway and to the controller
pub type SharedStore = Arc<dyn CredentialStore>;

impl std::fmt::Debug for dyn CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("has_token", &self.get().is_some())
            .finish()
    }
}

/// In-process store; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self {
            token: RwLock::new(Some(token).filter(|t| !t.is_empty())),
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Option<String> {
        // A poisoned lock still holds the last written value
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        if token.is_empty() {
            return self.clear();
        }
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
        Ok(())
    }
}

/// Durable store backed by a small JSON key/value document.
///
/// Only the `authToken` entry is owned by this store; other entries written by
/// other tools are kept intact. The token is cached in memory and written through.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileStore {
    /// Open (or lazily create) the document in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let path = dir.join(STORAGE_FILE);
        let entries = read_document(&path)?;
        let token = entries.get(TOKEN_ENTRY).cloned().filter(|t| !t.is_empty());
        debug!(path = %path.display(), has_token = token.is_some(), "Opened credential store");

        Ok(Self {
            path,
            token: RwLock::new(token),
        })
    }

    /// Open the store in `dir`, or in the per-user default directory
    pub fn open_default(dir: Option<&Path>) -> Result<Self, StoreError> {
        match dir {
            Some(dir) => Self::open(dir),
            None => Self::open(default_storage_dir()?),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    fn write_entry(&self, value: Option<&str>) -> Result<(), StoreError> {
        let mut entries = read_document(&self.path)?;
        match value {
            Some(token) => {
                entries.insert(TOKEN_ENTRY.to_string(), token.to_string());
            }
            None => {
                if entries.remove(TOKEN_ENTRY).is_none() && !self.path.exists() {
                    return Ok(());
                }
            }
        }

        let content = serde_json::to_string_pretty(&entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for FileStore {
    fn get(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set(&self, token: &str) -> Result<(), StoreError> {
        if token.is_empty() {
            return self.clear();
        }
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        self.write_entry(Some(token))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.token.write().unwrap_or_else(|p| p.into_inner());
        // Drop the in-memory copy first so the session ends even if the disk write fails
        *guard = None;
        self.write_entry(None)
    }
}

fn read_document(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// `$HOME/.config/dimfaso`
pub fn default_storage_dir() -> Result<PathBuf, StoreError> {
    let home = std::env::var("HOME")
        .map_err(|_| StoreError::NoDirectory("HOME environment variable not set".to_string()))?;
    Ok(PathBuf::from(home).join(".config").join("dimfaso"))
}
