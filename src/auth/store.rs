//! Credential stores
//!
//! The store holds at most one credential. It is written by login, by the
//! refresh leader and by terminal clears; every other path only reads.

use super::types::Credential;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Storage for the session credential
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, if any
    async fn get(&self) -> Option<Credential>;

    /// Replace the current credential
    async fn set(&self, credential: Credential) -> Result<()>;

    /// Drop the current credential
    async fn clear(&self) -> Result<()>;
}

/// Process-local credential store
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    credential: Arc<RwLock<Option<Credential>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credential: Arc::new(RwLock::new(Some(Credential::new(token)))),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        *self.credential.write().await = Some(credential);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.credential.write().await = None;
        Ok(())
    }
}

/// Credential store persisted to a JSON file
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written credential behind.
#[derive(Debug)]
pub struct FileCredentialStore {
    /// Path to the credential file
    path: PathBuf,
    /// Cached copy of the file contents
    credential: RwLock<Option<Credential>>,
}

impl FileCredentialStore {
    /// Open a store, loading the existing credential if the file is present
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let credential = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                Error::credential_store(format!("Failed to read credential file: {e}"))
            })?;
            if contents.trim().is_empty() {
                None
            } else {
                Some(serde_json::from_str(&contents).map_err(|e| {
                    Error::credential_store(format!("Failed to parse credential file: {e}"))
                })?)
            }
        } else {
            None
        };

        Ok(Self {
            path,
            credential: RwLock::new(credential),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, credential: &Credential) -> Result<()> {
        let contents = serde_json::to_string_pretty(credential).map_err(|e| {
            Error::credential_store(format!("Failed to serialize credential: {e}"))
        })?;

        let temp_path = self.path.with_extension("tmp");
        write_private(&temp_path, contents.as_bytes())
            .await
            .map_err(|e| Error::credential_store(format!("Failed to write credential file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                Error::credential_store(format!("Failed to rename credential file: {e}"))
            })?;

        Ok(())
    }
}

/// Write a file readable only by its owner (on unix)
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        let mut cached = self.credential.write().await;
        self.persist(&credential).await?;
        *cached = Some(credential);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut cached = self.credential.write().await;
        *cached = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::credential_store(format!(
                "Failed to remove credential file: {e}"
            ))),
        }
    }
}
