//! Revocation list: the deny-list of credentials invalidated before expiry.
//!
//! Both implementations guard append and membership scan with one mutex
//! for the whole list, so a reader never sees a partially written entry and
//! concurrent writers never interleave.

use std::collections::HashSet;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AuthError, Result};

/// Deny-list keyed by raw credential string.
pub trait RevocationList: Send + Sync {
    /// Add a credential to the list. Revoking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedClaims`] if the credential cannot be
    /// stored as a single entry, or [`AuthError::Storage`] on I/O failure.
    fn revoke(&self, credential: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether the credential has been revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] on I/O failure.
    fn is_revoked(&self, credential: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Append-only file with one credential per line.
///
/// A missing file is an empty list; it is created on first revocation.
#[derive(Debug, Clone)]
pub struct FileRevocationList {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl FileRevocationList {
    /// Use the list stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn contains_line(path: &Path, credential: &str) -> Result<bool> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents.lines().any(|line| line == credential)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AuthError::Storage(e.to_string())),
    }
}

fn check_storable(credential: &str) -> Result<()> {
    if credential.is_empty() || credential.contains(['\n', '\r']) {
        return Err(AuthError::MalformedClaims(
            "credential cannot be stored as a single line".to_string(),
        ));
    }
    Ok(())
}

impl RevocationList for FileRevocationList {
    fn revoke(&self, credential: &str) -> impl Future<Output = Result<()>> + Send {
        let path = Arc::clone(&self.path);
        let lock = Arc::clone(&self.lock);
        let credential = credential.to_string();

        async move {
            check_storable(&credential)?;
            let _guard = lock.lock().await;

            if contains_line(&path, &credential).await? {
                return Ok(());
            }

            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path.as_path())
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;

            // One write per entry keeps every line whole.
            let line = format!("{credential}\n");
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
            file.flush()
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
            Ok(())
        }
    }

    fn is_revoked(&self, credential: &str) -> impl Future<Output = Result<bool>> + Send {
        let path = Arc::clone(&self.path);
        let lock = Arc::clone(&self.lock);
        let credential = credential.to_string();

        async move {
            let _guard = lock.lock().await;
            contains_line(&path, &credential).await
        }
    }
}

/// Process-wide in-memory revocation set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRevocationList {
    revoked: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryRevocationList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of revoked credentials.
    pub async fn len(&self) -> usize {
        self.revoked.lock().await.len()
    }

    /// Whether nothing has been revoked.
    pub async fn is_empty(&self) -> bool {
        self.revoked.lock().await.is_empty()
    }
}

impl RevocationList for InMemoryRevocationList {
    fn revoke(&self, credential: &str) -> impl Future<Output = Result<()>> + Send {
        let revoked = Arc::clone(&self.revoked);
        let credential = credential.to_string();

        async move {
            check_storable(&credential)?;
            revoked.lock().await.insert(credential);
            Ok(())
        }
    }

    fn is_revoked(&self, credential: &str) -> impl Future<Output = Result<bool>> + Send {
        let revoked = Arc::clone(&self.revoked);
        let credential = credential.to_string();

        async move { Ok(revoked.lock().await.contains(&credential)) }
    }
}
