//! Durable storage for the credential bundle.
//!
//! Stores only move bytes: no expiry logic and no policy. The persisted
//! document keeps the three keys the bundle is made of (`access_token`,
//! `refresh_token`, `user`). A document missing any of them, or whose `user`
//! does not decode, loads as absent rather than as an error.

use crate::session::types::{CredentialBundle, Profile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("session store encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Persistence seam for the session. Implementations must make `save` appear
/// atomic to subsequent `load` calls.
pub trait SessionStore: Send + Sync {
    /// Persist all three bundle fields.
    ///
    /// # Errors
    /// Returns an error if the bundle cannot be encoded or written.
    fn save(&self, bundle: &CredentialBundle) -> Result<(), StoreError>;

    /// Read the bundle back; `None` when never saved, cleared, or incomplete.
    ///
    /// # Errors
    /// Returns an error only when the underlying storage cannot be read.
    fn load(&self) -> Result<Option<CredentialBundle>, StoreError>;

    /// Remove all three fields. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be modified.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    fn save(&self, bundle: &CredentialBundle) -> Result<(), StoreError> {
        (**self).save(bundle)
    }

    fn load(&self) -> Result<Option<CredentialBundle>, StoreError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// On-disk / in-memory shape of a stored session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<serde_json::Value>,
}

impl Document {
    fn from_bundle(bundle: &CredentialBundle) -> Result<Self, StoreError> {
        Ok(Self {
            access_token: Some(bundle.access_token().expose_secret().to_string()),
            refresh_token: Some(bundle.refresh_token().expose_secret().to_string()),
            user: Some(serde_json::to_value(bundle.profile())?),
        })
    }

    fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }

    fn into_bundle(self) -> Option<CredentialBundle> {
        if self.is_empty() {
            return None;
        }

        let (Some(access), Some(refresh), Some(user)) =
            (self.access_token, self.refresh_token, self.user)
        else {
            warn!("stored session is incomplete; treating as signed out");
            return None;
        };

        if access.is_empty() || refresh.is_empty() {
            warn!("stored session has an empty token; treating as signed out");
            return None;
        }

        match serde_json::from_value::<Profile>(user) {
            Ok(profile) => Some(CredentialBundle::new(
                SecretString::from(access),
                SecretString::from(refresh),
                profile,
            )),
            Err(err) => {
                warn!("stored user profile is unreadable ({err}); treating as signed out");
                None
            }
        }
    }
}

/// Process-local store, used for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Document>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw document, including partial or malformed
    /// ones (e.g. tokens without a `user`).
    ///
    /// # Errors
    /// Returns an error if `document` is not a JSON object of string tokens.
    pub fn from_json(document: serde_json::Value) -> Result<Self, StoreError> {
        Ok(Self {
            document: Mutex::new(serde_json::from_value(document)?),
        })
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, bundle: &CredentialBundle) -> Result<(), StoreError> {
        let document = Document::from_bundle(bundle)?;
        *self.document.lock().map_err(|_| StoreError::Poisoned)? = document;
        Ok(())
    }

    fn load(&self) -> Result<Option<CredentialBundle>, StoreError> {
        let document = self
            .document
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone();
        Ok(document.into_bundle())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.document.lock().map_err(|_| StoreError::Poisoned)? = Document::default();
        Ok(())
    }
}

/// JSON document on disk that survives restarts.
///
/// Writes go to a uniquely named, owner-only temporary file beside the target
/// that is then renamed over it, so a reader sees either the previous document
/// or the new one.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&serde_json::to_vec_pretty(document)?)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn save(&self, bundle: &CredentialBundle) -> Result<(), StoreError> {
        self.write_document(&Document::from_bundle(bundle)?)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<CredentialBundle>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Document>(&bytes) {
            Ok(document) => Ok(document.into_bundle()),
            Err(err) => {
                warn!(path = %self.path.display(), "session file is corrupt ({err}); treating as signed out");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
