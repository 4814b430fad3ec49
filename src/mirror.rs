//! Local mirror of the shared document.
//!
//! One JSON file holds the last-known full document. It is read once at
//! startup so the board is populated before any network activity, and
//! rewritten wholesale on every accepted mutation. The mirror is best
//! effort; the remote store stays authoritative.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::Value;

use crate::models::Document;

/// File name of the mirror inside the data directory.
pub const MIRROR_FILENAME: &str = "document.json";

#[derive(Clone, Debug)]
pub struct LocalMirror {
    data_dir: PathBuf,
}

impl LocalMirror {
    /// Creates a mirror rooted at a custom data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path of the mirror file.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(MIRROR_FILENAME)
    }

    /// Checks if a mirrored document exists on disk.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Loads the mirrored document.
    ///
    /// Returns `Ok(None)` if the file doesn't exist. The content goes
    /// through the same sanitize pass as a remote blob, so a stale mirror
    /// written by an older client still loads.
    pub fn load(&self) -> Result<Option<Document>, MirrorError> {
        let path = self.path();

        match fs::read_to_string(&path) {
            Ok(text) => {
                let value: Value = serde_json::from_str(&text)
                    .map_err(|e| MirrorError::Json(path, e))?;
                Ok(Some(Document::sanitize(&value)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MirrorError::Io(path, e)),
        }
    }

    /// Persists the whole document, replacing the previous value outright.
    ///
    /// Creates the data directory if it doesn't exist.
    pub fn save(&self, document: &Document) -> Result<(), MirrorError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| MirrorError::Io(self.data_dir.clone(), e))?;

        let path = self.path();
        let text = serde_json::to_string_pretty(document)
            .map_err(|e| MirrorError::Json(path.clone(), e))?;

        fs::write(&path, text).map_err(|e| MirrorError::Io(path, e))?;

        Ok(())
    }
}

/// Errors that can occur reading or writing the mirror file.
#[derive(Debug)]
pub enum MirrorError {
    /// I/O error reading or writing the file.
    Io(PathBuf, io::Error),
    /// The file or document could not be (de)serialized.
    Json(PathBuf, serde_json::Error),
}

impl std::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MirrorError::Io(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            MirrorError::Json(path, e) => {
                write!(f, "Bad mirror content at {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MirrorError::Io(_, e) => Some(e),
            MirrorError::Json(_, e) => Some(e),
        }
    }
}
