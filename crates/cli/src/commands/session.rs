//! Saved sign-in session.
//!
//! `lpg login` writes the access token to a small JSON file so later
//! commands can reuse it; `lpg logout` removes the file. The default
//! location is `~/.k4j_lpg/session.json`. The file holds a bearer token, so
//! on Unix it is only readable by its owner (mode `0600`).
//!
//! The offline product snapshot lives next to it as `products.json`.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use lpg_core::User;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SESSION_DIR: &str = ".k4j_lpg";
const SESSION_FILE: &str = "session.json";
const PRODUCT_CACHE_FILE: &str = "products.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot locate home directory; set LPG_SESSION_FILE")]
    NoHome,

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// What is persisted between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub access_token: String,
    pub user: User,
}

/// Location of the session file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Use `path` if given, otherwise `$HOME/.k4j_lpg/session.json`.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, SessionError> {
        let path = match path {
            Some(path) => path,
            None => std::env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or(SessionError::NoHome)?
                .join(SESSION_DIR)
                .join(SESSION_FILE),
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the offline product snapshot is kept.
    pub fn product_cache_path(&self) -> PathBuf {
        self.path.with_file_name(PRODUCT_CACHE_FILE)
    }

    /// Read the saved session. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<SavedSession>, SessionError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, session: &SavedSession) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        write_private(&self.path, &serde_json::to_vec_pretty(session)?)?;
        Ok(())
    }

    /// Remove the saved session. Removing a missing file is a no-op.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `bytes` to `path`, readable and writable by the owner only.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten files left by older versions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)
}
