use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::models::errors::SessionError;

/// Holder of the bearer token shared by every authenticated request.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;

    fn set_token(&self, token: String) -> Result<(), SessionError>;

    fn clear(&self) -> Result<(), SessionError>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[derive(Default)]
pub struct MemorySession {
    token: RwLock<Option<String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token<S: Into<String>>(token: S) -> Self {
        Self { token: RwLock::new(Some(token.into())) }
    }
}

impl SessionStore for MemorySession {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_token(&self, token: String) -> Result<(), SessionError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct SessionFile {
    auth_token: String,
}

/// Token persisted in a YAML file so it survives restarts until cleared.
pub struct FileSession {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileSession {
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let token = FileSession::read_token(&path);
        Self { path, token: RwLock::new(token) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_token(path: &Path) -> Option<String> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("can't read session file {}: {}", path.display(), err);
                return None;
            }
        };

        match serde_yaml::from_str::<SessionFile>(&content) {
            Ok(file) if !file.auth_token.is_empty() => Some(file.auth_token),
            Ok(_) => None,
            Err(err) => {
                warn!("ignoring corrupt session file {}: {}", path.display(), err);
                None
            }
        }
    }
}

impl SessionStore for FileSession {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_token(&self, token: String) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(&SessionFile { auth_token: token.clone() })?;
        fs::write(&self.path, yaml)?;
        info!("session stored in {}", self.path.display());

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
