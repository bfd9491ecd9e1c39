//! The user's session: who is logged in and the bearer token for their requests.
//!
//! A [Session] is passed explicitly to every data-access call. Queries read
//! [Session::is_authenticated] at call time to decide whether to run at all,
//! and interested parties can watch for log in and log out with
//! [Session::watch].

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{Error, models::User};

/// The token and user returned by a successful log in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The bearer token sent with every authenticated request.
    pub token: String,
    /// The user the token belongs to.
    pub user: User,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"********")
            .field("user", &self.user)
            .finish()
    }
}

/// Keeps credentials in a JSON file so a session survives restarts.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store backed by the file at `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the credentials are stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored credentials.
    ///
    /// A missing file means nobody is logged in. A file that cannot be parsed is
    /// treated the same way, with a warning, so a corrupt file never locks the user out.
    ///
    /// # Errors
    /// Returns [Error::Io] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<Credentials>, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        match serde_json::from_str(&text) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(error) => {
                tracing::warn!(
                    "ignoring unreadable credentials file {}: {error}",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    /// Write `credentials` to the file, creating parent directories as needed.
    ///
    /// On Unix the file is only readable and writable by its owner.
    ///
    /// # Errors
    /// Returns [Error::Io] if the file cannot be written.
    pub fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let text = serde_json::to_string_pretty(credentials)
            .map_err(|error| Error::Io(error.to_string()))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        // `mode` only applies to new files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(text.as_bytes())?;

        Ok(())
    }

    /// Delete the stored credentials. Deleting credentials that do not exist is not an error.
    ///
    /// # Errors
    /// Returns [Error::Io] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// The current session. Cloning a `Session` gives another handle to the same session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    credentials: RwLock<Option<Credentials>>,
    authenticated: watch::Sender<bool>,
    store: Option<CredentialStore>,
}

impl Session {
    /// A session with nobody logged in and nothing persisted.
    pub fn anonymous() -> Self {
        Self::from_parts(None, None)
    }

    /// An in-memory session for `credentials` that is not persisted.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self::from_parts(Some(credentials), None)
    }

    /// Restore the session from `store`.
    ///
    /// # Errors
    /// Returns [Error::Io] if the stored credentials exist but cannot be read.
    pub fn restore(store: CredentialStore) -> Result<Self, Error> {
        let credentials = store.load()?;

        if let Some(credentials) = &credentials {
            tracing::debug!("restored session for {}", credentials.user.email);
        }

        Ok(Self::from_parts(credentials, Some(store)))
    }

    fn from_parts(credentials: Option<Credentials>, store: Option<CredentialStore>) -> Self {
        let (authenticated, _) = watch::channel(credentials.is_some());

        Self {
            inner: Arc::new(SessionInner {
                credentials: RwLock::new(credentials),
                authenticated,
                store,
            }),
        }
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        *self.inner.authenticated.borrow()
    }

    /// The bearer token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.read_credentials(|credentials| credentials.token.clone())
    }

    /// The logged in user, if any.
    pub fn user(&self) -> Option<User> {
        self.read_credentials(|credentials| credentials.user.clone())
    }

    /// Observe changes to whether the session is authenticated.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.inner.authenticated.subscribe()
    }

    /// Start a session with `credentials` and persist them if the session has a store.
    ///
    /// # Errors
    /// Returns [Error::Io] if the credentials cannot be persisted. The in-memory
    /// session is still updated.
    pub fn log_in(&self, credentials: Credentials) -> Result<(), Error> {
        let persisted = match &self.inner.store {
            Some(store) => store.save(&credentials),
            None => Ok(()),
        };

        tracing::info!("logged in as {}", credentials.user.email);
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credentials);
        self.inner.authenticated.send_replace(true);

        persisted
    }

    /// End the session and delete any persisted credentials.
    ///
    /// The in-memory session is always cleared, even if deleting the stored
    /// credentials fails.
    ///
    /// # Errors
    /// Returns [Error::Io] if the stored credentials cannot be deleted.
    pub fn clear(&self) -> Result<(), Error> {
        *self
            .inner
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.authenticated.send_replace(false);
        tracing::info!("session cleared");

        match &self.inner.store {
            Some(store) => store.clear(),
            None => Ok(()),
        }
    }

    fn read_credentials<T>(&self, read: impl FnOnce(&Credentials) -> T) -> Option<T> {
        self.inner
            .credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(read)
    }
}
