//! Filesystem persistence for the session record.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tecbook_core::Result;
use tecbook_core::error::{Error, StorageError};
use tecbook_core::session::SessionRecord;
use tecbook_core::store::CredentialBackend;

/// On-disk format version.
const FORMAT_VERSION: u32 = 1;

fn map_io(path: &Path, err: std::io::Error) -> Error {
    Error::Storage(StorageError::Io {
        location: path.display().to_string(),
        message: err.to_string(),
    })
}

/// What is written to the session file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    version: u32,
    saved_at: DateTime<Utc>,
    session: SessionRecord,
}

/// Keeps the session in a JSON file so it survives process restarts.
///
/// Writes go to a temporary file that is renamed over the target, under an
/// exclusive lock on a sibling `.lock` file, so concurrent processes never
/// observe a half-written session. On Unix the file is readable by its owner
/// only.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend persisting to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    /// Run `f` while holding the exclusive lock file.
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_io(parent, e))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| map_io(&lock_path, e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(&lock_path, e))?;

        let result = f();

        lock_file.unlock().map_err(|e| map_io(&lock_path, e))?;

        result
    }

    fn write_restricted(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(|e| map_io(path, e))?;
        file.write_all(contents).map_err(|e| map_io(path, e))?;
        file.sync_data().map_err(|e| map_io(path, e))?;

        // mode() only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| map_io(path, e))?;
        }

        Ok(())
    }
}

impl CredentialBackend for FileBackend {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Option<SessionRecord>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no persisted session");
                return Ok(None);
            }
            Err(e) => return Err(map_io(&self.path, e)),
        };

        let stored: StoredSession = serde_json::from_str(&json).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                location: self.path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        if stored.version != FORMAT_VERSION {
            return Err(Error::Storage(StorageError::Corrupt {
                location: self.path.display().to_string(),
                message: format!("unsupported session format version {}", stored.version),
            }));
        }

        debug!(saved_at = %stored.saved_at, "restored persisted session");
        Ok(Some(stored.session))
    }

    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let stored = StoredSession {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            session: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                location: self.path.display().to_string(),
                message: e.to_string(),
            })
        })?;

        self.with_lock(|| {
            let temp = self.temp_path();
            self.write_restricted(&temp, &json)?;
            fs::rename(&temp, &self.path).map_err(|e| map_io(&self.path, e))
        })?;

        debug!("session persisted");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        self.with_lock(|| match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&self.path, e)),
        })?;

        debug!("persisted session removed");
        Ok(())
    }
}
