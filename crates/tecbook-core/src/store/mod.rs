//! Credential storage.
//!
//! [`CredentialStore`] is the only shared mutable state of a session. Reads
//! take a snapshot; writes are serialized and reach the durable
//! [`CredentialBackend`] before the write lock is released, so a refresh
//! write and a logout clear can never interleave.

mod memory;

pub use memory::MemoryBackend;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::Result;
use crate::session::{Credential, Identity, SessionRecord};
use crate::tokens::RefreshToken;

/// Durable persistence for a [`SessionRecord`].
///
/// Implementations only load, save and delete; all session semantics live
/// in [`CredentialStore`].
pub trait CredentialBackend: Send + Sync + fmt::Debug {
    /// Load the persisted session, if any.
    fn load(&self) -> Result<Option<SessionRecord>>;

    /// Persist `record`, replacing whatever was stored.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Delete the persisted session.
    fn clear(&self) -> Result<()>;
}

/// Shared handle to the current session's credential and identity.
///
/// Cheap to clone; all clones see the same state.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Box<dyn CredentialBackend>,
    current: RwLock<Option<SessionRecord>>,
}

impl CredentialStore {
    /// Open a store on `backend`, restoring any persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be read.
    pub fn open(backend: impl CredentialBackend + 'static) -> Result<Self> {
        let current = backend.load()?;
        debug!(restored = current.is_some(), "credential store opened");
        Ok(Self {
            inner: Arc::new(StoreInner {
                backend: Box::new(backend),
                current: RwLock::new(current),
            }),
        })
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: Box::new(MemoryBackend::default()),
                current: RwLock::new(None),
            }),
        }
    }

    /// Snapshot of the whole session.
    pub fn snapshot(&self) -> Option<SessionRecord> {
        self.read().clone()
    }

    /// Snapshot of the current credential.
    pub fn credential(&self) -> Option<Credential> {
        self.read().as_ref().map(|r| r.credential.clone())
    }

    /// Snapshot of the cached identity.
    pub fn identity(&self) -> Option<Identity> {
        self.read().as_ref().and_then(|r| r.identity.clone())
    }

    /// Returns true while a credential is stored.
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Replace the whole session.
    ///
    /// The record is persisted first; if that fails the previous state is
    /// kept and the error is returned.
    pub fn set(&self, record: SessionRecord) -> Result<()> {
        let mut current = self.write();
        self.inner.backend.save(&record)?;
        *current = Some(record);
        Ok(())
    }

    /// Replace the cached identity of the current session.
    ///
    /// Returns false if there is no session to attach it to.
    pub fn set_identity(&self, identity: Identity) -> Result<bool> {
        let mut current = self.write();
        let Some(record) = current.as_ref() else {
            return Ok(false);
        };
        let updated = SessionRecord::new(record.credential.clone(), Some(identity));
        self.inner.backend.save(&updated)?;
        *current = Some(updated);
        Ok(true)
    }

    /// Replace the credential, but only if the session still holds
    /// `expected` as its refresh token.
    ///
    /// Returns false (and changes nothing) when the session was cleared or
    /// replaced in the meantime. A persistence failure is logged and the
    /// in-memory credential is still updated, so the running session keeps
    /// working.
    pub fn replace_credential(&self, expected: &RefreshToken, credential: Credential) -> bool {
        let mut current = self.write();
        let Some(record) = current.as_ref() else {
            return false;
        };
        if record.credential.refresh_token.as_ref() != Some(expected) {
            return false;
        }

        let updated = SessionRecord::new(credential, record.identity.clone());
        if let Err(e) = self.inner.backend.save(&updated) {
            warn!(error = %e, "failed to persist refreshed credential");
        }
        *current = Some(updated);
        true
    }

    /// Remove the session, returning what was stored.
    ///
    /// The in-memory state is always cleared; a backend failure is logged.
    pub fn clear(&self) -> Option<SessionRecord> {
        let mut current = self.write();
        let previous = current.take();
        if let Err(e) = self.inner.backend.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
        previous
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<SessionRecord>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<SessionRecord>> {
        self.inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

// Custom Debug impl that hides sensitive data
impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("backend", &self.inner.backend)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
