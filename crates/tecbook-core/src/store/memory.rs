//! In-process credential backend.

use std::sync::{Mutex, PoisonError};

use crate::Result;
use crate::session::SessionRecord;

use super::CredentialBackend;

/// Keeps the session in memory only; nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    record: Mutex<Option<SessionRecord>>,
}

impl MemoryBackend {
    /// A backend pre-seeded with a session, as if it had been persisted.
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self) -> Result<Option<SessionRecord>> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}
