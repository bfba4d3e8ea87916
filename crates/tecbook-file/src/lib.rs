//! tecbook-file - Filesystem-backed credential persistence.
//!
//! Provides a [`FileBackend`] for [`tecbook_core::CredentialStore`], so a
//! session outlives the process that created it.

mod store;

pub use store::FileBackend;
