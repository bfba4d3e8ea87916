//! Session state: the credential and the identity cached alongside it.

mod credential;
mod identity;

pub use credential::Credential;
pub use identity::{Identity, Role};

use serde::{Deserialize, Serialize};

/// Everything the credential store persists for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub credential: Credential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl SessionRecord {
    pub fn new(credential: Credential, identity: Option<Identity>) -> Self {
        Self {
            credential,
            identity,
        }
    }
}
