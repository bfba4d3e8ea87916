//! Cached user identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a TecBook user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Estudiante,
    Profesor,
    Admin,
}

impl Role {
    /// Parse a role name as sent by the API.
    ///
    /// Matching is case-insensitive; unknown or missing roles are treated as
    /// [`Role::Estudiante`], the least privileged role.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("profesor") => Role::Profesor,
            Some("admin") => Role::Admin,
            _ => Role::Estudiante,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Estudiante => "estudiante",
            Role::Profesor => "profesor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal user identity cached next to the credential.
///
/// Display-only: the server is authoritative for every authorization
/// decision, and this value may be stale between refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

impl Identity {
    /// Build an identity from the API's user fields.
    pub fn new(
        user_id: i64,
        email: impl Into<String>,
        role: Role,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Self {
        let display_name = format!(
            "{} {}",
            first_name.unwrap_or_default(),
            last_name.unwrap_or_default()
        )
        .trim()
        .to_string();

        Self {
            user_id,
            email: email.into(),
            role,
            display_name,
        }
    }
}
