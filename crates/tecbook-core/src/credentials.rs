//! Login credentials type.

use std::fmt;

/// Login credentials for TecBook password authentication.
///
/// This type holds the institutional email and password required to obtain
/// a session from the API.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use tecbook_core::LoginCredentials;
///
/// let creds = LoginCredentials::new("alumno@tecsup.edu.pe", "secret");
/// assert_eq!(creds.email(), "alumno@tecsup.edu.pe");
/// ```
#[derive(Clone)]
pub struct LoginCredentials {
    email: String,
    password: String,
}

impl LoginCredentials {
    /// Create new credentials.
    ///
    /// # Arguments
    ///
    /// * `email` - The institutional email address
    /// * `password` - The account password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when constructing authentication requests.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
