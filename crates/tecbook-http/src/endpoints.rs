//! Request and response bodies of the authentication endpoints.

use serde::{Deserialize, Serialize};

use tecbook_core::{AccessToken, Identity, RefreshToken, Role};

/// Request body for the login endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub correo_institucional: &'a str,
    pub password: &'a str,
}

/// Request body for the Google token exchange.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest<'a> {
    pub id_token: &'a str,
}

/// Response from the login and Google login endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "access")]
    pub token: AccessToken,
    #[serde(default)]
    pub refresh: Option<RefreshToken>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub requires_completion: bool,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Request body for the refresh endpoint.
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from the refresh endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access: AccessToken,
    #[serde(default)]
    pub refresh: Option<RefreshToken>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Request body for the logout endpoint.
#[derive(Serialize)]
pub struct LogoutRequest<'a> {
    pub refresh: &'a str,
}

/// A user as returned by the login and current-user endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: i64,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
    #[serde(alias = "correo_institucional", alias = "email")]
    pub correo_institucional: String,
    #[serde(default, alias = "role")]
    pub rol: Option<String>,
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Identity::new(
            user.id,
            user.correo_institucional,
            Role::parse(user.rol.as_deref()),
            user.nombre.as_deref(),
            user.apellidos.as_deref(),
        )
    }
}
