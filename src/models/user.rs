//! Modelo de User
//!
//! Este módulo contiene el struct User y los requests/responses del
//! flujo de autenticación y gestión de cuenta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_password, validate_person_name};

/// Rol del usuario dentro del marketplace
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// User - mapea exactamente a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Request de registro
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50), custom = "validate_person_name")]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom = "validate_password")]
    pub password: String,
}

/// Request de login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Request de refresco de tokens
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Request de cambio de contraseña
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(rename = "oldPassword")]
    #[validate(length(min = 1))]
    pub old_password: String,

    #[serde(rename = "newPassword")]
    #[validate(custom = "validate_password")]
    pub new_password: String,
}

/// Request de asignación/revocación de rol admin
#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Response de usuario para la API (sin password_hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Response de autenticación: usuario + par de tokens
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "Passw0rdX".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_name = RegisterRequest {
            name: "J4ne!".to_string(),
            email: "jane@example.com".to_string(),
            password: "Passw0rdX".to_string(),
        };
        assert!(bad_name.validate().is_err());

        let weak_password = RegisterRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "password".to_string(),
        };
        assert!(weak_password.validate().is_err());
    }
}
