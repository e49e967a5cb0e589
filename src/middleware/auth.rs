//! Middleware de autenticación JWT
//!
//! Este módulo maneja la autenticación JWT, extracción de tokens
//! y verificación de usuarios autenticados.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    models::user::ROLE_ADMIN,
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_token_from_header, verify_token_of_type, TOKEN_TYPE_ACCESS},
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let token = extract_token_from_header(auth_header)?;

    // Decodificar y validar el access token
    let claims = verify_token_of_type(token, TOKEN_TYPE_ACCESS, &state.jwt_config())?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    // Verificar que el usuario sigue existiendo y que el token no fue
    // revocado por un logout-all (token_version).
    let row: Option<(i32, String)> =
        sqlx::query_as("SELECT token_version, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await
            .map_err(AppError::Database)?;

    let (token_version, role) =
        row.ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".to_string()))?;

    if claims.tver != token_version {
        return Err(AppError::Unauthorized("Token revocado".to_string()));
    }

    request.extensions_mut().insert(AuthenticatedUser { user_id, role });

    Ok(next.run(request).await)
}

/// Guard de rol admin. Se aplica por dentro de `auth_middleware`, que ya
/// dejó el usuario autenticado en las extensiones de la request.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Esta operación requiere rol de administrador".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
