use bcrypt::{hash, verify, DEFAULT_COST};
use uuid::Uuid;
use validator::Validate;

use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UserResponse, ROLE_ADMIN,
    ROLE_USER,
};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;
use crate::utils::jwt::{
    generate_token_pair, verify_token_of_type, JwtConfig, TokenPair, TOKEN_TYPE_REFRESH,
};

pub struct AuthController {
    repository: UserRepository,
    jwt_config: JwtConfig,
}

impl AuthController {
    pub fn new(pool: sqlx::PgPool, jwt_config: JwtConfig) -> Self {
        Self {
            repository: UserRepository::new(pool),
            jwt_config,
        }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<ApiResponse<AuthResponse>, AppError> {
        request.validate()?;

        let password_hash = hash(&request.password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hasheando password: {}", e)))?;

        let user = self
            .repository
            .create(request.name, request.email, password_hash, ROLE_USER)
            .await?;

        let tokens =
            generate_token_pair(user.id, &user.role, user.token_version, &self.jwt_config)?;

        Ok(ApiResponse::success_with_message(
            auth_response(user.into(), tokens),
            "Usuario registrado exitosamente".to_string(),
        ))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<ApiResponse<AuthResponse>, AppError> {
        request.validate()?;

        let user = self
            .repository
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciales inválidas".to_string()))?;

        let password_ok = verify(&request.password, &user.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verificando password: {}", e)))?;

        if !password_ok {
            return Err(AppError::Unauthorized("Credenciales inválidas".to_string()));
        }

        let tokens =
            generate_token_pair(user.id, &user.role, user.token_version, &self.jwt_config)?;

        Ok(ApiResponse::success(auth_response(user.into(), tokens)))
    }

    /// Canjear un refresh token válido por un par nuevo. El cliente usa
    /// esto en su reintento único tras un 401.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ApiResponse<AuthResponse>, AppError> {
        let claims = verify_token_of_type(refresh_token, TOKEN_TYPE_REFRESH, &self.jwt_config)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Jwt("Token inválido".to_string()))?;

        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Usuario no encontrado".to_string()))?;

        // Un logout-all posterior a la emisión invalida el refresh token
        if claims.tver != user.token_version {
            return Err(AppError::Unauthorized("Token revocado".to_string()));
        }

        let tokens =
            generate_token_pair(user.id, &user.role, user.token_version, &self.jwt_config)?;

        Ok(ApiResponse::success(auth_response(user.into(), tokens)))
    }

    pub async fn change_password(
        &self,
        user: &AuthenticatedUser,
        request: ChangePasswordRequest,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        request.validate()?;

        let current = self
            .repository
            .find_by_id(user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password_ok = verify(&request.old_password, &current.password_hash)
            .map_err(|e| AppError::Hash(format!("Error verificando password: {}", e)))?;

        if !password_ok {
            return Err(AppError::Unauthorized(
                "La contraseña actual no es correcta".to_string(),
            ));
        }

        let password_hash = hash(&request.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Hash(format!("Error hasheando password: {}", e)))?;

        self.repository
            .update_password(current.id, password_hash)
            .await?;

        Ok(ApiResponse::success_with_message(
            current.into(),
            "Contraseña actualizada exitosamente".to_string(),
        ))
    }

    /// Invalida todos los tokens emitidos (access y refresh) del usuario
    pub async fn logout_all(
        &self,
        user: &AuthenticatedUser,
    ) -> Result<ApiResponse<serde_json::Value>, AppError> {
        self.repository.bump_token_version(user.user_id).await?;

        Ok(ApiResponse::success_with_message(
            serde_json::json!({}),
            "Sesiones cerradas en todos los dispositivos".to_string(),
        ))
    }

    pub async fn assign_admin(
        &self,
        target_user_id: Uuid,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        let user = self.repository.set_role(target_user_id, ROLE_ADMIN).await?;
        Ok(ApiResponse::success_with_message(
            user.into(),
            "Rol de administrador asignado".to_string(),
        ))
    }

    pub async fn revoke_admin(
        &self,
        target_user_id: Uuid,
    ) -> Result<ApiResponse<UserResponse>, AppError> {
        let user = self.repository.set_role(target_user_id, ROLE_USER).await?;
        Ok(ApiResponse::success_with_message(
            user.into(),
            "Rol de administrador revocado".to_string(),
        ))
    }

    /// Borrar cuenta: el propio usuario o un administrador
    pub async fn delete_account(
        &self,
        requester: &AuthenticatedUser,
        target_user_id: Uuid,
    ) -> Result<(), AppError> {
        if requester.user_id != target_user_id && !requester.is_admin() {
            return Err(AppError::Forbidden(
                "No tienes permiso para borrar esta cuenta".to_string(),
            ));
        }

        self.repository.delete(target_user_id).await
    }
}

fn auth_response(user: UserResponse, tokens: TokenPair) -> AuthResponse {
    AuthResponse {
        user,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }
}
