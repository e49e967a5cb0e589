//! Utilidades JWT
//!
//! Este módulo contiene funciones helper para la emisión y verificación
//! de tokens de acceso y de refresco.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::environment::EnvironmentConfig,
    utils::errors::AppError,
};

/// Tipo de token emitido
pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,  // user_id
    pub role: String, // "user" | "admin"
    pub tver: i32,    // token_version del usuario al emitir
    pub typ: String,  // "access" | "refresh"
    pub exp: usize,   // expiration timestamp
    pub iat: usize,   // issued at timestamp
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_expiration: u64,
    pub refresh_expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            access_expiration: config.jwt_expiration,
            refresh_expiration: config.jwt_refresh_expiration,
        }
    }
}

/// Par de tokens que se devuelve en login/register/refresh
#[derive(Debug, Serialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

fn generate(
    user_id: Uuid,
    role: &str,
    token_version: i32,
    token_type: &str,
    expiration_secs: u64,
    config: &JwtConfig,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(expiration_secs as i64);

    let claims = JwtClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        tver: token_version,
        typ: token_type.to_string(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Error generando token: {}", e)))
}

/// Generar el par access/refresh para un usuario
pub fn generate_token_pair(
    user_id: Uuid,
    role: &str,
    token_version: i32,
    config: &JwtConfig,
) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: generate(
            user_id,
            role,
            token_version,
            TOKEN_TYPE_ACCESS,
            config.access_expiration,
            config,
        )?,
        refresh_token: generate(
            user_id,
            role,
            token_version,
            TOKEN_TYPE_REFRESH,
            config.refresh_expiration,
            config,
        )?,
    })
}

/// Verificar y decodificar un JWT
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    let token_data = decode::<JwtClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Jwt(format!("Token inválido: {}", e)))?;

    Ok(token_data.claims)
}

/// Verificar un token exigiendo que sea de un tipo concreto
pub fn verify_token_of_type(
    token: &str,
    token_type: &str,
    config: &JwtConfig,
) -> Result<JwtClaims, AppError> {
    let claims = verify_token(token, config)?;
    if claims.typ != token_type {
        return Err(AppError::Jwt(format!(
            "Se esperaba un token de tipo '{}'",
            token_type
        )));
    }
    Ok(claims)
}

/// Extraer el token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Jwt(
            "Header Authorization debe comenzar con 'Bearer '".to_string(),
        ));
    }

    let token = &auth_header[7..];
    if token.is_empty() {
        return Err(AppError::Jwt("Token no puede estar vacío".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-for-unit-tests".to_string(),
            access_expiration: 900,
            refresh_expiration: 604800,
        }
    }

    #[test]
    fn test_token_pair_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let pair = generate_token_pair(user_id, "admin", 3, &config).unwrap();

        let access = verify_token_of_type(&pair.access_token, TOKEN_TYPE_ACCESS, &config).unwrap();
        assert_eq!(access.sub, user_id.to_string());
        assert_eq!(access.role, "admin");
        assert_eq!(access.tver, 3);

        let refresh =
            verify_token_of_type(&pair.refresh_token, TOKEN_TYPE_REFRESH, &config).unwrap();
        assert_eq!(refresh.typ, TOKEN_TYPE_REFRESH);
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let config = test_config();
        let pair = generate_token_pair(Uuid::new_v4(), "user", 0, &config).unwrap();

        let result = verify_token_of_type(&pair.access_token, TOKEN_TYPE_REFRESH, &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = test_config();
        let pair = generate_token_pair(Uuid::new_v4(), "user", 0, &config).unwrap();

        let mut other = test_config();
        other.secret = "another-secret".to_string();
        assert!(verify_token(&pair.access_token, &other).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_token_from_header("Basic abc").is_err());
        assert!(extract_token_from_header("Bearer ").is_err());
    }
}
