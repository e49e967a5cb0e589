use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::auth_controller::AuthController;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, require_admin, AuthenticatedUser};
use crate::models::user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RefreshTokenRequest, RegisterRequest,
    RoleChangeRequest, UserResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token));

    let protected = Router::new()
        .route("/change-password", post(change_password))
        .route("/logout-all", post(logout_all))
        .route("/:id", delete(delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // require_admin por dentro de auth_middleware: auth corre primero
    let admin = Router::new()
        .route("/assign-admin", post(assign_admin))
        .route("/revoke-admin", post(revoke_admin))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected).merge(admin)
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.login(request).await?;
    Ok(Json(response))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.refresh_token(&request.refresh_token).await?;
    Ok(Json(response))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.change_password(&user, request).await?;
    Ok(Json(response))
}

async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.logout_all(&user).await?;
    Ok(Json(response))
}

async fn assign_admin(
    State(state): State<AppState>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.assign_admin(request.user_id).await?;
    Ok(Json(response))
}

async fn revoke_admin(
    State(state): State<AppState>,
    Json(request): Json<RoleChangeRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    let response = controller.revoke_admin(request.user_id).await?;
    Ok(Json(response))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = AuthController::new(state.pool.clone(), state.jwt_config());
    controller.delete_account(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
