use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::car_controller::CarController;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::car::{
    CarFilters, CarListResponse, CarPriceResponse, CarResponse, CreateCarRequest, UpdateCarRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_car_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_cars))
        .route("/:id", get(get_car))
        .route("/:id/price", get(get_car_price));

    let protected = Router::new()
        .route("/", post(create_car))
        .route("/:id", put(update_car))
        .route("/:id", delete(delete_car))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn create_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CarResponse>>), AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    let response = controller.create_car(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CarResponse>>, AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    let response = controller.get_car(id).await?;
    Ok(Json(response))
}

async fn list_cars(
    State(state): State<AppState>,
    Query(filters): Query<CarFilters>,
) -> Result<Json<ApiResponse<CarListResponse>>, AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    let response = controller.list_cars(filters).await?;
    Ok(Json(response))
}

async fn update_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCarRequest>,
) -> Result<Json<ApiResponse<CarResponse>>, AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    let response = controller.update_car(&user, id, request).await?;
    Ok(Json(response))
}

async fn delete_car(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    controller.delete_car(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_car_price(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CarPriceResponse>>, AppError> {
    let controller = CarController::new(state.pool.clone(), state.pricing.clone());
    let response = controller.get_car_price(id).await?;
    Ok(Json(response))
}
