use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::auction_controller::AuctionController;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, require_admin, AuthenticatedUser};
use crate::models::auction::{
    AddCarsRequest, AuctionFilters, AuctionListResponse, AuctionResponse, CreateAuctionRequest,
    UpdateAuctionRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_auction_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_auctions))
        .route("/current", get(get_current_auction))
        .route("/:id", get(get_auction));

    // Todo el ciclo de vida de subastas es administrativo
    let admin = Router::new()
        .route("/", post(create_auction))
        .route("/:id", patch(update_auction))
        .route("/:id", delete(delete_auction))
        .route("/:id/close", post(close_auction))
        .route("/:id/cars", post(add_cars))
        .route("/:id/cars/:carId", delete(remove_car))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(admin)
}

async fn create_auction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuctionResponse>>), AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.create_auction(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_auctions(
    State(state): State<AppState>,
    Query(filters): Query<AuctionFilters>,
) -> Result<Json<ApiResponse<AuctionListResponse>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.list_auctions(filters).await?;
    Ok(Json(response))
}

async fn get_current_auction(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<AuctionResponse>>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.get_current_auction().await?;
    Ok(Json(response))
}

async fn get_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AuctionResponse>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.get_auction(id).await?;
    Ok(Json(response))
}

async fn update_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAuctionRequest>,
) -> Result<Json<ApiResponse<AuctionResponse>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.update_auction(id, request).await?;
    Ok(Json(response))
}

async fn close_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AuctionResponse>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.close_auction(id).await?;
    Ok(Json(response))
}

async fn delete_auction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    controller.delete_auction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_cars(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCarsRequest>,
) -> Result<Json<ApiResponse<AuctionResponse>>, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    let response = controller.add_cars(id, request).await?;
    Ok(Json(response))
}

async fn remove_car(
    State(state): State<AppState>,
    Path((id, car_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let controller = AuctionController::new(state.pool.clone());
    controller.remove_car(id, car_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
