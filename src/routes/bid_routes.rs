use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::bid_controller::BidController;
use crate::dto::ApiResponse;
use crate::middleware::auth::{auth_middleware, AuthenticatedUser};
use crate::models::bid::{
    AuctionDetailsResponse, BidResponse, CreateBidRequest, MyBidsFilters, MyBidsResponse,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_bid_router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/auctions/:id/details", get(auction_details));

    let protected = Router::new()
        .route("/auctions/:id/bids", post(place_bid))
        .route("/my-bids", get(my_bids))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

async fn place_bid(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(auction_id): Path<Uuid>,
    Json(request): Json<CreateBidRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BidResponse>>), AppError> {
    let controller = BidController::new(state.pool.clone());
    let response = controller.place_bid(&user, auction_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn auction_details(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AuctionDetailsResponse>>, AppError> {
    let controller = BidController::new(state.pool.clone());
    let response = controller.auction_details(auction_id).await?;
    Ok(Json(response))
}

async fn my_bids(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(filters): Query<MyBidsFilters>,
) -> Result<Json<ApiResponse<MyBidsResponse>>, AppError> {
    let controller = BidController::new(state.pool.clone());
    let response = controller.my_bids(&user, filters).await?;
    Ok(Json(response))
}
