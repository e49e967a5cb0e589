use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, PageParams, PaginationInfo};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::auction::AuctionStatus;
use crate::models::bid::{
    AuctionDetailsResponse, AuctionSummary, BidResponse, BidWithBidder, BidderInfo, CarWithBids,
    CreateBidRequest, MyBidsFilters, MyBidsResponse,
};
use crate::repositories::auction_repository::AuctionRepository;
use crate::repositories::bid_repository::{BidRepository, BidWithUserRow};
use crate::repositories::car_repository::CarRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::bid_ranking::{highest_amount, sort_bids_for_display, winning_index};
use crate::utils::errors::{not_found_error, AppError};

pub struct BidController {
    repository: BidRepository,
    auction_repository: AuctionRepository,
    car_repository: CarRepository,
    user_repository: UserRepository,
}

impl BidController {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            repository: BidRepository::new(pool.clone()),
            auction_repository: AuctionRepository::new(pool.clone()),
            car_repository: CarRepository::new(pool.clone()),
            user_repository: UserRepository::new(pool),
        }
    }

    /// Colocar o superar la propia puja sobre un coche de la subasta
    pub async fn place_bid(
        &self,
        user: &AuthenticatedUser,
        auction_id: Uuid,
        request: CreateBidRequest,
    ) -> Result<ApiResponse<BidResponse>, AppError> {
        request.validate()?;

        let auction = self
            .auction_repository
            .find_by_id(auction_id)
            .await?
            .ok_or_else(|| not_found_error("Auction", &auction_id.to_string()))?;

        let bid = self
            .repository
            .place_bid(&auction, request.car_id, user.user_id, request.amount)
            .await?;

        Ok(ApiResponse::success_with_message(
            bid.into(),
            "Puja registrada exitosamente".to_string(),
        ))
    }

    /// Detalle de la subasta: cada coche con sus pujas ordenadas,
    /// el importe más alto y el ganador (solo si ya terminó).
    pub async fn auction_details(
        &self,
        auction_id: Uuid,
    ) -> Result<ApiResponse<AuctionDetailsResponse>, AppError> {
        let now = Utc::now();

        let auction = self
            .auction_repository
            .find_by_id(auction_id)
            .await?
            .ok_or_else(|| not_found_error("Auction", &auction_id.to_string()))?;

        let creator = self
            .user_repository
            .find_by_id(auction.created_by)
            .await?
            .ok_or_else(|| AppError::NotFound("Auction creator not found".to_string()))?;

        let status = auction.status_at(now);
        let car_ids = self.auction_repository.car_ids(auction_id).await?;
        let rows = self.repository.bids_for_auction(auction_id).await?;

        // Las filas vienen ordenadas por coche, importe desc, colocación asc
        let mut by_car: HashMap<Uuid, Vec<BidWithUserRow>> = HashMap::new();
        for row in rows {
            by_car.entry(row.car_id).or_default().push(row);
        }

        let mut cars_with_bids = Vec::with_capacity(car_ids.len());
        for car_id in &car_ids {
            let car = self
                .car_repository
                .find_by_id(*car_id)
                .await?
                .ok_or_else(|| not_found_error("Car", &car_id.to_string()))?;

            let mut car_bids = by_car.remove(car_id).unwrap_or_default();
            sort_bids_for_display(&mut car_bids);
            let highest_bid = highest_amount(&car_bids);

            // El ganador no se publica hasta que la subasta termina
            let winner = if status == AuctionStatus::Ended {
                winning_index(&car_bids).map(|i| bidder_info(&car_bids[i]))
            } else {
                None
            };

            let total_bids = car_bids.len();
            let bids = car_bids
                .into_iter()
                .map(|row| BidWithBidder {
                    id: row.id,
                    user: BidderInfo {
                        id: row.user_id,
                        name: row.user_name,
                        email: row.user_email,
                    },
                    amount: row.amount,
                    is_winning: row.is_winning,
                    placed_at: row.placed_at,
                })
                .collect();

            cars_with_bids.push(CarWithBids {
                car: car.into(),
                bids,
                highest_bid,
                winner,
                total_bids,
            });
        }

        Ok(ApiResponse::success(AuctionDetailsResponse {
            auction: AuctionSummary {
                id: auction.id,
                name: auction.name,
                start_date: auction.start_date,
                end_date: auction.end_date,
                status,
                created_by: BidderInfo {
                    id: creator.id,
                    name: creator.name,
                    email: creator.email,
                },
                total_cars: car_ids.len(),
            },
            cars_with_bids,
        }))
    }

    pub async fn my_bids(
        &self,
        user: &AuthenticatedUser,
        filters: MyBidsFilters,
    ) -> Result<ApiResponse<MyBidsResponse>, AppError> {
        let params = PageParams::from_options(filters.page, filters.limit);
        let (bids, total) = self.repository.my_bids(user.user_id, &filters, params).await?;

        Ok(ApiResponse::success(MyBidsResponse {
            bids: bids.into_iter().map(BidResponse::from).collect(),
            pagination: PaginationInfo::new(params.page, params.limit, total),
        }))
    }
}

fn bidder_info(row: &BidWithUserRow) -> BidderInfo {
    BidderInfo {
        id: row.user_id,
        name: row.user_name.clone(),
        email: row.user_email.clone(),
    }
}
