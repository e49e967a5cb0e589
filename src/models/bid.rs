//! Modelo de Bid
//!
//! Este módulo contiene el struct Bid, los requests de puja y las
//! estructuras del detalle de subasta (coches con sus pujas).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::car::CarResponse;

/// Bid - mapea exactamente a la tabla bids. Una fila por
/// (subasta, coche, pujador): re-pujar reemplaza la fila.
#[derive(Debug, Clone, FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub is_winning: bool,
    pub placed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para crear o actualizar una puja
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBidRequest {
    #[serde(rename = "carId")]
    pub car_id: Uuid,

    // Dólares enteros, sin centavos
    #[validate(range(min = 1, max = 10000000))]
    pub amount: i64,
}

/// Filtros para el listado de pujas propias
#[derive(Debug, Default, Deserialize)]
pub struct MyBidsFilters {
    #[serde(rename = "auctionId")]
    pub auction_id: Option<Uuid>,
    #[serde(rename = "carId")]
    pub car_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Resumen público de un usuario (pujador o ganador)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BidderInfo {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Response de puja para la API
#[derive(Debug, Clone, Serialize)]
pub struct BidResponse {
    pub id: Uuid,
    #[serde(rename = "auctionId")]
    pub auction_id: Uuid,
    #[serde(rename = "carId")]
    pub car_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub amount: i64,
    #[serde(rename = "isWinning")]
    pub is_winning: bool,
    #[serde(rename = "placedAt")]
    pub placed_at: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.id,
            auction_id: bid.auction_id,
            car_id: bid.car_id,
            user_id: bid.user_id,
            amount: bid.amount,
            is_winning: bid.is_winning,
            placed_at: bid.placed_at,
            created_at: bid.created_at,
            updated_at: bid.updated_at,
        }
    }
}

/// Página del listado de pujas propias
#[derive(Debug, Serialize)]
pub struct MyBidsResponse {
    pub bids: Vec<BidResponse>,
    pub pagination: crate::dto::PaginationInfo,
}

/// Puja con los datos del pujador, tal y como la muestra el detalle
#[derive(Debug, Clone, Serialize)]
pub struct BidWithBidder {
    pub id: Uuid,
    pub user: BidderInfo,
    pub amount: i64,
    #[serde(rename = "isWinning")]
    pub is_winning: bool,
    #[serde(rename = "placedAt")]
    pub placed_at: DateTime<Utc>,
}

/// Un coche de la subasta con sus pujas ordenadas y derivados
#[derive(Debug, Serialize)]
pub struct CarWithBids {
    pub car: CarResponse,
    pub bids: Vec<BidWithBidder>,
    #[serde(rename = "highestBid")]
    pub highest_bid: Option<i64>,
    pub winner: Option<BidderInfo>,
    #[serde(rename = "totalBids")]
    pub total_bids: usize,
}

/// Response del endpoint GET /bids/auctions/:id/details
#[derive(Debug, Serialize)]
pub struct AuctionDetailsResponse {
    pub auction: AuctionSummary,
    #[serde(rename = "carsWithBids")]
    pub cars_with_bids: Vec<CarWithBids>,
}

/// Cabecera de subasta dentro del detalle
#[derive(Debug, Serialize)]
pub struct AuctionSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
    pub status: crate::models::auction::AuctionStatus,
    #[serde(rename = "createdBy")]
    pub created_by: BidderInfo,
    #[serde(rename = "totalCars")]
    pub total_cars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_bid_amount_bounds() {
        let ok = CreateBidRequest {
            car_id: Uuid::new_v4(),
            amount: 1000,
        };
        assert!(ok.validate().is_ok());

        let zero = CreateBidRequest {
            car_id: Uuid::new_v4(),
            amount: 0,
        };
        assert!(zero.validate().is_err());

        let too_high = CreateBidRequest {
            car_id: Uuid::new_v4(),
            amount: 10_000_001,
        };
        assert!(too_high.validate().is_err());
    }
}
