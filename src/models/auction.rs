//! Modelo de Auction
//!
//! Este módulo contiene el struct Auction, la derivación de estado del
//! ciclo de vida y los requests/responses del recurso.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Estado derivado de una subasta. Nunca se persiste: se calcula a partir
/// de las fechas almacenadas, el instante actual y el marcador de cierre
/// manual (`closed_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Upcoming,
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Upcoming => "upcoming",
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
        }
    }
}

impl std::str::FromStr for AuctionStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "upcoming" => Ok(AuctionStatus::Upcoming),
            "active" => Ok(AuctionStatus::Active),
            "ended" => Ok(AuctionStatus::Ended),
            _ => Err(()),
        }
    }
}

/// Auction - mapea exactamente a la tabla auctions
#[derive(Debug, Clone, FromRow)]
pub struct Auction {
    pub id: Uuid,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// Derivar el estado en el instante `now`. Función pura: mismas
    /// entradas, mismo estado. Un cierre manual fuerza `ended` aunque
    /// `now` siga dentro del rango de fechas.
    pub fn status_at(&self, now: DateTime<Utc>) -> AuctionStatus {
        derive_status(self.start_date, self.end_date, self.closed_at, now)
    }

    pub fn status(&self) -> AuctionStatus {
        self.status_at(Utc::now())
    }
}

/// Derivación de estado del ciclo de vida:
/// `ended` si hay cierre manual o `now > end`;
/// `upcoming` si `now < start`; `active` en el resto del rango (inclusive).
pub fn derive_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> AuctionStatus {
    if closed_at.is_some() || now > end {
        return AuctionStatus::Ended;
    }
    if now < start {
        return AuctionStatus::Upcoming;
    }
    AuctionStatus::Active
}

/// Request para crear una subasta
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAuctionRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,

    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,

    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
}

/// Request para actualizar una subasta (solo mientras está upcoming)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAuctionRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,

    #[serde(rename = "startDate")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(rename = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Request para añadir coches a una subasta
#[derive(Debug, Deserialize)]
pub struct AddCarsRequest {
    #[serde(rename = "carIds")]
    pub car_ids: Vec<Uuid>,
}

/// Filtros para el listado de subastas
#[derive(Debug, Default, Deserialize)]
pub struct AuctionFilters {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Response de subasta para la API
#[derive(Debug, Clone, Serialize)]
pub struct AuctionResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
    #[serde(rename = "createdBy")]
    pub created_by: Uuid,
    pub status: AuctionStatus,
    pub cars: Vec<Uuid>,
    #[serde(rename = "totalCars")]
    pub total_cars: usize,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl AuctionResponse {
    pub fn from_auction(auction: Auction, car_ids: Vec<Uuid>, now: DateTime<Utc>) -> Self {
        let status = auction.status_at(now);
        Self {
            id: auction.id,
            name: auction.name,
            start_date: auction.start_date,
            end_date: auction.end_date,
            created_by: auction.created_by,
            status,
            total_cars: car_ids.len(),
            cars: car_ids,
            closed_at: auction.closed_at,
            created_at: auction.created_at,
            updated_at: auction.updated_at,
        }
    }
}

/// Página del listado de subastas
#[derive(Debug, Serialize)]
pub struct AuctionListResponse {
    pub auctions: Vec<AuctionResponse>,
    pub pagination: crate::dto::PaginationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auction(start_offset_h: i64, end_offset_h: i64, closed: bool) -> Auction {
        let now = Utc::now();
        Auction {
            id: Uuid::new_v4(),
            name: "Test Auction".to_string(),
            start_date: now + Duration::hours(start_offset_h),
            end_date: now + Duration::hours(end_offset_h),
            created_by: Uuid::new_v4(),
            closed_at: if closed { Some(now) } else { None },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_upcoming() {
        assert_eq!(auction(1, 2, false).status(), AuctionStatus::Upcoming);
    }

    #[test]
    fn test_status_active() {
        assert_eq!(auction(-1, 1, false).status(), AuctionStatus::Active);
    }

    #[test]
    fn test_status_ended_by_time() {
        assert_eq!(auction(-3, -1, false).status(), AuctionStatus::Ended);
    }

    #[test]
    fn test_manual_close_overrides_time_range() {
        // cerrada manualmente aunque el rango de fechas siga vigente
        assert_eq!(auction(-1, 1, true).status(), AuctionStatus::Ended);
        // incluso si todavía no había empezado
        assert_eq!(auction(1, 2, true).status(), AuctionStatus::Ended);
    }

    #[test]
    fn test_status_is_pure_function_of_inputs() {
        let start = Utc::now();
        let end = start + Duration::hours(2);
        let probe = start + Duration::minutes(30);
        let first = derive_status(start, end, None, probe);
        let second = derive_status(start, end, None, probe);
        assert_eq!(first, second);
    }

    #[test]
    fn test_status_boundaries_inclusive() {
        let start = Utc::now();
        let end = start + Duration::hours(1);
        // activa exactamente en start y exactamente en end
        assert_eq!(derive_status(start, end, None, start), AuctionStatus::Active);
        assert_eq!(derive_status(start, end, None, end), AuctionStatus::Active);
        // terminada un instante después de end
        assert_eq!(
            derive_status(start, end, None, end + Duration::seconds(1)),
            AuctionStatus::Ended
        );
    }

    #[test]
    fn test_close_makes_status_ended_for_all_subsequent_instants() {
        let start = Utc::now();
        let end = start + Duration::hours(4);
        let closed_at = Some(start + Duration::hours(1));
        for offset in [0, 1, 2, 3, 4, 5] {
            let probe = start + Duration::hours(offset + 1);
            assert_eq!(
                derive_status(start, end, closed_at, probe),
                AuctionStatus::Ended
            );
        }
    }
}
