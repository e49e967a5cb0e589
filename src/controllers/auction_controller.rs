use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{ApiResponse, PageParams, PaginationInfo};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::auction::{
    AddCarsRequest, Auction, AuctionFilters, AuctionListResponse, AuctionResponse, AuctionStatus,
    CreateAuctionRequest, UpdateAuctionRequest,
};
use crate::repositories::auction_repository::AuctionRepository;
use crate::repositories::car_repository::CarRepository;
use crate::utils::errors::{not_found_error, validation_error, AppError};

pub struct AuctionController {
    repository: AuctionRepository,
    car_repository: CarRepository,
}

impl AuctionController {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            repository: AuctionRepository::new(pool.clone()),
            car_repository: CarRepository::new(pool),
        }
    }

    pub async fn create_auction(
        &self,
        user: &AuthenticatedUser,
        request: CreateAuctionRequest,
    ) -> Result<ApiResponse<AuctionResponse>, AppError> {
        request.validate()?;

        let now = Utc::now();
        validate_dates(request.start_date, request.end_date, now)?;

        let auction = self
            .repository
            .create(request.name, request.start_date, request.end_date, user.user_id)
            .await?;

        Ok(ApiResponse::success_with_message(
            AuctionResponse::from_auction(auction, Vec::new(), now),
            "Subasta creada exitosamente".to_string(),
        ))
    }

    pub async fn get_auction(
        &self,
        auction_id: Uuid,
    ) -> Result<ApiResponse<AuctionResponse>, AppError> {
        let auction = self.find_auction(auction_id).await?;
        let car_ids = self.repository.car_ids(auction_id).await?;

        Ok(ApiResponse::success(AuctionResponse::from_auction(
            auction,
            car_ids,
            Utc::now(),
        )))
    }

    pub async fn list_auctions(
        &self,
        filters: AuctionFilters,
    ) -> Result<ApiResponse<AuctionListResponse>, AppError> {
        if let Some(status) = filters.status.as_deref() {
            if status != "all" && status.parse::<AuctionStatus>().is_err() {
                return Err(AppError::BadRequest(format!(
                    "Estado de subasta desconocido: {}",
                    status
                )));
            }
        }

        let now = Utc::now();
        let params = PageParams::from_options(filters.page, filters.limit);
        let (auctions, total) = self.repository.list(&filters, params, now).await?;

        let mut items = Vec::with_capacity(auctions.len());
        for auction in auctions {
            let car_ids = self.repository.car_ids(auction.id).await?;
            items.push(AuctionResponse::from_auction(auction, car_ids, now));
        }

        Ok(ApiResponse::success(AuctionListResponse {
            auctions: items,
            pagination: PaginationInfo::new(params.page, params.limit, total),
        }))
    }

    /// La subasta activa en este momento, si la hay
    pub async fn get_current_auction(
        &self,
    ) -> Result<ApiResponse<Option<AuctionResponse>>, AppError> {
        let now = Utc::now();
        let auction = self.repository.find_current(now).await?;

        let response = match auction {
            Some(auction) => {
                let car_ids = self.repository.car_ids(auction.id).await?;
                Some(AuctionResponse::from_auction(auction, car_ids, now))
            }
            None => None,
        };

        Ok(ApiResponse::success(response))
    }

    /// Las fechas solo se pueden tocar mientras la subasta está upcoming
    pub async fn update_auction(
        &self,
        auction_id: Uuid,
        request: UpdateAuctionRequest,
    ) -> Result<ApiResponse<AuctionResponse>, AppError> {
        request.validate()?;

        let now = Utc::now();
        let auction = self.find_auction(auction_id).await?;

        if auction.status_at(now) != AuctionStatus::Upcoming {
            return Err(AppError::Conflict(
                "Solo se puede editar una subasta que aún no ha empezado".to_string(),
            ));
        }

        let name = request.name.unwrap_or(auction.name);
        let start_date = request.start_date.unwrap_or(auction.start_date);
        let end_date = request.end_date.unwrap_or(auction.end_date);

        validate_dates(start_date, end_date, now)?;

        let updated = self
            .repository
            .update(auction_id, name, start_date, end_date)
            .await?;
        let car_ids = self.repository.car_ids(auction_id).await?;

        Ok(ApiResponse::success_with_message(
            AuctionResponse::from_auction(updated, car_ids, now),
            "Subasta actualizada exitosamente".to_string(),
        ))
    }

    /// Cierre manual anticipado. Idempotencia negativa: cerrar una
    /// subasta ya terminada es un conflicto, no un no-op.
    pub async fn close_auction(
        &self,
        auction_id: Uuid,
    ) -> Result<ApiResponse<AuctionResponse>, AppError> {
        let now = Utc::now();
        let auction = self.find_auction(auction_id).await?;

        if auction.status_at(now) == AuctionStatus::Ended {
            return Err(AppError::AlreadyEnded(
                "La subasta ya está terminada".to_string(),
            ));
        }

        let closed = self.repository.close(auction_id, now).await?;
        let car_ids = self.repository.car_ids(auction_id).await?;

        Ok(ApiResponse::success_with_message(
            AuctionResponse::from_auction(closed, car_ids, now),
            "Subasta cerrada exitosamente".to_string(),
        ))
    }

    pub async fn delete_auction(&self, auction_id: Uuid) -> Result<(), AppError> {
        self.repository.delete(auction_id).await
    }

    /// Añadir coches al catálogo de la subasta. Todo-o-nada: si algún
    /// id no existe se rechaza la petición completa.
    pub async fn add_cars(
        &self,
        auction_id: Uuid,
        request: AddCarsRequest,
    ) -> Result<ApiResponse<AuctionResponse>, AppError> {
        if request.car_ids.is_empty() {
            return Err(AppError::BadRequest(
                "Se requiere al menos un coche".to_string(),
            ));
        }

        let auction = self.find_auction(auction_id).await?;

        let missing = self.car_repository.find_missing(&request.car_ids).await?;
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Coches no encontrados: {}",
                missing
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        self.repository.add_cars(auction_id, &request.car_ids).await?;
        let car_ids = self.repository.car_ids(auction_id).await?;

        Ok(ApiResponse::success_with_message(
            AuctionResponse::from_auction(auction, car_ids, Utc::now()),
            "Coches añadidos a la subasta".to_string(),
        ))
    }

    /// Retirar un coche de la subasta (las pujas de ese par se eliminan)
    pub async fn remove_car(&self, auction_id: Uuid, car_id: Uuid) -> Result<(), AppError> {
        self.find_auction(auction_id).await?;
        self.repository.remove_car(auction_id, car_id).await
    }

    async fn find_auction(&self, auction_id: Uuid) -> Result<Auction, AppError> {
        self.repository
            .find_by_id(auction_id)
            .await?
            .ok_or_else(|| not_found_error("Auction", &auction_id.to_string()))
    }
}

/// El rango de fechas debe ser futuro y bien ordenado
fn validate_dates(
    start_date: chrono::DateTime<Utc>,
    end_date: chrono::DateTime<Utc>,
    now: chrono::DateTime<Utc>,
) -> Result<(), AppError> {
    if start_date <= now {
        return Err(validation_error(
            "startDate",
            "Start date must be in the future".to_string(),
        ));
    }
    if end_date <= start_date {
        return Err(validation_error(
            "endDate",
            "End date must be after the start date".to_string(),
        ));
    }
    Ok(())
}
