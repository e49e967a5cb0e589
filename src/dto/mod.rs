//! DTOs compartidos de la API
//!
//! Envelope canónico de respuesta y paginación. El cliente tolera varios
//! formatos de envelope; aquí se normaliza a uno solo:
//! `{ success, message?, data }` (+ 204 sin cuerpo para los deletes).

use serde::Serialize;

/// Response genérica
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            message: Some(message),
            data: Some(data),
        }
    }
}

/// Información de paginación de los listados
#[derive(Debug, Clone, Serialize)]
pub struct PaginationInfo {
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "totalItems")]
    pub total_items: i64,
    pub limit: i64,
}

impl PaginationInfo {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + limit - 1) / limit
        };
        Self {
            current_page: page,
            total_pages,
            total_items,
            limit,
        }
    }
}

/// Parámetros normalizados de paginación (1-indexed, límites acotados)
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn from_options(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(PaginationInfo::new(1, 10, 0).total_pages, 0);
        assert_eq!(PaginationInfo::new(1, 10, 10).total_pages, 1);
        assert_eq!(PaginationInfo::new(1, 10, 11).total_pages, 2);
        assert_eq!(PaginationInfo::new(1, 10, 95).total_pages, 10);
    }

    #[test]
    fn test_page_params_normalization() {
        let params = PageParams::from_options(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, PageParams::DEFAULT_LIMIT);

        let params = PageParams::from_options(Some(0), Some(1000));
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, PageParams::MAX_LIMIT);

        let params = PageParams::from_options(Some(3), Some(20));
        assert_eq!(params.offset(), 40);
    }
}
