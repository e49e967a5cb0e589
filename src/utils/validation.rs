//! Utilidades de validación
//!
//! Este módulo contiene funciones helper de validación del dominio:
//! VIN, contraseñas y whitelists de campos de ordenación.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    // VIN de 17 caracteres, alfanumérico excluyendo I, O y Q
    static ref VIN_REGEX: Regex = Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap();
    static ref NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z\s]+$").unwrap();
}

/// Validar formato de VIN (17 caracteres, sin I/O/Q)
pub fn validate_vin(value: &str) -> Result<(), ValidationError> {
    if !VIN_REGEX.is_match(value) {
        let mut error = ValidationError::new("vin");
        error.message = Some("VIN must be exactly 17 characters, excluding I, O and Q".into());
        return Err(error);
    }
    Ok(())
}

/// Validar nombre de usuario (solo letras y espacios)
pub fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    if !NAME_REGEX.is_match(value) {
        let mut error = ValidationError::new("name");
        error.message = Some("Name must contain only letters and spaces".into());
        return Err(error);
    }
    Ok(())
}

/// Validar política de contraseñas: mínimo 8, una mayúscula y un dígito
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    let long_enough = value.chars().count() >= 8;
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());

    if !long_enough || !has_upper || !has_digit {
        let mut error = ValidationError::new("password");
        error.message = Some(
            "Password must be at least 8 characters with one uppercase letter and one number"
                .into(),
        );
        return Err(error);
    }
    Ok(())
}

/// Resolver un campo de ordenación contra una whitelist (campo API -> columna SQL).
/// Devuelve la columna por defecto si el campo no está permitido o no viene.
pub fn resolve_sort_column(
    requested: Option<&str>,
    allowed: &[(&str, &str)],
    default_column: &'static str,
) -> String {
    match requested {
        Some(field) => allowed
            .iter()
            .find(|(api, _)| *api == field)
            .map(|(_, column)| column.to_string())
            .unwrap_or_else(|| default_column.to_string()),
        None => default_column.to_string(),
    }
}

/// Normalizar la dirección de ordenación a ASC/DESC
pub fn resolve_sort_order(requested: Option<&str>, default_desc: bool) -> &'static str {
    match requested {
        Some(value) if value.eq_ignore_ascii_case("asc") => "ASC",
        Some(value) if value.eq_ignore_ascii_case("desc") => "DESC",
        _ => {
            if default_desc {
                "DESC"
            } else {
                "ASC"
            }
        }
    }
}

/// Campos de ordenación permitidos para coches
pub const CAR_SORT_FIELDS: &[(&str, &str)] = &[
    ("VIN", "vin"),
    ("brand", "brand"),
    ("model", "model"),
    ("odometerValue", "odometer_value"),
    ("year", "year"),
    ("exteriorColor", "exterior_color"),
    ("interiorColor", "interior_color"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

/// Campos de ordenación permitidos para subastas
pub const AUCTION_SORT_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("startDate", "start_date"),
    ("endDate", "end_date"),
    ("createdAt", "created_at"),
];

/// Campos de ordenación permitidos para pujas
pub const BID_SORT_FIELDS: &[(&str, &str)] = &[
    ("amount", "amount"),
    ("placedAt", "placed_at"),
    ("createdAt", "created_at"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_vin() {
        assert!(validate_vin("1HGBH41JXMN109186").is_ok());
        assert!(validate_vin("WBA3A5C55DF123456").is_ok());
    }

    #[test]
    fn test_vin_rejects_forbidden_letters() {
        // I, O y Q no son válidos en un VIN
        assert!(validate_vin("IHGBH41JXMN109186").is_err());
        assert!(validate_vin("OHGBH41JXMN109186").is_err());
        assert!(validate_vin("QHGBH41JXMN109186").is_err());
    }

    #[test]
    fn test_vin_rejects_wrong_length() {
        assert!(validate_vin("1HGBH41JXMN10918").is_err());
        assert!(validate_vin("1HGBH41JXMN1091867").is_err());
        assert!(validate_vin("").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("short1A").is_err()); // corta
        assert!(validate_password("nouppercase1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }

    #[test]
    fn test_resolve_sort_column_whitelist() {
        assert_eq!(
            resolve_sort_column(Some("odometerValue"), CAR_SORT_FIELDS, "created_at"),
            "odometer_value"
        );
        // Campos fuera de la whitelist caen al default (evita inyección en ORDER BY)
        assert_eq!(
            resolve_sort_column(Some("id; DROP TABLE cars"), CAR_SORT_FIELDS, "created_at"),
            "created_at"
        );
        assert_eq!(
            resolve_sort_column(None, CAR_SORT_FIELDS, "created_at"),
            "created_at"
        );
    }

    #[test]
    fn test_resolve_sort_order() {
        assert_eq!(resolve_sort_order(Some("asc"), true), "ASC");
        assert_eq!(resolve_sort_order(Some("DESC"), false), "DESC");
        assert_eq!(resolve_sort_order(Some("sideways"), true), "DESC");
        assert_eq!(resolve_sort_order(None, false), "ASC");
    }
}
