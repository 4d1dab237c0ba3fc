use std::str::FromStr;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::models::{ExpenseCategory, PaymentMethod};

pub(super) fn parse_object_id(value: &str, label: &str) -> Result<ObjectId, ApiError> {
    ObjectId::from_str(value.trim()).map_err(|_| ApiError::validation(format!("{label} inválido")))
}

pub(super) fn parse_date_field(value: &str, label: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("{label} inválida (usa AAAA-MM-DD)")))
}

pub(super) fn require_text(value: &str, label: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{label} es obligatorio")));
    }
    Ok(trimmed.to_string())
}

pub(super) fn require_amount(value: f64, label: &str) -> Result<f64, ApiError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::validation(format!(
            "{label} debe ser un monto positivo"
        )));
    }
    Ok(value)
}

pub(super) fn require_non_negative(value: f64, label: &str) -> Result<f64, ApiError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ApiError::validation(format!(
            "{label} no puede ser negativo"
        )));
    }
    Ok(value)
}

pub(super) fn clean_opt(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(super) fn parse_payment_method(value: &str) -> Result<PaymentMethod, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "efectivo" => Ok(PaymentMethod::Cash),
        "transferencia" => Ok(PaymentMethod::Transfer),
        "qr" => Ok(PaymentMethod::Qr),
        "debito" | "débito" => Ok(PaymentMethod::Debit),
        "credito" | "crédito" => Ok(PaymentMethod::Credit),
        _ => Err(ApiError::validation("Forma de pago inválida")),
    }
}

pub(super) fn parse_expense_category(value: &str) -> Result<ExpenseCategory, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "negocio" => Ok(ExpenseCategory::Business),
        "compras_fletes" | "compras/fletes" | "compras" => Ok(ExpenseCategory::Purchases),
        "personal" => Ok(ExpenseCategory::Personal),
        "inversiones" => Ok(ExpenseCategory::Investments),
        "otros" | "otro" => Ok(ExpenseCategory::Other),
        _ => Err(ApiError::validation("Categoría de gasto inválida")),
    }
}
