// routes/wastage.rs
// Append-only loss tracking: create, list by day range, delete.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::state::{AppState, create_wastage_record, delete_wastage_record, list_wastage_records};

use super::helpers::*;

#[derive(Deserialize)]
pub struct WastageFormData {
    pub product_name: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub reason: String,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Deserialize)]
pub struct WastageListQuery {
    pub from: String,
    pub to: String,
}

pub async fn wastage_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WastageListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = parse_date_field(&query.from, "Fecha inicial")?;
    let end = parse_date_field(&query.to, "Fecha final")?;
    if start > end {
        return Err(ApiError::validation("El rango de fechas está invertido"));
    }
    let records = list_wastage_records(&state, session_user.org_id(), start, end).await?;
    Ok(Json(json!({ "success": true, "records": records })))
}

pub async fn wastage_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<WastageFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product_name = require_text(&form.product_name, "Producto")?;
    let reason = require_text(&form.reason, "Motivo")?;
    let quantity = require_amount(form.quantity, "Cantidad")?;
    require_non_negative(form.unit_cost, "Costo unitario")?;
    let date = match form.date.as_deref() {
        Some(value) => parse_date_field(value, "Fecha")?,
        None => Utc::now().date_naive(),
    };

    let id = create_wastage_record(
        &state,
        session_user.org_id(),
        &product_name,
        quantity,
        form.unit_cost,
        &reason,
        date,
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

pub async fn wastage_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Registro")?;
    delete_wastage_record(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}
