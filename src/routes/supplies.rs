// routes/supplies.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::state::{
    AppState, create_supply, delete_supply, get_supply_by_id, list_supplies, update_supply,
};

use super::helpers::*;

#[derive(Deserialize)]
pub struct SupplyFormData {
    pub name: String,
    pub cost: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub min_stock: f64,
}

pub async fn supplies_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let supplies = list_supplies(&state, session_user.org_id()).await?;
    Ok(Json(json!({ "success": true, "supplies": supplies })))
}

pub async fn supplies_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SupplyFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = require_text(&form.name, "Nombre")?;
    require_non_negative(form.cost, "Costo")?;
    require_non_negative(form.stock, "Stock")?;
    require_non_negative(form.min_stock, "Stock mínimo")?;
    let unit = clean_opt(form.unit).unwrap_or_else(|| "unidad".to_string());

    let id = create_supply(
        &state,
        session_user.org_id(),
        &name,
        form.cost,
        &unit,
        form.stock,
        form.min_stock,
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

pub async fn supplies_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<SupplyFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Insumo")?;
    let name = require_text(&form.name, "Nombre")?;
    require_non_negative(form.cost, "Costo")?;
    require_non_negative(form.stock, "Stock")?;
    require_non_negative(form.min_stock, "Stock mínimo")?;
    let unit = clean_opt(form.unit).unwrap_or_else(|| "unidad".to_string());

    get_supply_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Insumo no encontrado"))?;

    update_supply(
        &state,
        session_user.org_id(),
        &object_id,
        &name,
        form.cost,
        &unit,
        form.stock,
        form.min_stock,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn supplies_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Insumo")?;
    get_supply_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Insumo no encontrado"))?;
    delete_supply(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}
