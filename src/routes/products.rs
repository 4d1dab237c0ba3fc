// routes/products.rs
// Product catalog CRUD plus the price-change history lookup.

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
    AppState, create_product, delete_product, get_product_by_id, list_price_history,
    list_products, update_product,
};

use super::helpers::*;

#[derive(Deserialize)]
pub struct ProductFormData {
    pub name: String,
    pub cost: f64,
    #[serde(default)]
    pub margin_pct: f64,
    #[serde(default)]
    pub final_price: Option<f64>,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub min_stock: f64,
}

fn validate(form: &ProductFormData) -> Result<String, ApiError> {
    let name = require_text(&form.name, "Nombre")?;
    require_non_negative(form.cost, "Costo")?;
    require_non_negative(form.margin_pct, "Margen")?;
    if let Some(price) = form.final_price {
        require_non_negative(price, "Precio final")?;
    }
    require_non_negative(form.stock, "Stock")?;
    require_non_negative(form.min_stock, "Stock mínimo")?;
    Ok(name)
}

pub async fn products_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let products = list_products(&state, session_user.org_id()).await?;
    Ok(Json(json!({ "success": true, "products": products })))
}

pub async fn products_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ProductFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = validate(&form)?;
    let id = create_product(
        &state,
        session_user.org_id(),
        &name,
        form.cost,
        form.margin_pct,
        form.final_price,
        form.stock,
        form.min_stock,
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

pub async fn products_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Producto")?;
    let product = get_product_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Producto no encontrado"))?;
    Ok(Json(json!({ "success": true, "product": product })))
}

pub async fn products_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<ProductFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Producto")?;
    let name = validate(&form)?;
    get_product_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Producto no encontrado"))?;

    update_product(
        &state,
        session_user.org_id(),
        &object_id,
        &name,
        form.cost,
        form.margin_pct,
        form.final_price,
        form.stock,
        form.min_stock,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn products_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Producto")?;
    get_product_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Producto no encontrado"))?;
    delete_product(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn products_history(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Producto")?;
    let history = list_price_history(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true, "history": history })))
}
