// routes/providers.rs
// Provider CRUD. Deletes are soft: the record stays for history and reports.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::state::{
    AppState, create_provider, deactivate_provider, get_provider_by_id, list_providers,
    update_provider,
};

use super::helpers::*;

#[derive(Deserialize)]
pub struct ProviderFormData {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct ProviderListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub async fn providers_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let providers =
        list_providers(&state, session_user.org_id(), query.include_inactive).await?;
    Ok(Json(json!({ "success": true, "providers": providers })))
}

pub async fn providers_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ProviderFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = require_text(&form.name, "Nombre")?;
    let id = create_provider(
        &state,
        session_user.org_id(),
        &name,
        clean_opt(form.phone),
        clean_opt(form.email),
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

pub async fn providers_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<ProviderFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Proveedor")?;
    let name = require_text(&form.name, "Nombre")?;
    get_provider_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;

    update_provider(
        &state,
        session_user.org_id(),
        &object_id,
        &name,
        clean_opt(form.phone),
        clean_opt(form.email),
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn providers_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Proveedor")?;
    get_provider_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;
    deactivate_provider(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}
