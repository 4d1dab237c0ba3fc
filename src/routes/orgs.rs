// routes/orgs.rs
// Organization management: listing the caller's memberships, creating a
// tenant, switching the active tenant, typed settings, and logo upload.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::models::{ORG_SETTINGS_VERSION, OrgSettings};
use crate::session::{SessionUser, active_org_cookie};
use crate::state::{
    AppState, create_organization, get_org_by_id, get_org_settings, set_org_logo, store_logo,
    update_org_settings, update_organization,
};

use super::helpers::*;

const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

#[derive(Deserialize)]
pub struct OrgCreateData {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct OrgSwitchData {
    pub org_id: String,
}

#[derive(Deserialize)]
pub struct OrgUpdateData {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct SettingsData {
    #[serde(default)]
    pub commission_qr: f64,
    #[serde(default)]
    pub commission_debit: f64,
    #[serde(default)]
    pub commission_credit: f64,
    #[serde(default = "default_true")]
    pub low_stock_alerts: bool,
}

/// GET /api/me/orgs: the caller's memberships, first one is the fallback
/// tenant.
pub async fn me_orgs(session_user: SessionUser) -> Json<serde_json::Value> {
    let orgs: Vec<serde_json::Value> = session_user
        .user()
        .memberships
        .iter()
        .map(|m| {
            json!({
                "id": m.org_id.to_hex(),
                "name": m.org_name,
                "slug": m.org_slug,
                "role": m.role.as_str(),
                "active": m.org_id == *session_user.org_id(),
            })
        })
        .collect();
    Json(json!({ "success": true, "organizations": orgs }))
}

/// GET /api/org: profile of the active organization.
pub async fn org_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let org = get_org_by_id(&state, session_user.org_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Organización no encontrada"))?;
    Ok(Json(json!({
        "success": true,
        "organization": {
            "id": session_user.org_id().to_hex(),
            "name": org.name,
            "slug": org.slug,
            "logo_url": org.logo_url,
            "is_active": org.is_active,
            "notes": org.notes,
        },
    })))
}

/// POST /api/orgs: create a tenant with the caller as admin. The org, the
/// membership and the baseline session land atomically.
pub async fn orgs_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<OrgCreateData>,
) -> Result<Response, ApiError> {
    let name = require_text(&form.name, "Nombre")?;
    let org_id = create_organization(
        &state,
        &name,
        clean_opt(form.notes),
        session_user.user_id(),
    )
    .await?;

    // Pin the new tenant right away so the next request lands in it.
    let mut response = (
        StatusCode::OK,
        Json(json!({ "success": true, "id": org_id.to_hex() })),
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&active_org_cookie(&org_id)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

/// PUT /api/org: rename/deactivate the active organization (admin only).
pub async fn org_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<OrgUpdateData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !session_user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let name = require_text(&form.name, "Nombre")?;
    update_organization(
        &state,
        session_user.org_id(),
        &name,
        form.is_active,
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /org/switch: re-pin the active-tenant preference cookie. Membership
/// is checked against the session, not the cookie.
pub async fn org_switch(
    session_user: SessionUser,
    Json(form): Json<OrgSwitchData>,
) -> Result<Response, ApiError> {
    let org_id = parse_object_id(&form.org_id, "Organización")?;
    if session_user.user().membership_for(&org_id).is_none() {
        return Err(ApiError::Forbidden);
    }

    let mut response = (StatusCode::OK, Json(json!({ "success": true }))).into_response();
    if let Ok(value) = HeaderValue::from_str(&active_org_cookie(&org_id)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

/// GET /api/org/settings: versioned settings, migrated on the way out.
pub async fn settings_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let settings = get_org_settings(&state, session_user.org_id()).await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// PUT /api/org/settings (admin only).
pub async fn settings_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SettingsData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !session_user.is_admin() {
        return Err(ApiError::Forbidden);
    }
    for (value, label) in [
        (form.commission_qr, "Comisión QR"),
        (form.commission_debit, "Comisión débito"),
        (form.commission_credit, "Comisión crédito"),
    ] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(ApiError::validation(format!(
                "{label} debe estar entre 0 y 100"
            )));
        }
    }

    let settings = OrgSettings {
        version: ORG_SETTINGS_VERSION,
        commission_qr: form.commission_qr,
        commission_debit: form.commission_debit,
        commission_credit: form.commission_credit,
        low_stock_alerts: form.low_stock_alerts,
    };
    update_org_settings(&state, session_user.org_id(), &settings).await?;
    Ok(Json(json!({ "success": true, "settings": settings })))
}

/// POST /api/org/logo: multipart upload; the blob is stored under a
/// randomized name that keeps the original extension.
pub async fn logo_upload(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !session_user.is_admin() {
        return Err(ApiError::Forbidden);
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::validation("Archivo inválido"))?
    {
        if field.name() != Some("logo") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|f| f.to_string())
            .ok_or_else(|| ApiError::validation("El archivo no tiene nombre"))?;
        let content_type = field
            .content_type()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::validation("No se pudo leer el archivo"))?;
        if bytes.is_empty() {
            return Err(ApiError::validation("El archivo está vacío"));
        }
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(ApiError::validation("El logo supera el tamaño máximo de 2 MB"));
        }

        let url = store_logo(&state, &filename, &content_type, bytes.to_vec()).await?;
        set_org_logo(&state, session_user.org_id(), &url).await?;
        return Ok(Json(json!({ "success": true, "logo_url": url })));
    }

    Err(ApiError::validation("Falta el archivo \"logo\""))
}
