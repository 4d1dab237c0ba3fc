// routes/cash.rs
// Daily cash-session handling: open, append movements, close with the
// physical count, and manage the archived audits plus their spreadsheet
// reports.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::reports;
use crate::session::SessionUser;
use crate::state::{
    AppState, add_expense, add_income, add_sale, close_session, current_open_session,
    delete_audit, get_audit_by_id, get_org_settings, get_provider_by_id, list_audits,
    open_session, set_audit_report_url, store_report, update_audit, update_opening_balances,
};
use crate::stats;

use super::helpers::*;

#[derive(Deserialize)]
pub struct OpenSessionData {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub opening_cash: f64,
    #[serde(default)]
    pub opening_digital: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct OpeningBalancesData {
    pub opening_cash: f64,
    pub opening_digital: f64,
}

#[derive(Deserialize)]
pub struct SaleData {
    pub amount: f64,
    pub method: String,
    #[serde(default)]
    pub is_credit: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit fee override; when absent the organization's commission
    /// percentages decide.
    #[serde(default)]
    pub commission: Option<f64>,
}

#[derive(Deserialize)]
pub struct IncomeData {
    pub description: String,
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct ExpenseData {
    pub description: String,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub provider_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CloseSessionData {
    pub physical_cash: f64,
    pub physical_digital: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
pub struct AuditEditData {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// GET /api/cash/session: the open session with its running totals, or null.
pub async fn session_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match current_open_session(&state, session_user.org_id()).await? {
        Some(session) => {
            let totals = stats::session_totals(&session);
            Ok(Json(json!({ "success": true, "session": session, "totals": totals })))
        }
        None => Ok(Json(json!({ "success": true, "session": null }))),
    }
}

/// POST /api/cash/session: open the day. Rejected while another session is
/// still open.
pub async fn session_open(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<OpenSessionData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_non_negative(form.opening_cash, "Apertura en efectivo")?;
    require_non_negative(form.opening_digital, "Apertura digital")?;
    let date = match form.date.as_deref() {
        Some(value) => parse_date_field(value, "Fecha")?,
        None => Utc::now().date_naive(),
    };

    if current_open_session(&state, session_user.org_id())
        .await?
        .is_some()
    {
        return Err(ApiError::validation("Ya existe una caja abierta"));
    }

    let id = open_session(
        &state,
        session_user.org_id(),
        date,
        form.opening_cash,
        form.opening_digital,
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

/// PUT /api/cash/session/opening: adjust opening balances of the open
/// session.
pub async fn session_opening_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<OpeningBalancesData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_non_negative(form.opening_cash, "Apertura en efectivo")?;
    require_non_negative(form.opening_digital, "Apertura digital")?;

    let session = require_open_session(&state, &session_user).await?;
    update_opening_balances(
        &state,
        session_user.org_id(),
        &session_id(&session)?,
        form.opening_cash,
        form.opening_digital,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/cash/session/sales
pub async fn sales_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<SaleData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let amount = require_amount(form.amount, "Monto")?;
    let method = parse_payment_method(&form.method)?;
    let commission = match form.commission {
        Some(fee) => require_non_negative(fee, "Comisión")?,
        None => {
            let settings = get_org_settings(&state, session_user.org_id()).await?;
            settings.commission_for(method, amount)
        }
    };

    let session = require_open_session(&state, &session_user).await?;
    let entry_id = add_sale(
        &state,
        session_user.org_id(),
        &session_id(&session)?,
        amount,
        method,
        commission,
        form.is_credit,
        clean_opt(form.description),
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "entry_id": entry_id.to_hex(),
        "commission": commission,
    })))
}

/// POST /api/cash/session/incomes
pub async fn incomes_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<IncomeData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let description = require_text(&form.description, "Descripción")?;
    let amount = require_amount(form.amount, "Monto")?;

    let session = require_open_session(&state, &session_user).await?;
    let entry_id = add_income(
        &state,
        session_user.org_id(),
        &session_id(&session)?,
        &description,
        amount,
    )
    .await?;
    Ok(Json(json!({ "success": true, "entry_id": entry_id.to_hex() })))
}

/// POST /api/cash/session/expenses
pub async fn expenses_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ExpenseData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let description = require_text(&form.description, "Descripción")?;
    let amount = require_amount(form.amount, "Monto")?;
    let category = parse_expense_category(&form.category)?;

    let (provider_id, provider_name) = match clean_opt(form.provider_id) {
        Some(raw) => {
            let id = parse_object_id(&raw, "Proveedor")?;
            let provider = get_provider_by_id(&state, session_user.org_id(), &id)
                .await?
                .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;
            (Some(id), Some(provider.name))
        }
        None => (None, None),
    };

    let session = require_open_session(&state, &session_user).await?;
    let entry_id = add_expense(
        &state,
        session_user.org_id(),
        &session_id(&session)?,
        &description,
        amount,
        category,
        provider_id,
        provider_name,
    )
    .await?;
    Ok(Json(json!({ "success": true, "entry_id": entry_id.to_hex() })))
}

/// POST /api/cash/close: record the physical count, archive the audit and
/// generate the report. A report failure does not undo the close: the session
/// stays CLOSED, the audit keeps a null report URL and regeneration is the
/// retry path.
pub async fn session_close(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<CloseSessionData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_non_negative(form.physical_cash, "Efectivo contado")?;
    require_non_negative(form.physical_digital, "Digital contado")?;

    let session = require_open_session(&state, &session_user).await?;
    let (closed, audit_id) = close_session(
        &state,
        session_user.org_id(),
        &session_id(&session)?,
        form.physical_cash,
        form.physical_digital,
        clean_opt(form.notes),
    )
    .await?;

    let totals = stats::session_totals(&closed);
    let report_url =
        match generate_and_store_report(&state, session_user.org_id(), &audit_id).await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(error = ?err, "la caja cerró pero el reporte no pudo generarse");
                None
            }
        };

    Ok(Json(json!({
        "success": true,
        "audit_id": audit_id.to_hex(),
        "totals": totals,
        "difference": closed.difference,
        "report_url": report_url,
    })))
}

/// GET /api/cash/audits?from=YYYY-MM-DD&to=YYYY-MM-DD: inclusive calendar
/// range, newest first.
pub async fn audits_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = parse_date_field(&query.from, "Fecha inicial")?;
    let end = parse_date_field(&query.to, "Fecha final")?;
    if start > end {
        return Err(ApiError::validation("El rango de fechas está invertido"));
    }
    let audits = list_audits(&state, session_user.org_id(), start, end).await?;
    Ok(Json(json!({ "success": true, "audits": audits })))
}

pub async fn audits_show(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Arqueo")?;
    let audit = get_audit_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Arqueo no encontrado"))?;
    Ok(Json(json!({ "success": true, "audit": audit })))
}

/// PUT /api/cash/audits/{id}: explicit edit of date/notes only.
pub async fn audits_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<AuditEditData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Arqueo")?;
    get_audit_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Arqueo no encontrado"))?;

    let date = match form.date.as_deref() {
        Some(value) => Some(parse_date_field(value, "Fecha")?),
        None => None,
    };
    update_audit(
        &state,
        session_user.org_id(),
        &object_id,
        date,
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/cash/audits/{id}/report: rebuild the spreadsheet, overwrite the
/// stored blob and patch the audit's URL.
pub async fn audits_regenerate_report(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Arqueo")?;
    get_audit_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Arqueo no encontrado"))?;

    let url = generate_and_store_report(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true, "report_url": url })))
}

pub async fn audits_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Arqueo")?;
    get_audit_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Arqueo no encontrado"))?;
    delete_audit(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub(super) async fn require_open_session(
    state: &AppState,
    session_user: &SessionUser,
) -> Result<crate::models::CashSession, ApiError> {
    current_open_session(state, session_user.org_id())
        .await?
        .ok_or_else(|| ApiError::validation("No hay caja abierta"))
}

fn session_id(session: &crate::models::CashSession) -> Result<ObjectId, ApiError> {
    session
        .id
        .ok_or_else(|| ApiError::Storage(anyhow::anyhow!("cash session missing _id")))
}

async fn generate_and_store_report(
    state: &AppState,
    org_id: &ObjectId,
    audit_id: &ObjectId,
) -> anyhow::Result<String> {
    let audit = get_audit_by_id(state, org_id, audit_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("audit disappeared before report generation"))?;
    let bytes = reports::build_session_report(&audit)?;
    let filename = reports::report_filename(&audit, DateTime::now());
    let url = store_report(state, &filename, bytes).await?;
    set_audit_report_url(state, org_id, audit_id, &url).await?;
    Ok(url)
}
