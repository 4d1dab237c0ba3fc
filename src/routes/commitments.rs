// routes/commitments.rs
// Payment commitments. Paying with use_cash posts the expense into the open
// session first and only then flips the status, so a failed post leaves the
// commitment PENDING and retryable.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::models::{CommitmentStatus, ExpenseCategory};
use crate::session::SessionUser;
use crate::state::{
    AppState, add_expense, create_commitment, delete_commitment, get_commitment_by_id,
    get_provider_by_id, list_commitments, mark_commitment_paid, update_commitment,
};

use super::cash::require_open_session;
use super::helpers::*;

#[derive(Deserialize)]
pub struct CommitmentFormData {
    pub description: String,
    pub amount: f64,
    pub due_date: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CommitmentListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct PayData {
    /// Also post the payment as a Business expense against the open session.
    #[serde(default)]
    pub use_cash: bool,
}

fn parse_status(value: &str) -> Result<CommitmentStatus, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "pending" | "pendiente" => Ok(CommitmentStatus::Pending),
        "paid" | "pagado" => Ok(CommitmentStatus::Paid),
        _ => Err(ApiError::validation("Estado inválido")),
    }
}

pub async fn commitments_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommitmentListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = match query.status.as_deref() {
        Some(value) => Some(parse_status(value)?),
        None => None,
    };
    let commitments = list_commitments(&state, session_user.org_id(), status).await?;
    Ok(Json(json!({ "success": true, "commitments": commitments })))
}

pub async fn commitments_create(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Json(form): Json<CommitmentFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let description = require_text(&form.description, "Descripción")?;
    let amount = require_amount(form.amount, "Monto")?;
    let due_date = parse_date_field(&form.due_date, "Fecha de vencimiento")?;
    let provider_id = match clean_opt(form.provider_id) {
        Some(raw) => {
            let id = parse_object_id(&raw, "Proveedor")?;
            get_provider_by_id(&state, session_user.org_id(), &id)
                .await?
                .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;
            Some(id)
        }
        None => None,
    };

    let id = create_commitment(
        &state,
        session_user.org_id(),
        &description,
        amount,
        due_date,
        provider_id,
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id.to_hex() })))
}

pub async fn commitments_update(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<CommitmentFormData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Compromiso")?;
    let description = require_text(&form.description, "Descripción")?;
    let amount = require_amount(form.amount, "Monto")?;
    let due_date = parse_date_field(&form.due_date, "Fecha de vencimiento")?;

    let existing = get_commitment_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Compromiso no encontrado"))?;
    if existing.status == CommitmentStatus::Paid {
        return Err(ApiError::validation("El compromiso ya fue pagado"));
    }

    let provider_id = match clean_opt(form.provider_id) {
        Some(raw) => {
            let pid = parse_object_id(&raw, "Proveedor")?;
            get_provider_by_id(&state, session_user.org_id(), &pid)
                .await?
                .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;
            Some(pid)
        }
        None => None,
    };

    update_commitment(
        &state,
        session_user.org_id(),
        &object_id,
        &description,
        amount,
        due_date,
        provider_id,
        clean_opt(form.notes),
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /api/commitments/{id}/pay
pub async fn commitments_pay(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<PayData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Compromiso")?;
    let commitment = get_commitment_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Compromiso no encontrado"))?;
    if commitment.status == CommitmentStatus::Paid {
        return Err(ApiError::validation("El compromiso ya fue pagado"));
    }

    if form.use_cash {
        // Expense first; the commitment only flips to PAID after the post
        // lands. Without an open session the payment is rejected outright.
        let session = require_open_session(&state, &session_user).await?;
        let session_id = session
            .id
            .ok_or_else(|| ApiError::Storage(anyhow::anyhow!("cash session missing _id")))?;

        let provider_name = match commitment.provider_id.as_ref() {
            Some(pid) => get_provider_by_id(&state, session_user.org_id(), pid)
                .await?
                .map(|p| p.name),
            None => None,
        };

        add_expense(
            &state,
            session_user.org_id(),
            &session_id,
            &format!("Pago compromiso: {}", commitment.description),
            commitment.amount,
            ExpenseCategory::Business,
            commitment.provider_id,
            provider_name,
        )
        .await?;
    }

    mark_commitment_paid(&state, session_user.org_id(), &object_id)
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?;
    Ok(Json(json!({ "success": true })))
}

pub async fn commitments_delete(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let object_id = parse_object_id(&id, "Compromiso")?;
    get_commitment_by_id(&state, session_user.org_id(), &object_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Compromiso no encontrado"))?;
    delete_commitment(&state, session_user.org_id(), &object_id).await?;
    Ok(Json(json!({ "success": true })))
}
