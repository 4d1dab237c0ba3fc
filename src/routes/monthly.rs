// routes/monthly.rs
// Monthly profitability statistics over the archived audits of a calendar
// range. The aggregation itself is pure; this handler only fetches and feeds.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::state::{AppState, list_audits};
use crate::stats;

use super::helpers::*;

#[derive(Deserialize)]
pub struct StatsRangeQuery {
    pub from: String,
    pub to: String,
}

/// GET /api/stats/monthly?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn monthly_stats(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsRangeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = parse_date_field(&query.from, "Fecha inicial")?;
    let end = parse_date_field(&query.to, "Fecha final")?;
    if start > end {
        return Err(ApiError::validation("El rango de fechas está invertido"));
    }

    let audits = list_audits(&state, session_user.org_id(), start, end).await?;
    let stats = stats::monthly_stats(&audits);
    Ok(Json(json!({ "success": true, "stats": stats })))
}
