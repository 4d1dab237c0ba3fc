// routes/logout.rs
// POST /logout -> clears the session cookie and removes the session entry.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::session::{SESSION_COOKIE_NAME, SessionUser};
use crate::state::{AppState, delete_session};

pub async fn logout(State(st): State<Arc<AppState>>, session: SessionUser) -> Response {
    let delete_result = delete_session(&st, session.token()).await;

    let expired_cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");

    let mut response = match delete_result {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "error": format!("session error: {e}"),
            })),
        )
            .into_response(),
    };
    if let Ok(header_value) = HeaderValue::from_str(&expired_cookie) {
        response.headers_mut().append(SET_COOKIE, header_value);
    }
    response
}
