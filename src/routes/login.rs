// routes/login.rs
// POST /login { "email": "...", "code": "123456" } -> { "success": true }
// plus the session cookie. The TOTP issuer is the user's first organization.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::session::session_cookie;
use crate::state::{AppState, SESSION_TTL_SECONDS, create_session, find_user};
use crate::totp::build_totp;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub code: String,
}

/// Verifies the current TOTP code with a small skew (±1 step) defined in TOTP::new().
pub async fn login(
    State(st): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    match find_user(&st, &body.email).await {
        Ok(Some(user)) => {
            let issuer = user
                .first_membership()
                .map(|m| m.org_name.clone())
                .unwrap_or_else(|| "CommerceOS".to_string());
            match build_totp(&issuer, &user.email, &user.secret) {
                Ok(totp) => {
                    let ok = totp.check_current(&body.code).unwrap_or(false);
                    if ok {
                        match create_session(&st, &user.email).await {
                            Ok(token) => {
                                let mut response = (
                                    StatusCode::OK,
                                    Json(serde_json::json!({ "success": true })),
                                )
                                    .into_response();
                                if let Ok(value) = HeaderValue::from_str(&session_cookie(
                                    &token,
                                    SESSION_TTL_SECONDS,
                                )) {
                                    response.headers_mut().append(SET_COOKIE, value);
                                }
                                response
                            }
                            Err(e) => (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                Json(serde_json::json!({
                                    "success": false,
                                    "error": format!("session error: {e}"),
                                })),
                            )
                                .into_response(),
                        }
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(serde_json::json!({ "success": false, "error": "Código inválido" })),
                        )
                            .into_response()
                    }
                }
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "success": false, "error": e.to_string() })),
                )
                    .into_response(),
            }
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "success": false, "error": "Usuario no encontrado" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "success": false, "error": format!("db error: {e}") })),
        )
            .into_response(),
    }
}
