// routes/setup.rs
// GET /setup -> returns the otpauth:// URL for the caller's own enrollment.

use axum::{Json, response::IntoResponse};

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::totp::build_totp;

/// Returns { email, organization, otpauth_url } to enroll in authenticator apps.
pub async fn setup(session_user: SessionUser) -> Result<impl IntoResponse, ApiError> {
    let user = session_user.user();
    let totp = build_totp(session_user.org_name(), &user.email, &user.secret)?;
    let url = totp.get_url(); // v5: no args, already contains issuer/account

    Ok(Json(serde_json::json!({
        "success": true,
        "email": user.email,
        "organization": session_user.org_name(),
        "otpauth_url": url,
    })))
}
