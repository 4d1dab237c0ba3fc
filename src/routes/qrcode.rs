// routes/qrcode.rs
// GET /qrcode -> returns a PNG QR code of the caller's otpauth URL.

use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::error::ApiError;
use crate::session::SessionUser;
use crate::totp::build_totp;

/// Builds and returns a PNG QR code so clients can scan and enroll.
pub async fn qrcode(session_user: SessionUser) -> Result<Response, ApiError> {
    let user = session_user.user();
    let totp = build_totp(session_user.org_name(), &user.email, &user.secret)?;
    let url = totp.get_url();

    let code = QrCode::new(url.as_bytes())
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("qr build failed: {e}")))?;
    let img = code.render::<Luma<u8>>().min_dimensions(200, 200).build();

    // image 0.25: write_to requires Write + Seek -> Cursor<Vec<u8>>
    let mut cursor = Cursor::new(Vec::<u8>::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("png encode failed: {e}")))?;

    Ok(Response::builder()
        .header("Content-Type", "image/png")
        .body(Body::from(cursor.into_inner()))
        .unwrap_or_else(|_| ().into_response()))
}
