// routes/files.rs
// Public blob endpoints: generated spreadsheet reports and uploaded logos.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::{AppState, get_logo_file, get_report_file};

pub async fn report_download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let file = get_report_file(&state, &filename)
        .await?
        .ok_or_else(|| ApiError::not_found("Reporte no encontrado"))?;
    Ok(serve(file.content_type, file.data.bytes))
}

pub async fn logo_download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let file = get_logo_file(&state, &filename)
        .await?
        .ok_or_else(|| ApiError::not_found("Logo no encontrado"))?;
    Ok(serve(file.content_type, file.data.bytes))
}

fn serve(content_type: String, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, content_type)],
        Body::from(bytes),
    )
        .into_response()
}
