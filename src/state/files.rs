use anyhow::Result;
use mongodb::bson::{
    Binary, DateTime, doc,
    spec::BinarySubtype,
};
use std::time::SystemTime;
use uuid::Uuid;

use crate::models::StoredFile;
use crate::reports::REPORT_CONTENT_TYPE;

use super::AppState;

/// Store a generated report under its deterministic filename, replacing any
/// previous blob with the same name.
pub async fn store_report(state: &AppState, filename: &str, bytes: Vec<u8>) -> Result<String> {
    let file = StoredFile {
        id: None,
        filename: filename.to_string(),
        content_type: REPORT_CONTENT_TYPE.to_string(),
        data: Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        },
        uploaded_at: DateTime::from_system_time(SystemTime::now()),
    };
    state
        .report_files
        .replace_one(doc! { "filename": filename }, file)
        .upsert(true)
        .await?;
    Ok(format!("/files/reports/{filename}"))
}

pub async fn get_report_file(state: &AppState, filename: &str) -> Result<Option<StoredFile>> {
    state
        .report_files
        .find_one(doc! { "filename": filename })
        .await
        .map_err(Into::into)
}

/// Store an uploaded logo under a randomized name that keeps the original
/// extension, and return its public URL.
pub async fn store_logo(
    state: &AppState,
    original_filename: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String> {
    let filename = match original_filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        _ => Uuid::new_v4().to_string(),
    };
    state
        .logo_files
        .insert_one(StoredFile {
            id: None,
            filename: filename.clone(),
            content_type: content_type.to_string(),
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            },
            uploaded_at: DateTime::from_system_time(SystemTime::now()),
        })
        .await?;
    Ok(format!("/files/logos/{filename}"))
}

pub async fn get_logo_file(state: &AppState, filename: &str) -> Result<Option<StoredFile>> {
    state
        .logo_files
        .find_one(doc! { "filename": filename })
        .await
        .map_err(Into::into)
}
