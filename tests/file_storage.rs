// Blob storage semantics: filename-keyed overwrite for reports, randomized
// names preserving the extension for logos.

#[path = "common/mod.rs"]
mod common;

use commerceos::state::{get_logo_file, get_report_file, store_logo, store_report};

#[tokio::test]
async fn reports_overwrite_on_filename_conflict() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();

    let url = store_report(&state, "arqueo-2024-03-05-1.xlsx", vec![1, 2, 3])
        .await
        .unwrap();
    assert_eq!(url, "/files/reports/arqueo-2024-03-05-1.xlsx");

    store_report(&state, "arqueo-2024-03-05-1.xlsx", vec![9, 9])
        .await
        .unwrap();

    let stored = get_report_file(&state, "arqueo-2024-03-05-1.xlsx")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.data.bytes, vec![9, 9]);
    assert!(stored.content_type.contains("spreadsheetml"));

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn logos_get_randomized_names_with_the_original_extension() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();

    let first = store_logo(&state, "mi-logo.PNG", "image/png", vec![0xAA])
        .await
        .unwrap();
    let second = store_logo(&state, "mi-logo.PNG", "image/png", vec![0xBB])
        .await
        .unwrap();

    assert!(first.starts_with("/files/logos/"));
    assert!(first.ends_with(".png"));
    assert_ne!(first, second, "each upload gets its own name");

    let filename = first.rsplit('/').next().unwrap();
    let stored = get_logo_file(&state, filename).await.unwrap().unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert_eq!(stored.data.bytes, vec![0xAA]);

    common::teardown(Some(ctx)).await;
}
