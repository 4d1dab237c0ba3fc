// Catalog CRUD against a real MongoDB: products with price-change history,
// supplies, providers (soft delete) and wastage records.

#[path = "common/mod.rs"]
mod common;

use chrono::{Duration, Utc};
use mongodb::bson::oid::ObjectId;

use commerceos::models::PriceField;
use commerceos::state::{
    AppState, create_organization, create_provider, create_supply, create_user,
    create_product, create_wastage_record, deactivate_provider, delete_product, delete_supply,
    delete_wastage_record, get_product_by_id, get_provider_by_id, get_supply_by_id,
    list_price_history, list_products, list_providers, list_supplies, list_wastage_records,
    update_product, update_provider, update_supply,
};

async fn bootstrap_tenant(state: &AppState, email: &str, org_name: &str) -> ObjectId {
    let user_id = create_user(state, email, "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP")
        .await
        .unwrap();
    create_organization(state, org_name, None, &user_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn products_record_history_only_beyond_the_threshold() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "productos@example.com", "Almacén Centro").await;

    let id = create_product(&state, &org, "Yerba 1kg", 100.0, 50.0, None, 20.0, 5.0)
        .await
        .unwrap();
    let created = get_product_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(created.suggested_price, 150.0);
    assert_eq!(created.final_price, 150.0);
    assert!(created.last_cost.is_none());

    // A sub-threshold move leaves no trace.
    update_product(&state, &org, &id, "Yerba 1kg", 100.005, 50.0, None, 20.0, 5.0)
        .await
        .unwrap();
    assert!(list_price_history(&state, &org, &id).await.unwrap().is_empty());
    let unchanged = get_product_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert!(unchanged.last_cost.is_none());

    // Beyond 0.01 the previous value is archived and pinned.
    update_product(&state, &org, &id, "Yerba 1kg", 120.0, 50.0, None, 20.0, 5.0)
        .await
        .unwrap();
    let history = list_price_history(&state, &org, &id).await.unwrap();
    let updated = get_product_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(updated.last_cost, Some(100.005));
    assert_eq!(updated.suggested_price, 180.0);

    // Cost change also moved the derived final price beyond the threshold,
    // so both fields got a history row.
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|h| h.field == PriceField::Cost
        && (h.old_value - 100.005).abs() < 1e-9
        && h.new_value == 120.0));
    assert!(history.iter().any(|h| h.field == PriceField::Price));

    // Explicit final price override.
    update_product(&state, &org, &id, "Yerba 1kg", 120.0, 50.0, Some(199.9), 20.0, 5.0)
        .await
        .unwrap();
    let repriced = get_product_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(repriced.final_price, 199.9);
    assert_eq!(repriced.last_price, Some(180.0));

    assert_eq!(list_products(&state, &org).await.unwrap().len(), 1);
    delete_product(&state, &org, &id).await.unwrap();
    assert!(get_product_by_id(&state, &org, &id).await.unwrap().is_none());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn supplies_pin_last_cost_on_material_changes() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "insumos@example.com", "Panadería Sol").await;

    let id = create_supply(&state, &org, "Harina", 80.0, "kg", 100.0, 25.0)
        .await
        .unwrap();

    update_supply(&state, &org, &id, "Harina", 80.004, "kg", 100.0, 25.0)
        .await
        .unwrap();
    let small = get_supply_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert!(small.last_cost.is_none());

    update_supply(&state, &org, &id, "Harina", 95.0, "kg", 90.0, 25.0)
        .await
        .unwrap();
    let updated = get_supply_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(updated.last_cost, Some(80.004));
    assert_eq!(updated.stock, 90.0);

    assert_eq!(list_supplies(&state, &org).await.unwrap().len(), 1);
    delete_supply(&state, &org, &id).await.unwrap();
    assert!(get_supply_by_id(&state, &org, &id).await.unwrap().is_none());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn providers_are_soft_deleted() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "proveedores@example.com", "Verdulería Este").await;

    let id = create_provider(
        &state,
        &org,
        "Distribuidora Norte",
        Some("11-5555-0000".to_string()),
        None,
        None,
    )
    .await
    .unwrap();

    update_provider(
        &state,
        &org,
        &id,
        "Distribuidora Norte SRL",
        Some("11-5555-0000".to_string()),
        Some("ventas@norte.example".to_string()),
        None,
    )
    .await
    .unwrap();

    assert_eq!(list_providers(&state, &org, false).await.unwrap().len(), 1);

    deactivate_provider(&state, &org, &id).await.unwrap();

    // Default listing hides it; the record itself survives for history.
    assert!(list_providers(&state, &org, false).await.unwrap().is_empty());
    let all = list_providers(&state, &org, true).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].active);
    assert_eq!(all[0].name, "Distribuidora Norte SRL");
    assert!(get_provider_by_id(&state, &org, &id).await.unwrap().is_some());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn wastage_records_list_by_day_range() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "mermas@example.com", "Fiambrería Oeste").await;

    let today = Utc::now().date_naive();
    let last_week = today - Duration::days(7);

    let recent = create_wastage_record(&state, &org, "Queso", 1.5, 600.0, "Vencido", today)
        .await
        .unwrap();
    create_wastage_record(&state, &org, "Jamón", 0.5, 900.0, "Caída", last_week)
        .await
        .unwrap();

    let all = list_wastage_records(&state, &org, last_week, today).await.unwrap();
    assert_eq!(all.len(), 2);
    // Newest first.
    assert_eq!(all[0].product_name, "Queso");

    let only_today = list_wastage_records(&state, &org, today, today).await.unwrap();
    assert_eq!(only_today.len(), 1);

    delete_wastage_record(&state, &org, &recent).await.unwrap();
    assert_eq!(
        list_wastage_records(&state, &org, last_week, today)
            .await
            .unwrap()
            .len(),
        1
    );

    common::teardown(Some(ctx)).await;
}
