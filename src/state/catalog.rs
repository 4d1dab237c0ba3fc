use anyhow::{Context, Result};
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{HistoricalPrice, PriceField, Product, Provider, Supply};

use super::{AppState, PRICE_HISTORY_THRESHOLD};

/// Margin-derived suggested price: cost plus the margin percentage.
pub fn suggested_price(cost: f64, margin_pct: f64) -> f64 {
    cost * (1.0 + margin_pct / 100.0)
}

pub async fn list_products(state: &AppState, org_id: &ObjectId) -> Result<Vec<Product>> {
    let mut cursor = state
        .products
        .find(doc! { "org_id": org_id })
        .sort(doc! { "name": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(product) = cursor.try_next().await? {
        items.push(product);
    }
    Ok(items)
}

pub async fn get_product_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<Product>> {
    state
        .products
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

pub async fn create_product(
    state: &AppState,
    org_id: &ObjectId,
    name: &str,
    cost: f64,
    margin_pct: f64,
    final_price: Option<f64>,
    stock: f64,
    min_stock: f64,
) -> Result<ObjectId> {
    let suggested = suggested_price(cost, margin_pct);
    let res = state
        .products
        .insert_one(Product {
            id: None,
            org_id: *org_id,
            name: name.to_string(),
            cost,
            margin_pct,
            suggested_price: suggested,
            final_price: final_price.unwrap_or(suggested),
            stock,
            min_stock,
            last_cost: None,
            last_price: None,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("product insert missing _id")
}

/// Update a product. Cost/price moves beyond the materiality threshold are
/// archived as HistoricalPrice rows and pinned into the denormalized
/// last_cost/last_price fields before the new values land.
pub async fn update_product(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    name: &str,
    cost: f64,
    margin_pct: f64,
    final_price: Option<f64>,
    stock: f64,
    min_stock: f64,
) -> Result<()> {
    let existing = get_product_by_id(state, org_id, id)
        .await?
        .context("producto no encontrado")?;

    let suggested = suggested_price(cost, margin_pct);
    let final_price = final_price.unwrap_or(suggested);
    let now = DateTime::from_system_time(SystemTime::now());

    let mut set = doc! {
        "name": name,
        "cost": cost,
        "margin_pct": margin_pct,
        "suggested_price": suggested,
        "final_price": final_price,
        "stock": stock,
        "min_stock": min_stock,
        "updated_at": now,
    };

    if (existing.cost - cost).abs() > PRICE_HISTORY_THRESHOLD {
        record_price_change(state, org_id, id, PriceField::Cost, existing.cost, cost, now).await?;
        set.insert("last_cost", existing.cost);
    }
    if (existing.final_price - final_price).abs() > PRICE_HISTORY_THRESHOLD {
        record_price_change(
            state,
            org_id,
            id,
            PriceField::Price,
            existing.final_price,
            final_price,
            now,
        )
        .await?;
        set.insert("last_price", existing.final_price);
    }

    state
        .products
        .update_one(doc! { "_id": id, "org_id": org_id }, doc! { "$set": set })
        .await?;
    Ok(())
}

pub async fn delete_product(state: &AppState, org_id: &ObjectId, id: &ObjectId) -> Result<()> {
    state
        .products
        .delete_one(doc! { "_id": id, "org_id": org_id })
        .await?;
    Ok(())
}

pub async fn list_price_history(
    state: &AppState,
    org_id: &ObjectId,
    product_id: &ObjectId,
) -> Result<Vec<HistoricalPrice>> {
    let mut cursor = state
        .historical_prices
        .find(doc! { "org_id": org_id, "product_id": product_id })
        .sort(doc! { "recorded_at": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(entry) = cursor.try_next().await? {
        items.push(entry);
    }
    Ok(items)
}

async fn record_price_change(
    state: &AppState,
    org_id: &ObjectId,
    product_id: &ObjectId,
    field: PriceField,
    old_value: f64,
    new_value: f64,
    at: DateTime,
) -> Result<()> {
    state
        .historical_prices
        .insert_one(HistoricalPrice {
            id: None,
            org_id: *org_id,
            product_id: *product_id,
            field,
            old_value,
            new_value,
            recorded_at: at,
        })
        .await?;
    Ok(())
}

pub async fn list_supplies(state: &AppState, org_id: &ObjectId) -> Result<Vec<Supply>> {
    let mut cursor = state
        .supplies
        .find(doc! { "org_id": org_id })
        .sort(doc! { "name": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(supply) = cursor.try_next().await? {
        items.push(supply);
    }
    Ok(items)
}

pub async fn get_supply_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<Supply>> {
    state
        .supplies
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

pub async fn create_supply(
    state: &AppState,
    org_id: &ObjectId,
    name: &str,
    cost: f64,
    unit: &str,
    stock: f64,
    min_stock: f64,
) -> Result<ObjectId> {
    let res = state
        .supplies
        .insert_one(Supply {
            id: None,
            org_id: *org_id,
            name: name.to_string(),
            cost,
            unit: unit.to_string(),
            stock,
            min_stock,
            last_cost: None,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("supply insert missing _id")
}

pub async fn update_supply(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    name: &str,
    cost: f64,
    unit: &str,
    stock: f64,
    min_stock: f64,
) -> Result<()> {
    let existing = get_supply_by_id(state, org_id, id)
        .await?
        .context("insumo no encontrado")?;

    let mut set = doc! {
        "name": name,
        "cost": cost,
        "unit": unit,
        "stock": stock,
        "min_stock": min_stock,
        "updated_at": DateTime::from_system_time(SystemTime::now()),
    };
    if (existing.cost - cost).abs() > PRICE_HISTORY_THRESHOLD {
        set.insert("last_cost", existing.cost);
    }

    state
        .supplies
        .update_one(doc! { "_id": id, "org_id": org_id }, doc! { "$set": set })
        .await?;
    Ok(())
}

pub async fn delete_supply(state: &AppState, org_id: &ObjectId, id: &ObjectId) -> Result<()> {
    state
        .supplies
        .delete_one(doc! { "_id": id, "org_id": org_id })
        .await?;
    Ok(())
}

pub async fn list_providers(
    state: &AppState,
    org_id: &ObjectId,
    include_inactive: bool,
) -> Result<Vec<Provider>> {
    let filter = if include_inactive {
        doc! { "org_id": org_id }
    } else {
        doc! { "org_id": org_id, "active": true }
    };
    let mut cursor = state
        .providers
        .find(filter)
        .sort(doc! { "name": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(provider) = cursor.try_next().await? {
        items.push(provider);
    }
    Ok(items)
}

pub async fn get_provider_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<Provider>> {
    state
        .providers
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

pub async fn create_provider(
    state: &AppState,
    org_id: &ObjectId,
    name: &str,
    phone: Option<String>,
    email: Option<String>,
    notes: Option<String>,
) -> Result<ObjectId> {
    let res = state
        .providers
        .insert_one(Provider {
            id: None,
            org_id: *org_id,
            name: name.to_string(),
            phone,
            email,
            notes,
            active: true,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("provider insert missing _id")
}

pub async fn update_provider(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    name: &str,
    phone: Option<String>,
    email: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    state
        .providers
        .update_one(
            doc! { "_id": id, "org_id": org_id },
            doc! { "$set": {
                "name": name,
                "phone": phone,
                "email": email,
                "notes": notes,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}

/// Providers are never hard-deleted; history keeps pointing at them.
pub async fn deactivate_provider(state: &AppState, org_id: &ObjectId, id: &ObjectId) -> Result<()> {
    state
        .providers
        .update_one(
            doc! { "_id": id, "org_id": org_id },
            doc! { "$set": {
                "active": false,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}
