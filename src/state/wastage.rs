use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::WastageRecord;

use super::{AppState, cash::day_start};

pub async fn create_wastage_record(
    state: &AppState,
    org_id: &ObjectId,
    product_name: &str,
    quantity: f64,
    unit_cost: f64,
    reason: &str,
    date: NaiveDate,
) -> Result<ObjectId> {
    let res = state
        .wastage
        .insert_one(WastageRecord {
            id: None,
            org_id: *org_id,
            product_name: product_name.to_string(),
            quantity,
            unit_cost,
            reason: reason.to_string(),
            date: day_start(date),
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("wastage insert missing _id")
}

/// Records inside the inclusive day range, newest first.
pub async fn list_wastage_records(
    state: &AppState,
    org_id: &ObjectId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<WastageRecord>> {
    let mut cursor = state
        .wastage
        .find(doc! {
            "org_id": org_id,
            "date": { "$gte": day_start(start), "$lte": day_start(end) },
        })
        .sort(doc! { "date": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(record) = cursor.try_next().await? {
        items.push(record);
    }
    Ok(items)
}

pub async fn delete_wastage_record(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<()> {
    state
        .wastage
        .delete_one(doc! { "_id": id, "org_id": org_id })
        .await?;
    Ok(())
}
