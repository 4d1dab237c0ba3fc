use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use std::time::SystemTime;

use crate::models::{Commitment, CommitmentStatus};

use super::{AppState, cash::day_start};

pub async fn list_commitments(
    state: &AppState,
    org_id: &ObjectId,
    status: Option<CommitmentStatus>,
) -> Result<Vec<Commitment>> {
    let filter = match status {
        Some(status) => doc! { "org_id": org_id, "status": status.as_str() },
        None => doc! { "org_id": org_id },
    };
    let mut cursor = state
        .commitments
        .find(filter)
        .sort(doc! { "due_date": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(commitment) = cursor.try_next().await? {
        items.push(commitment);
    }
    Ok(items)
}

pub async fn get_commitment_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<Commitment>> {
    state
        .commitments
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

pub async fn create_commitment(
    state: &AppState,
    org_id: &ObjectId,
    description: &str,
    amount: f64,
    due_date: NaiveDate,
    provider_id: Option<ObjectId>,
    notes: Option<String>,
) -> Result<ObjectId> {
    let res = state
        .commitments
        .insert_one(Commitment {
            id: None,
            org_id: *org_id,
            description: description.to_string(),
            amount,
            due_date: day_start(due_date),
            provider_id,
            status: CommitmentStatus::Pending,
            paid_at: None,
            notes,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("commitment insert missing _id")
}

/// Paid commitments are frozen; only pending ones accept edits.
pub async fn update_commitment(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    description: &str,
    amount: f64,
    due_date: NaiveDate,
    provider_id: Option<ObjectId>,
    notes: Option<String>,
) -> Result<()> {
    let res = state
        .commitments
        .update_one(
            doc! { "_id": id, "org_id": org_id, "status": CommitmentStatus::Pending.as_str() },
            doc! { "$set": {
                "description": description,
                "amount": amount,
                "due_date": day_start(due_date),
                "provider_id": provider_id,
                "notes": notes,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("El compromiso ya fue pagado");
    }
    Ok(())
}

/// PENDING → PAID, exactly once. The status guard in the filter makes the
/// transition race-safe: a second caller matches nothing.
pub async fn mark_commitment_paid(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<()> {
    let now = DateTime::from_system_time(SystemTime::now());
    let res = state
        .commitments
        .update_one(
            doc! { "_id": id, "org_id": org_id, "status": CommitmentStatus::Pending.as_str() },
            doc! { "$set": {
                "status": CommitmentStatus::Paid.as_str(),
                "paid_at": now,
                "updated_at": now,
            } },
        )
        .await?;
    if res.modified_count == 0 {
        bail!("El compromiso ya fue pagado");
    }
    Ok(())
}

pub async fn delete_commitment(state: &AppState, org_id: &ObjectId, id: &ObjectId) -> Result<()> {
    state
        .commitments
        .delete_one(doc! { "_id": id, "org_id": org_id })
        .await?;
    Ok(())
}
