use anyhow::{Context, Result};
use mongodb::bson::{DateTime, doc, oid::ObjectId, to_bson};
use slug::slugify;
use std::time::SystemTime;

use crate::models::{CashSession, Organization, OrgSettings, SessionStatus, UserOrganization, UserRole};

use super::{AppState, cash::day_start};

pub async fn get_org_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Organization>> {
    state
        .orgs
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Create a tenant: organization + admin membership for the owner + a
/// baseline OPEN session for today. This is the one multi-document write the
/// system runs inside a transaction; on deployments without transaction
/// support (standalone mongod) it degrades to sequential writes.
pub async fn create_organization(
    state: &AppState,
    name: &str,
    notes: Option<String>,
    owner_id: &ObjectId,
) -> Result<ObjectId> {
    let org_id = ObjectId::new();
    let now = DateTime::from_system_time(SystemTime::now());
    let today = chrono::Utc::now().date_naive();

    let org = Organization {
        id: Some(org_id),
        name: name.to_string(),
        slug: slugify(name),
        logo_url: None,
        settings: OrgSettings::default(),
        is_active: true,
        created_at: Some(now),
        updated_at: None,
        notes,
    };
    let membership = UserOrganization {
        id: None,
        user_id: *owner_id,
        org_id,
        role: UserRole::Admin,
    };
    let baseline = CashSession {
        id: None,
        org_id,
        date: day_start(today),
        status: SessionStatus::Open,
        opening_cash: 0.0,
        opening_digital: 0.0,
        incomes: Vec::new(),
        sales: Vec::new(),
        expenses: Vec::new(),
        commissions_total: 0.0,
        physical_cash: None,
        physical_digital: None,
        difference: None,
        notes: None,
        report_url: None,
        version: 0,
        created_at: Some(now),
        updated_at: None,
        closed_at: None,
    };

    match create_organization_txn(state, &org, &membership, &baseline).await {
        Ok(()) => Ok(org_id),
        Err(err) if transactions_unsupported(&err) => {
            tracing::warn!(
                "transactions unsupported by the MongoDB deployment; creating tenant sequentially"
            );
            state.orgs.insert_one(&org).await?;
            state.user_orgs.insert_one(&membership).await?;
            state.cash_sessions.insert_one(&baseline).await?;
            Ok(org_id)
        }
        Err(err) => Err(err.into()),
    }
}

async fn create_organization_txn(
    state: &AppState,
    org: &Organization,
    membership: &UserOrganization,
    baseline: &CashSession,
) -> Result<(), mongodb::error::Error> {
    let mut session = state.client.start_session().await?;
    session.start_transaction().await?;

    let outcome: Result<(), mongodb::error::Error> = async {
        state.orgs.insert_one(org).session(&mut session).await?;
        state
            .user_orgs
            .insert_one(membership)
            .session(&mut session)
            .await?;
        state
            .cash_sessions
            .insert_one(baseline)
            .session(&mut session)
            .await?;
        Ok(())
    }
    .await;

    match outcome {
        Ok(()) => session.commit_transaction().await,
        Err(err) => {
            let _ = session.abort_transaction().await;
            Err(err)
        }
    }
}

fn transactions_unsupported(err: &mongodb::error::Error) -> bool {
    let msg = err.to_string();
    msg.contains("Transaction numbers")
        || msg.contains("does not support transactions")
        || msg.contains("Transactions are not supported")
}

pub async fn update_organization(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    is_active: bool,
    notes: Option<String>,
) -> Result<()> {
    state
        .orgs
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "slug": slugify(name),
                "is_active": is_active,
                "notes": notes,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}

/// Settings as stored, upgraded to the current version on the way out.
pub async fn get_org_settings(state: &AppState, org_id: &ObjectId) -> Result<OrgSettings> {
    let org = state
        .orgs
        .find_one(doc! { "_id": org_id })
        .await?
        .context("organización no encontrada")?;
    Ok(org.settings.migrate())
}

pub async fn update_org_settings(
    state: &AppState,
    org_id: &ObjectId,
    settings: &OrgSettings,
) -> Result<()> {
    let stamped = settings.clone().migrate();
    state
        .orgs
        .update_one(
            doc! { "_id": org_id },
            doc! { "$set": {
                "settings": to_bson(&stamped)?,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}

pub async fn set_org_logo(state: &AppState, org_id: &ObjectId, url: &str) -> Result<()> {
    state
        .orgs
        .update_one(
            doc! { "_id": org_id },
            doc! { "$set": {
                "logo_url": url,
                "updated_at": DateTime::from_system_time(SystemTime::now()),
            } },
        )
        .await?;
    Ok(())
}
