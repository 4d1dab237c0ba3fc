use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveTime};
use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId, to_bson};
use std::time::SystemTime;

use crate::models::{
    CashAudit, CashSession, ExpenseCategory, ExpenseEntry, IncomeEntry, PaymentMethod, Sale,
    SessionStatus,
};
use crate::stats;

use super::AppState;

/// Midnight UTC of the given day, the canonical day key for sessions and
/// audits.
pub fn day_start(date: NaiveDate) -> DateTime {
    DateTime::from_chrono(date.and_time(NaiveTime::MIN).and_utc())
}

pub async fn current_open_session(
    state: &AppState,
    org_id: &ObjectId,
) -> Result<Option<CashSession>> {
    state
        .cash_sessions
        .find_one(doc! { "org_id": org_id, "status": SessionStatus::Open.as_str() })
        .await
        .map_err(Into::into)
}

pub async fn get_session_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<CashSession>> {
    state
        .cash_sessions
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

/// Open the day's session. At most one session may be OPEN per tenant; the
/// check lives here, not in a database constraint.
pub async fn open_session(
    state: &AppState,
    org_id: &ObjectId,
    date: NaiveDate,
    opening_cash: f64,
    opening_digital: f64,
    notes: Option<String>,
) -> Result<ObjectId> {
    if current_open_session(state, org_id).await?.is_some() {
        bail!("Ya existe una caja abierta");
    }

    let res = state
        .cash_sessions
        .insert_one(CashSession {
            id: None,
            org_id: *org_id,
            date: day_start(date),
            status: SessionStatus::Open,
            opening_cash,
            opening_digital,
            incomes: Vec::new(),
            sales: Vec::new(),
            expenses: Vec::new(),
            commissions_total: 0.0,
            physical_cash: None,
            physical_digital: None,
            difference: None,
            notes,
            report_url: None,
            version: 0,
            created_at: Some(DateTime::from_system_time(SystemTime::now())),
            updated_at: None,
            closed_at: None,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .context("cash session insert missing _id")
}

/// Append a sale. The commission fee is pushed into the line item and added
/// to the running aggregate in the same patch, so the two figures only
/// diverge if some other writer touches one of them.
pub async fn add_sale(
    state: &AppState,
    org_id: &ObjectId,
    session_id: &ObjectId,
    amount: f64,
    method: PaymentMethod,
    commission: f64,
    is_credit: bool,
    description: Option<String>,
) -> Result<ObjectId> {
    let now = DateTime::from_system_time(SystemTime::now());
    let sale = Sale {
        entry_id: ObjectId::new(),
        amount,
        method,
        commission,
        is_credit,
        description,
        at: now,
    };

    let res = state
        .cash_sessions
        .update_one(
            doc! { "_id": session_id, "org_id": org_id, "status": SessionStatus::Open.as_str() },
            doc! {
                "$push": { "sales": to_bson(&sale)? },
                "$inc": { "commissions_total": commission, "version": 1 },
                "$set": { "updated_at": now },
            },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("No hay caja abierta para registrar la venta");
    }
    Ok(sale.entry_id)
}

pub async fn add_income(
    state: &AppState,
    org_id: &ObjectId,
    session_id: &ObjectId,
    description: &str,
    amount: f64,
) -> Result<ObjectId> {
    let now = DateTime::from_system_time(SystemTime::now());
    let entry = IncomeEntry {
        entry_id: ObjectId::new(),
        description: description.to_string(),
        amount,
        at: now,
    };

    let res = state
        .cash_sessions
        .update_one(
            doc! { "_id": session_id, "org_id": org_id, "status": SessionStatus::Open.as_str() },
            doc! {
                "$push": { "incomes": to_bson(&entry)? },
                "$inc": { "version": 1 },
                "$set": { "updated_at": now },
            },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("No hay caja abierta para registrar el ingreso");
    }
    Ok(entry.entry_id)
}

pub async fn add_expense(
    state: &AppState,
    org_id: &ObjectId,
    session_id: &ObjectId,
    description: &str,
    amount: f64,
    category: ExpenseCategory,
    provider_id: Option<ObjectId>,
    provider_name: Option<String>,
) -> Result<ObjectId> {
    let now = DateTime::from_system_time(SystemTime::now());
    let entry = ExpenseEntry {
        entry_id: ObjectId::new(),
        description: description.to_string(),
        amount,
        category,
        provider_id,
        provider_name,
        at: now,
    };

    let res = state
        .cash_sessions
        .update_one(
            doc! { "_id": session_id, "org_id": org_id, "status": SessionStatus::Open.as_str() },
            doc! {
                "$push": { "expenses": to_bson(&entry)? },
                "$inc": { "version": 1 },
                "$set": { "updated_at": now },
            },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("No hay caja abierta para registrar el egreso");
    }
    Ok(entry.entry_id)
}

pub async fn update_opening_balances(
    state: &AppState,
    org_id: &ObjectId,
    session_id: &ObjectId,
    opening_cash: f64,
    opening_digital: f64,
) -> Result<()> {
    let res = state
        .cash_sessions
        .update_one(
            doc! { "_id": session_id, "org_id": org_id, "status": SessionStatus::Open.as_str() },
            doc! {
                "$set": {
                    "opening_cash": opening_cash,
                    "opening_digital": opening_digital,
                    "updated_at": DateTime::from_system_time(SystemTime::now()),
                },
                "$inc": { "version": 1 },
            },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("No hay caja abierta");
    }
    Ok(())
}

/// Close the session against the operator's physical counts and archive the
/// immutable audit snapshot. Returns the closed snapshot and the audit id.
pub async fn close_session(
    state: &AppState,
    org_id: &ObjectId,
    session_id: &ObjectId,
    physical_cash: f64,
    physical_digital: f64,
    notes: Option<String>,
) -> Result<(CashSession, ObjectId)> {
    let session = get_session_by_id(state, org_id, session_id)
        .await?
        .context("caja no encontrada")?;
    if session.status != SessionStatus::Open {
        bail!("La caja ya está cerrada");
    }

    let totals = stats::session_totals(&session);
    let difference = stats::difference(totals.theoretical_balance, physical_cash, physical_digital);
    let now = DateTime::from_system_time(SystemTime::now());

    let res = state
        .cash_sessions
        .update_one(
            doc! { "_id": session_id, "org_id": org_id, "status": SessionStatus::Open.as_str() },
            doc! {
                "$set": {
                    "status": SessionStatus::Closed.as_str(),
                    "physical_cash": physical_cash,
                    "physical_digital": physical_digital,
                    "difference": difference,
                    "notes": notes.clone(),
                    "closed_at": now,
                    "updated_at": now,
                },
                "$inc": { "version": 1 },
            },
        )
        .await?;
    if res.matched_count == 0 {
        bail!("La caja ya está cerrada");
    }

    let closed = get_session_by_id(state, org_id, session_id)
        .await?
        .context("caja cerrada desapareció")?;

    let audit = CashAudit {
        id: None,
        org_id: *org_id,
        date: closed.date,
        session: closed.clone(),
        total_sales: totals.total_sales,
        difference,
        report_url: None,
        notes,
        created_at: Some(now),
    };
    let res = state.cash_audits.insert_one(audit).await?;
    let audit_id = res
        .inserted_id
        .as_object_id()
        .context("cash audit insert missing _id")?;

    Ok((closed, audit_id))
}

/// Audits whose day falls inside the inclusive calendar range, newest first.
pub async fn list_audits(
    state: &AppState,
    org_id: &ObjectId,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CashAudit>> {
    let mut cursor = state
        .cash_audits
        .find(doc! {
            "org_id": org_id,
            "date": { "$gte": day_start(start), "$lte": day_start(end) },
        })
        .sort(doc! { "date": -1 })
        .await?;
    let mut audits = Vec::new();
    while let Some(audit) = cursor.try_next().await? {
        audits.push(audit);
    }
    Ok(audits)
}

pub async fn get_audit_by_id(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
) -> Result<Option<CashAudit>> {
    state
        .cash_audits
        .find_one(doc! { "_id": id, "org_id": org_id })
        .await
        .map_err(Into::into)
}

/// Explicit edit of an archived audit: only date and notes are touchable.
pub async fn update_audit(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> Result<()> {
    let mut set = doc! {};
    if let Some(date) = date {
        set.insert("date", day_start(date));
    }
    if let Some(notes) = notes {
        set.insert("notes", notes);
    }
    if set.is_empty() {
        return Ok(());
    }
    state
        .cash_audits
        .update_one(doc! { "_id": id, "org_id": org_id }, doc! { "$set": set })
        .await?;
    Ok(())
}

pub async fn set_audit_report_url(
    state: &AppState,
    org_id: &ObjectId,
    id: &ObjectId,
    url: &str,
) -> Result<()> {
    state
        .cash_audits
        .update_one(
            doc! { "_id": id, "org_id": org_id },
            doc! { "$set": { "report_url": url } },
        )
        .await?;
    // Mirror onto the closed session record so the day view links it too.
    if let Some(audit) = get_audit_by_id(state, org_id, id).await? {
        if let Some(session_id) = audit.session.id {
            let _ = state
                .cash_sessions
                .update_one(
                    doc! { "_id": session_id, "org_id": org_id },
                    doc! { "$set": { "report_url": url } },
                )
                .await;
        }
    }
    Ok(())
}

pub async fn delete_audit(state: &AppState, org_id: &ObjectId, id: &ObjectId) -> Result<()> {
    state
        .cash_audits
        .delete_one(doc! { "_id": id, "org_id": org_id })
        .await?;
    Ok(())
}
