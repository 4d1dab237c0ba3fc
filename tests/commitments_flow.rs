// Commitment lifecycle against a real MongoDB: PENDING → PAID exactly once,
// frozen after payment, and the expense-first payment ordering.

#[path = "common/mod.rs"]
mod common;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use commerceos::models::{CommitmentStatus, ExpenseCategory};
use commerceos::state::{
    AppState, add_expense, create_commitment, create_organization, create_provider, create_user,
    current_open_session, delete_commitment, get_commitment_by_id, get_session_by_id,
    list_commitments, mark_commitment_paid, update_commitment,
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
async fn commitment_transitions_to_paid_exactly_once() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "compromisos@example.com", "Café Norte").await;

    let due = Utc::now().date_naive();
    let provider = create_provider(&state, &org, "Proveedor Luz", None, None, None)
        .await
        .unwrap();
    let id = create_commitment(
        &state,
        &org,
        "Factura de luz",
        350.0,
        due,
        Some(provider),
        None,
    )
    .await
    .unwrap();

    let pending = list_commitments(&state, &org, Some(CommitmentStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].paid_at.is_none());

    // Pending commitments accept edits.
    update_commitment(
        &state,
        &org,
        &id,
        "Factura de luz marzo",
        380.0,
        due,
        Some(provider),
        None,
    )
    .await
    .unwrap();

    mark_commitment_paid(&state, &org, &id).await.unwrap();
    let paid = get_commitment_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(paid.status, CommitmentStatus::Paid);
    let paid_at = paid.paid_at.expect("paid_at set on payment");

    // Terminal: a second payment fails and the timestamp stays put.
    assert!(mark_commitment_paid(&state, &org, &id).await.is_err());
    let still_paid = get_commitment_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(still_paid.paid_at, Some(paid_at));

    // Paid commitments are frozen.
    assert!(
        update_commitment(&state, &org, &id, "Otro", 1.0, due, None, None)
            .await
            .is_err()
    );

    delete_commitment(&state, &org, &id).await.unwrap();
    assert!(get_commitment_by_id(&state, &org, &id).await.unwrap().is_none());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn paying_with_cash_posts_the_expense_before_the_status_flip() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = ctx.state.clone();
    let org = bootstrap_tenant(&state, "pago-caja@example.com", "Café Sur").await;

    let due = Utc::now().date_naive();
    let id = create_commitment(&state, &org, "Alquiler", 900.0, due, None, None)
        .await
        .unwrap();

    // Same ordering the handler uses: expense first, status flip second.
    let session = current_open_session(&state, &org).await.unwrap().unwrap();
    let session_id = session.id.unwrap();
    add_expense(
        &state,
        &org,
        &session_id,
        "Pago compromiso: Alquiler",
        900.0,
        ExpenseCategory::Business,
        None,
        None,
    )
    .await
    .unwrap();
    mark_commitment_paid(&state, &org, &id).await.unwrap();

    let session = get_session_by_id(&state, &org, &session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.expenses.len(), 1);
    assert_eq!(session.expenses[0].amount, 900.0);
    assert_eq!(session.expenses[0].category, ExpenseCategory::Business);

    let paid = get_commitment_by_id(&state, &org, &id).await.unwrap().unwrap();
    assert_eq!(paid.status, CommitmentStatus::Paid);

    common::teardown(Some(ctx)).await;
}
