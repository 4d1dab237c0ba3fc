// Spreadsheet builder tests: deterministic filename and a well-formed xlsx
// buffer. No database required.

use chrono::NaiveDate;
use mongodb::bson::{DateTime, oid::ObjectId};

use commerceos::models::{
    CashAudit, CashSession, ExpenseCategory, ExpenseEntry, IncomeEntry, PaymentMethod, Sale,
    SessionStatus,
};
use commerceos::reports::{build_session_report, report_filename};
use commerceos::state::day_start;

fn sample_audit() -> CashAudit {
    let date = day_start(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    let session = CashSession {
        id: Some(ObjectId::new()),
        org_id: ObjectId::new(),
        date,
        status: SessionStatus::Closed,
        opening_cash: 1000.0,
        opening_digital: 0.0,
        incomes: vec![IncomeEntry {
            entry_id: ObjectId::new(),
            description: "Aporte".to_string(),
            amount: 50.0,
            at: DateTime::now(),
        }],
        sales: vec![Sale {
            entry_id: ObjectId::new(),
            amount: 500.0,
            method: PaymentMethod::Credit,
            commission: 50.0,
            is_credit: true,
            description: Some("Pedido grande".to_string()),
            at: DateTime::now(),
        }],
        expenses: vec![ExpenseEntry {
            entry_id: ObjectId::new(),
            description: "Mercadería".to_string(),
            amount: 200.0,
            category: ExpenseCategory::Business,
            provider_id: None,
            provider_name: Some("Distribuidora Norte".to_string()),
            at: DateTime::now(),
        }],
        commissions_total: 50.0,
        physical_cash: Some(1300.0),
        physical_digital: Some(0.0),
        difference: Some(0.0),
        notes: Some("Cierre normal".to_string()),
        report_url: None,
        version: 4,
        created_at: Some(DateTime::now()),
        updated_at: None,
        closed_at: Some(DateTime::now()),
    };
    CashAudit {
        id: Some(ObjectId::new()),
        org_id: session.org_id,
        date,
        total_sales: 500.0,
        difference: 0.0,
        report_url: None,
        notes: Some("Cierre normal".to_string()),
        created_at: Some(DateTime::now()),
        session,
    }
}

#[test]
fn filename_embeds_the_audit_day_and_extension() {
    let audit = sample_audit();
    let generated = DateTime::now();
    let filename = report_filename(&audit, generated);

    assert!(filename.starts_with("arqueo-2024-03-05-"), "{filename}");
    assert!(filename.ends_with(".xlsx"), "{filename}");
    assert!(filename.contains(&generated.timestamp_millis().to_string()));
}

#[test]
fn regenerated_filenames_differ_by_timestamp() {
    let audit = sample_audit();
    let first = report_filename(&audit, DateTime::from_millis(1_700_000_000_000));
    let second = report_filename(&audit, DateTime::from_millis(1_700_000_100_000));
    assert_ne!(first, second);
}

#[test]
fn report_buffer_is_a_nonempty_zip_container() {
    let audit = sample_audit();
    let bytes = build_session_report(&audit).expect("report build failed");

    // xlsx is a zip container: PK magic at offset 0.
    assert!(bytes.len() > 500);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn report_builds_for_an_empty_day() {
    let mut audit = sample_audit();
    audit.session.sales.clear();
    audit.session.incomes.clear();
    audit.session.expenses.clear();
    audit.session.commissions_total = 0.0;
    audit.total_sales = 0.0;

    let bytes = build_session_report(&audit).expect("empty-day report build failed");
    assert_eq!(&bytes[..2], b"PK");
}
