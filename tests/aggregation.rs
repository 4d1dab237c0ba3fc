// Pure aggregation-engine tests: per-session totals, reconciliation
// difference, monthly statistics. No database required.

use chrono::NaiveDate;
use mongodb::bson::{DateTime, oid::ObjectId};

use commerceos::models::{
    CashAudit, CashSession, ExpenseCategory, ExpenseEntry, IncomeEntry, OrgSettings,
    PaymentMethod, Sale, SessionStatus,
};
use commerceos::state::day_start;
use commerceos::stats::{NO_PROVIDER_LABEL, difference, monthly_stats, session_totals};

fn day(y: i32, m: u32, d: u32) -> DateTime {
    day_start(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn sale(amount: f64, method: PaymentMethod, commission: f64) -> Sale {
    Sale {
        entry_id: ObjectId::new(),
        amount,
        method,
        commission,
        is_credit: false,
        description: None,
        at: DateTime::now(),
    }
}

fn expense(
    description: &str,
    amount: f64,
    category: ExpenseCategory,
    provider_name: Option<&str>,
) -> ExpenseEntry {
    ExpenseEntry {
        entry_id: ObjectId::new(),
        description: description.to_string(),
        amount,
        category,
        provider_id: None,
        provider_name: provider_name.map(str::to_string),
        at: DateTime::now(),
    }
}

fn session(
    date: DateTime,
    opening_cash: f64,
    opening_digital: f64,
    sales: Vec<Sale>,
    incomes: Vec<IncomeEntry>,
    expenses: Vec<ExpenseEntry>,
    commissions_total: f64,
) -> CashSession {
    CashSession {
        id: Some(ObjectId::new()),
        org_id: ObjectId::new(),
        date,
        status: SessionStatus::Closed,
        opening_cash,
        opening_digital,
        incomes,
        sales,
        expenses,
        commissions_total,
        physical_cash: None,
        physical_digital: None,
        difference: None,
        notes: None,
        report_url: None,
        version: 1,
        created_at: Some(DateTime::now()),
        updated_at: None,
        closed_at: Some(DateTime::now()),
    }
}

fn audit(session: CashSession, total_sales: f64, diff: f64) -> CashAudit {
    CashAudit {
        id: Some(ObjectId::new()),
        org_id: session.org_id,
        date: session.date,
        total_sales,
        difference: diff,
        report_url: None,
        notes: None,
        created_at: Some(DateTime::now()),
        session,
    }
}

#[test]
fn theoretical_balance_follows_the_formula() {
    // Apertura 1000/0, una venta de 500 en efectivo sin comisión y un gasto
    // de 200: saldo teórico 1300, conteo físico exacto -> diferencia 0.
    let s = session(
        day(2024, 3, 5),
        1000.0,
        0.0,
        vec![sale(500.0, PaymentMethod::Cash, 0.0)],
        vec![],
        vec![expense("Mercadería", 200.0, ExpenseCategory::Business, None)],
        0.0,
    );

    let totals = session_totals(&s);
    assert_eq!(totals.total_income, 1000.0);
    assert_eq!(totals.total_sales, 500.0);
    assert_eq!(totals.net_sales, 500.0);
    assert_eq!(totals.total_other_expenses, 200.0);
    assert_eq!(totals.theoretical_balance, 1300.0);

    assert_eq!(difference(totals.theoretical_balance, 1300.0, 0.0), 0.0);
}

#[test]
fn extra_income_and_commissions_enter_the_balance() {
    let s = session(
        day(2024, 3, 6),
        500.0,
        250.0,
        vec![
            sale(1000.0, PaymentMethod::Credit, 100.0),
            sale(200.0, PaymentMethod::Cash, 0.0),
        ],
        vec![IncomeEntry {
            entry_id: ObjectId::new(),
            description: "Aporte del dueño".to_string(),
            amount: 50.0,
            at: DateTime::now(),
        }],
        vec![expense("Retiro", 300.0, ExpenseCategory::Personal, None)],
        100.0,
    );

    let totals = session_totals(&s);
    assert_eq!(totals.total_income, 800.0);
    assert_eq!(totals.total_sales, 1200.0);
    assert_eq!(totals.total_commissions, 100.0);
    assert_eq!(totals.net_sales, 1100.0);
    assert_eq!(totals.theoretical_balance, 800.0 + 1100.0 - 300.0);

    // Faltante: se contó menos de lo esperado.
    let diff = difference(totals.theoretical_balance, 1000.0, 500.0);
    assert!(diff < 0.0);
    assert_eq!(diff, 1500.0 - 1600.0);
}

#[test]
fn monthly_stats_scenario_with_withdrawal() {
    // Dos arqueos: ventas 1000 y 2000, comisiones por venta 50 y 100, un
    // gasto Personal de 300 en el primero.
    let first = session(
        day(2024, 4, 1),
        0.0,
        0.0,
        vec![sale(1000.0, PaymentMethod::Qr, 50.0)],
        vec![],
        vec![expense("Retiro socio", 300.0, ExpenseCategory::Personal, None)],
        50.0,
    );
    let second = session(
        day(2024, 4, 2),
        0.0,
        0.0,
        vec![sale(2000.0, PaymentMethod::Debit, 100.0)],
        vec![],
        vec![],
        100.0,
    );

    let stats = monthly_stats(&[audit(first, 1000.0, 0.0), audit(second, 2000.0, 0.0)]);

    assert_eq!(stats.total_sales, 3000.0);
    assert_eq!(stats.total_commissions, 150.0);
    assert_eq!(stats.total_expenses, 300.0);
    assert_eq!(stats.total_operating_expenses, 0.0);
    assert_eq!(stats.total_withdrawals, 300.0);
    assert_eq!(stats.operating_profit, 2850.0);
    assert_eq!(stats.net_profit, 2550.0);
    assert_eq!(stats.by_category.get("Personal"), Some(&300.0));
    assert_eq!(stats.by_provider.get(NO_PROVIDER_LABEL), Some(&300.0));
}

#[test]
fn operating_profit_never_exceeds_net_profit_without_withdrawals() {
    let s = session(
        day(2024, 5, 10),
        0.0,
        0.0,
        vec![sale(900.0, PaymentMethod::Cash, 0.0)],
        vec![],
        vec![
            expense("Flete", 120.0, ExpenseCategory::Purchases, Some("Transportes Sur")),
            expense("Heladera", 200.0, ExpenseCategory::Investments, None),
        ],
        0.0,
    );
    let stats = monthly_stats(&[audit(s, 900.0, 0.0)]);

    // Sin retiros ambos resultados coinciden.
    assert_eq!(stats.total_withdrawals, 0.0);
    assert_eq!(stats.operating_profit, stats.net_profit);
    assert_eq!(stats.by_provider.get("Transportes Sur"), Some(&120.0));
}

#[test]
fn operating_profit_stays_below_net_profit_with_withdrawals() {
    let s = session(
        day(2024, 5, 11),
        0.0,
        0.0,
        vec![sale(500.0, PaymentMethod::Cash, 0.0)],
        vec![],
        vec![
            expense("Proveedor", 100.0, ExpenseCategory::Business, None),
            expense("Retiro", 50.0, ExpenseCategory::Personal, None),
        ],
        0.0,
    );
    let stats = monthly_stats(&[audit(s, 500.0, 0.0)]);

    // Los retiros se excluyen del resultado operativo pero sí restan en el
    // neto, así que el neto queda por debajo exactamente en ese monto.
    assert!(stats.net_profit < stats.operating_profit);
    assert_eq!(stats.operating_profit, stats.net_profit + stats.total_withdrawals);
    assert_eq!(stats.total_operating_expenses, 100.0);
    assert_eq!(stats.total_withdrawals, 50.0);
}

#[test]
fn monthly_stats_is_idempotent_and_sorted_newest_first() {
    let older = session(
        day(2024, 6, 3),
        0.0,
        0.0,
        vec![],
        vec![],
        vec![expense("Gasto viejo", 10.0, ExpenseCategory::Other, None)],
        0.0,
    );
    let newer = session(
        day(2024, 6, 20),
        0.0,
        0.0,
        vec![],
        vec![],
        vec![expense("Gasto nuevo", 20.0, ExpenseCategory::Other, None)],
        0.0,
    );
    let audits = [audit(older, 0.0, 0.0), audit(newer, 0.0, 0.0)];

    let first_run = monthly_stats(&audits);
    let second_run = monthly_stats(&audits);
    assert_eq!(first_run.total_expenses, second_run.total_expenses);
    assert_eq!(first_run.expenses.len(), second_run.expenses.len());

    assert_eq!(first_run.expenses[0].description, "Gasto nuevo");
    assert_eq!(first_run.expenses[0].date, "2024-06-20");
    assert_eq!(first_run.expenses[1].date, "2024-06-03");
    assert!(!first_run.expenses[0].audit_id.is_empty());
}

#[test]
fn commission_rates_apply_only_to_card_like_methods() {
    let settings = OrgSettings {
        commission_qr: 2.0,
        commission_debit: 3.0,
        commission_credit: 10.0,
        ..OrgSettings::default()
    };

    assert_eq!(settings.commission_for(PaymentMethod::Cash, 500.0), 0.0);
    assert_eq!(settings.commission_for(PaymentMethod::Transfer, 500.0), 0.0);
    assert_eq!(settings.commission_for(PaymentMethod::Qr, 500.0), 10.0);
    assert_eq!(settings.commission_for(PaymentMethod::Debit, 500.0), 15.0);
    assert_eq!(settings.commission_for(PaymentMethod::Credit, 500.0), 50.0);
}

#[test]
fn org_settings_deserialize_with_defaults_and_migrate() {
    let parsed: OrgSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed, OrgSettings::default());

    let old: OrgSettings = serde_json::from_str(r#"{ "version": 1, "commission_qr": 5.0 }"#).unwrap();
    assert_eq!(old.version, 1);
    let migrated = old.migrate();
    assert_eq!(migrated.version, commerceos::models::ORG_SETTINGS_VERSION);
    assert_eq!(migrated.commission_qr, 5.0);
    assert!(migrated.low_stock_alerts);
}
