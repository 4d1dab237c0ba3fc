// stats.rs
// Pure aggregation over already-loaded records: per-session totals, the
// till-reconciliation difference, and monthly statistics over archived
// audits. No I/O here.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{CashAudit, CashSession, ExpenseCategory};

pub const NO_PROVIDER_LABEL: &str = "Sin proveedor";

/// Financial totals of a single cash session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionTotals {
    /// Opening cash + opening digital + every extra income entry.
    pub total_income: f64,
    pub total_sales: f64,
    /// Taken from the session's running aggregate, deliberately not recomputed
    /// from the individual sale fees.
    pub total_commissions: f64,
    pub net_sales: f64,
    pub total_other_expenses: f64,
    pub theoretical_balance: f64,
}

pub fn session_totals(session: &CashSession) -> SessionTotals {
    let other_income: f64 = session.incomes.iter().map(|i| i.amount).sum();
    let total_income = session.opening_cash + session.opening_digital + other_income;
    let total_sales: f64 = session.sales.iter().map(|s| s.amount).sum();
    let total_commissions = session.commissions_total;
    let net_sales = total_sales - total_commissions;
    let total_other_expenses: f64 = session.expenses.iter().map(|e| e.amount).sum();

    SessionTotals {
        total_income,
        total_sales,
        total_commissions,
        net_sales,
        total_other_expenses,
        theoretical_balance: total_income + net_sales - total_other_expenses,
    }
}

/// Reconciliation difference against the physically counted totals.
/// Positive = surplus, negative = shortage, zero = balanced.
pub fn difference(theoretical_balance: f64, physical_cash: f64, physical_digital: f64) -> f64 {
    (physical_cash + physical_digital) - theoretical_balance
}

/// One expense entry of the monthly flat list, tagged with the audit it came
/// from.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyExpense {
    pub audit_id: String,
    /// The audit's recorded day, formatted YYYY-MM-DD.
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub total_sales: f64,
    /// Summed from each archived sale's own commission field; this is a
    /// second, differently-sourced figure than the per-session aggregate.
    pub total_commissions: f64,
    pub total_expenses: f64,
    pub total_operating_expenses: f64,
    pub total_withdrawals: f64,
    pub by_category: BTreeMap<String, f64>,
    pub by_provider: BTreeMap<String, f64>,
    pub operating_profit: f64,
    pub net_profit: f64,
    /// Flat expense list for display, reverse-chronological.
    pub expenses: Vec<MonthlyExpense>,
}

/// Aggregate the audits of a period. Pure function of its inputs: re-running
/// it over the same audit set yields identical totals.
pub fn monthly_stats(audits: &[CashAudit]) -> MonthlyStats {
    let mut total_sales = 0.0;
    let mut total_commissions = 0.0;
    let mut total_expenses = 0.0;
    let mut total_operating_expenses = 0.0;
    let mut total_withdrawals = 0.0;
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_provider: BTreeMap<String, f64> = BTreeMap::new();
    let mut expenses = Vec::new();

    for audit in audits {
        total_sales += audit.total_sales;
        total_commissions += audit
            .session
            .sales
            .iter()
            .map(|s| s.commission)
            .sum::<f64>();

        let audit_id = audit.id.map(|id| id.to_hex()).unwrap_or_default();
        let date = audit.date.to_chrono().format("%Y-%m-%d").to_string();

        for entry in &audit.session.expenses {
            total_expenses += entry.amount;
            if entry.category.is_operating() {
                total_operating_expenses += entry.amount;
            } else {
                total_withdrawals += entry.amount;
            }

            *by_category
                .entry(entry.category.label().to_string())
                .or_insert(0.0) += entry.amount;

            let provider = entry
                .provider_name
                .clone()
                .unwrap_or_else(|| NO_PROVIDER_LABEL.to_string());
            *by_provider.entry(provider.clone()).or_insert(0.0) += entry.amount;

            expenses.push(MonthlyExpense {
                audit_id: audit_id.clone(),
                date: date.clone(),
                description: entry.description.clone(),
                amount: entry.amount,
                category: entry.category,
                provider,
            });
        }
    }

    expenses.sort_by(|a, b| b.date.cmp(&a.date));

    MonthlyStats {
        total_sales,
        total_commissions,
        total_expenses,
        total_operating_expenses,
        total_withdrawals,
        by_category,
        by_provider,
        operating_profit: total_sales - total_commissions - total_operating_expenses,
        net_profit: total_sales - total_commissions - total_expenses,
        expenses,
    }
}
