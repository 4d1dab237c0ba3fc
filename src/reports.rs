// reports.rs
// Builds the three-sheet daily spreadsheet for a closed session and names the
// stored file. Storage itself lives in state::files.

use anyhow::Result;
use mongodb::bson::DateTime;
use rust_xlsxwriter::{Format, Workbook};

use crate::models::CashAudit;
use crate::stats;

pub const REPORT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `arqueo-<YYYY-MM-DD>-<timestamp>.xlsx`; the timestamp keeps regenerated
/// reports under fresh names while the audit URL always points at the latest.
pub fn report_filename(audit: &CashAudit, generated_at: DateTime) -> String {
    format!(
        "arqueo-{}-{}.xlsx",
        audit.date.to_chrono().format("%Y-%m-%d"),
        generated_at.timestamp_millis()
    )
}

pub fn build_session_report(audit: &CashAudit) -> Result<Vec<u8>> {
    let session = &audit.session;
    let totals = stats::session_totals(session);
    let day = audit.date.to_chrono().format("%Y-%m-%d").to_string();

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    // Hoja 1: resumen financiero del día.
    let summary = workbook.add_worksheet();
    summary.set_name("Resumen")?;
    summary.write_string_with_format(0, 0, "Arqueo de caja", &bold)?;
    summary.write_string(1, 0, "Fecha")?;
    summary.write_string(1, 1, day.as_str())?;

    let rows: [(&str, f64); 11] = [
        ("Apertura efectivo", session.opening_cash),
        ("Apertura digital", session.opening_digital),
        (
            "Otros ingresos",
            totals.total_income - session.opening_cash - session.opening_digital,
        ),
        ("Ventas", totals.total_sales),
        ("Comisiones", totals.total_commissions),
        ("Ventas netas", totals.net_sales),
        ("Otros egresos", totals.total_other_expenses),
        ("Saldo teórico", totals.theoretical_balance),
        ("Efectivo contado", session.physical_cash.unwrap_or(0.0)),
        ("Digital contado", session.physical_digital.unwrap_or(0.0)),
        ("Diferencia", audit.difference),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = (i + 2) as u32;
        summary.write_string(row, 0, *label)?;
        summary.write_number_with_format(row, 1, *value, &money)?;
    }
    if let Some(notes) = &audit.notes {
        summary.write_string(14, 0, "Notas")?;
        summary.write_string(14, 1, notes.as_str())?;
    }
    summary.set_column_width(0, 24)?;
    summary.set_column_width(1, 16)?;

    // Hoja 2: detalle de ventas.
    let detail = workbook.add_worksheet();
    detail.set_name("Detalle de Ventas")?;
    let sale_headers = [
        "ID",
        "Hora",
        "Monto",
        "Forma de pago",
        "Comisión",
        "Descripción",
        "Crédito",
    ];
    for (col, header) in sale_headers.iter().enumerate() {
        detail.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    for (i, sale) in session.sales.iter().enumerate() {
        let row = (i + 1) as u32;
        detail.write_string(row, 0, sale.entry_id.to_hex())?;
        detail.write_string(row, 1, sale.at.to_chrono().format("%H:%M").to_string())?;
        detail.write_number_with_format(row, 2, sale.amount, &money)?;
        detail.write_string(row, 3, sale.method.label())?;
        detail.write_number_with_format(row, 4, sale.commission, &money)?;
        detail.write_string(row, 5, sale.description.as_deref().unwrap_or(""))?;
        detail.write_string(row, 6, if sale.is_credit { "Sí" } else { "No" })?;
    }
    detail.set_column_width(0, 26)?;
    detail.set_column_width(5, 32)?;

    // Hoja 3: movimientos de ingreso/egreso con monto con signo.
    let movements = workbook.add_worksheet();
    movements.set_name("Otros Movimientos")?;
    let movement_headers = ["Tipo", "Descripción", "Monto", "Categoría", "Proveedor"];
    for (col, header) in movement_headers.iter().enumerate() {
        movements.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    let mut row = 1u32;
    for income in &session.incomes {
        movements.write_string(row, 0, "INGRESO")?;
        movements.write_string(row, 1, income.description.as_str())?;
        movements.write_number_with_format(row, 2, income.amount, &money)?;
        row += 1;
    }
    for expense in &session.expenses {
        movements.write_string(row, 0, "EGRESO")?;
        movements.write_string(row, 1, expense.description.as_str())?;
        movements.write_number_with_format(row, 2, -expense.amount, &money)?;
        movements.write_string(row, 3, expense.category.label())?;
        movements.write_string(
            row,
            4,
            expense
                .provider_name
                .as_deref()
                .unwrap_or(stats::NO_PROVIDER_LABEL),
        )?;
        row += 1;
    }
    movements.set_column_width(1, 32)?;

    Ok(workbook.save_to_buffer()?)
}
