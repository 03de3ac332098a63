//! Turns raw billing transactions into one [`ProcedureRecord`] per
//! procedure, summing financials and collecting the payment timeline.

use crate::record::{PaymentEvent, ProcedureRecord};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One transaction line as exported by the practice-management system.
/// Every field except the procedure id may be blank.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    pub procedure_id: String,
    #[serde(default)]
    pub chart_number: Option<i64>,
    #[serde(default)]
    pub date_of_service: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_deposit: Option<NaiveDate>,
    #[serde(default)]
    pub type_code: Option<String>,
    #[serde(default)]
    pub surgery_type: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub billing_subcategory: Option<String>,
    #[serde(default)]
    pub charges: f64,
    #[serde(default)]
    pub total_payments: f64,
    #[serde(default)]
    pub adjustments: f64,
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub transactions_imported: usize,
    pub procedures_created: usize,
    pub patients_count: usize,
    pub procedures_skipped: usize,
}

/// Rolls transaction rows up into procedure records, one per distinct
/// procedure id, in the order ids first appear. Groups where no row carries
/// a service date cannot be placed on a timeline and are skipped.
pub fn build_procedure_records(rows: &[TransactionRow]) -> Vec<ProcedureRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&TransactionRow>> = HashMap::new();

    for row in rows {
        if !groups.contains_key(&row.procedure_id) {
            order.push(row.procedure_id.clone());
        }
        groups.entry(row.procedure_id.clone()).or_default().push(row);
    }

    let mut records = Vec::with_capacity(order.len());
    for procedure_id in order {
        let group = groups.remove(&procedure_id).unwrap_or_default();
        match rollup_group(&procedure_id, &group) {
            Some(record) => records.push(record),
            None => warn!(
                "skipping procedure {}: no transaction carries a date of service",
                procedure_id
            ),
        }
    }

    info!(
        "built {} procedure records from {} transactions",
        records.len(),
        rows.len()
    );
    records
}

/// Counts for reporting an import of `rows` that produced `records`.
pub fn import_summary(rows: &[TransactionRow], records: &[ProcedureRecord]) -> ImportSummary {
    let procedure_ids: HashSet<&str> = rows.iter().map(|r| r.procedure_id.as_str()).collect();
    let patients: HashSet<i64> = rows.iter().filter_map(|r| r.chart_number).collect();

    ImportSummary {
        transactions_imported: rows.len(),
        procedures_created: records.len(),
        patients_count: patients.len(),
        procedures_skipped: procedure_ids.len() - records.len(),
    }
}

fn rollup_group(procedure_id: &str, group: &[&TransactionRow]) -> Option<ProcedureRecord> {
    let date_of_service = group.iter().find_map(|row| row.date_of_service)?;

    let mut record = ProcedureRecord::new(procedure_id, date_of_service);
    record.chart_number = group.iter().find_map(|row| row.chart_number);
    record.type_code = first_text(group, |row| row.type_code.as_ref());
    record.type_name = first_text(group, |row| row.surgery_type.as_ref());
    record.carrier = first_text(group, |row| row.carrier.as_ref());
    record.billing_subcategory = first_text(group, |row| row.billing_subcategory.as_ref());

    for row in group {
        record.total_charges += row.charges;
        record.total_payments += row.total_payments;
        record.total_adjustments += row.adjustments;
        // Reversals stay in the totals but not on the payment timeline.
        if row.total_payments > 0.0 {
            if let Some(date_of_deposit) = row.date_of_deposit {
                record.payments.push(PaymentEvent {
                    date_of_deposit,
                    amount: row.total_payments,
                });
            }
        }
    }
    record.payments.sort_by_key(|p| p.date_of_deposit);

    record.days_to_first_payment = record
        .payments
        .first()
        .map(|p| (p.date_of_deposit - date_of_service).num_days());

    Some(record)
}

fn first_text<'a, F>(group: &[&'a TransactionRow], field: F) -> Option<String>
where
    F: FnMut(&&'a TransactionRow) -> Option<&'a String>,
{
    group.iter().find_map(field).cloned()
}
