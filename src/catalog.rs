//! Distinct dimension values observed in a record set, with counts, for
//! populating filter pickers.

use crate::record::{Dimension, ProcedureRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// One selectable value for a filter picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub count: usize,
}

/// Span of service dates present in the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Every picker in one pass over the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCatalog {
    pub patients: Vec<FilterOption>,
    pub surgery_types: Vec<FilterOption>,
    pub carriers: Vec<FilterOption>,
    pub billing_subcategories: Vec<FilterOption>,
    pub date_range: DateRange,
}

/// Builds the full filter catalog. Records missing a value for a dimension
/// are left out of that dimension's options.
pub fn build_catalog(records: &[ProcedureRecord]) -> FilterCatalog {
    FilterCatalog {
        patients: patient_options(records),
        surgery_types: surgery_type_options(records),
        carriers: carrier_options(records),
        billing_subcategories: billing_subcategory_options(records),
        date_range: date_range(records),
    }
}

/// Options for one dimension of the catalog.
pub fn dimension_options(records: &[ProcedureRecord], dimension: Dimension) -> Vec<FilterOption> {
    match dimension {
        Dimension::SurgeryType => surgery_type_options(records),
        Dimension::Carrier => carrier_options(records),
        Dimension::BillingSubcategory => billing_subcategory_options(records),
        Dimension::Patient => patient_options(records),
        Dimension::ProcedureId => procedure_options(records),
    }
}

/// Patients ordered by chart number, labelled `Patient {chart}`.
pub fn patient_options(records: &[ProcedureRecord]) -> Vec<FilterOption> {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for record in records {
        if let Some(chart) = record.chart_number {
            *counts.entry(chart).or_insert(0) += 1;
        }
    }

    let mut charts: Vec<i64> = counts.keys().copied().collect();
    charts.sort_unstable();

    charts
        .into_iter()
        .map(|chart| FilterOption {
            value: chart.to_string(),
            label: format!("Patient {}", chart),
            count: counts[&chart],
        })
        .collect()
}

/// Surgery types ordered by code. The label is the descriptive name when any
/// record carries one, otherwise the code itself.
pub fn surgery_type_options(records: &[ProcedureRecord]) -> Vec<FilterOption> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names: HashMap<String, String> = HashMap::new();
    for record in records {
        if let Some(code) = &record.type_code {
            *counts.entry(code.clone()).or_insert(0) += 1;
            if let Some(name) = &record.type_name {
                names.entry(code.clone()).or_insert_with(|| name.clone());
            }
        }
    }

    let mut codes: Vec<String> = counts.keys().cloned().collect();
    codes.sort_unstable();

    codes
        .into_iter()
        .map(|code| {
            let label = names.get(&code).cloned().unwrap_or_else(|| code.clone());
            let count = counts[&code];
            FilterOption {
                value: code,
                label,
                count,
            }
        })
        .collect()
}

/// Carriers ordered by how many procedures they cover, busiest first.
pub fn carrier_options(records: &[ProcedureRecord]) -> Vec<FilterOption> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        if let Some(carrier) = &record.carrier {
            if !counts.contains_key(carrier) {
                order.push(carrier.clone());
            }
            *counts.entry(carrier.clone()).or_insert(0) += 1;
        }
    }

    let mut options: Vec<FilterOption> = order
        .into_iter()
        .map(|carrier| {
            let count = counts[&carrier];
            FilterOption {
                value: carrier.clone(),
                label: carrier,
                count,
            }
        })
        .collect();
    options.sort_by(|a, b| b.count.cmp(&a.count));
    options
}

/// Billing subcategories in alphabetical order.
pub fn billing_subcategory_options(records: &[ProcedureRecord]) -> Vec<FilterOption> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        if let Some(subcategory) = &record.billing_subcategory {
            *counts.entry(subcategory.clone()).or_insert(0) += 1;
        }
    }

    let mut subcategories: Vec<String> = counts.keys().cloned().collect();
    subcategories.sort_unstable();

    subcategories
        .into_iter()
        .map(|subcategory| {
            let count = counts[&subcategory];
            FilterOption {
                value: subcategory.clone(),
                label: subcategory,
                count,
            }
        })
        .collect()
}

fn procedure_options(records: &[ProcedureRecord]) -> Vec<FilterOption> {
    let mut ids: Vec<String> = records.iter().map(|r| r.procedure_id.clone()).collect();
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .map(|id| FilterOption {
            value: id.clone(),
            label: id,
            count: 1,
        })
        .collect()
}

/// Earliest and latest service dates, `None` on an empty record set.
pub fn date_range(records: &[ProcedureRecord]) -> DateRange {
    DateRange {
        min_date: records.iter().map(|r| r.date_of_service).min(),
        max_date: records.iter().map(|r| r.date_of_service).max(),
    }
}
