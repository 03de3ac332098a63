use crate::rates;
use crate::record::ProcedureRecord;
use crate::utils;
use serde::Serialize;
use std::collections::HashSet;

/// Whole-dataset totals, independent of any grouping or display filtering.
///
/// Computed over the records matching the query's pre-filters only, so the
/// totals stay accurate no matter how narrow the grouped view is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_procedures: usize,
    pub total_charges: f64,
    pub total_payments: f64,
    pub collection_rate: f64,
}

/// The dashboard headline block: [`Summary`] plus adjustments, distinct
/// patients and payment speed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_charges: f64,
    pub total_payments: f64,
    pub total_adjustments: f64,
    pub collection_rate: f64,
    pub procedure_count: usize,
    pub patient_count: usize,
    pub avg_days_to_payment: Option<f64>,
}

pub fn summarize(records: &[ProcedureRecord]) -> Summary {
    let total_charges: f64 = records.iter().map(|r| r.total_charges).sum();
    let total_payments: f64 = records.iter().map(|r| r.total_payments).sum();

    Summary {
        total_procedures: records.len(),
        total_charges,
        total_payments,
        collection_rate: rates::collection_rate(total_charges, total_payments),
    }
}

pub fn dashboard_metrics(records: &[ProcedureRecord]) -> DashboardMetrics {
    let total_charges: f64 = records.iter().map(|r| r.total_charges).sum();
    let total_payments: f64 = records.iter().map(|r| r.total_payments).sum();
    let total_adjustments: f64 = records.iter().map(|r| r.total_adjustments).sum();

    let patients: HashSet<i64> = records.iter().filter_map(|r| r.chart_number).collect();

    let known_days: Vec<f64> = records
        .iter()
        .filter_map(|r| r.days_to_first_payment)
        .map(|days| days as f64)
        .collect();

    DashboardMetrics {
        total_charges,
        total_payments,
        total_adjustments,
        collection_rate: rates::collection_rate(total_charges, total_payments),
        procedure_count: records.len(),
        patient_count: patients.len(),
        avg_days_to_payment: utils::mean(&known_days).map(utils::round1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_summary_totals() {
        let records = vec![
            ProcedureRecord {
                total_charges: 1000.0,
                total_payments: 800.0,
                ..ProcedureRecord::new("P1", date(2024, 1, 1))
            },
            ProcedureRecord {
                total_charges: 500.0,
                ..ProcedureRecord::new("P2", date(2024, 1, 2))
            },
            ProcedureRecord {
                total_charges: 2000.0,
                total_payments: 2000.0,
                ..ProcedureRecord::new("P3", date(2024, 1, 3))
            },
        ];

        let summary = summarize(&records);
        assert_eq!(summary.total_procedures, 3);
        assert_eq!(summary.total_charges, 3500.0);
        assert_eq!(summary.total_payments, 2800.0);
        assert_eq!(summary.collection_rate, 80.0);
    }

    #[test]
    fn test_empty_set_summarizes_to_zeros() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_procedures, 0);
        assert_eq!(summary.total_charges, 0.0);
        assert_eq!(summary.total_payments, 0.0);
        assert_eq!(summary.collection_rate, 0.0);
    }

    #[test]
    fn test_dashboard_counts_distinct_patients() {
        let records = vec![
            ProcedureRecord {
                chart_number: Some(100),
                total_charges: 300.0,
                total_adjustments: 50.0,
                days_to_first_payment: Some(20),
                ..ProcedureRecord::new("P1", date(2024, 1, 1))
            },
            ProcedureRecord {
                chart_number: Some(100),
                total_charges: 200.0,
                days_to_first_payment: Some(40),
                ..ProcedureRecord::new("P2", date(2024, 2, 1))
            },
            ProcedureRecord {
                chart_number: None,
                total_charges: 100.0,
                ..ProcedureRecord::new("P3", date(2024, 3, 1))
            },
        ];

        let metrics = dashboard_metrics(&records);
        assert_eq!(metrics.procedure_count, 3);
        assert_eq!(metrics.patient_count, 1);
        assert_eq!(metrics.total_adjustments, 50.0);
        assert_eq!(metrics.avg_days_to_payment, Some(30.0));
    }
}
