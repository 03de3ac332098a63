//! Data-quality sweeps over billing records: overpayments, claims gone
//! stale without a payment, and likely duplicate entries.

use crate::record::{ProcedureRecord, UNKNOWN_LABEL};
use crate::utils;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Days without any payment before an unpaid claim counts as stale.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// A procedure that collected more than it billed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverpaymentAnomaly {
    pub procedure_id: String,
    pub chart_number: Option<i64>,
    pub date_of_service: NaiveDate,
    pub type_code: Option<String>,
    pub carrier: Option<String>,
    pub total_charges: f64,
    pub total_payments: f64,
    pub overpayment: f64,
    pub overpayment_percent: f64,
}

/// A billed procedure with no payment long after service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleClaimAnomaly {
    pub procedure_id: String,
    pub chart_number: Option<i64>,
    pub date_of_service: NaiveDate,
    pub type_code: Option<String>,
    pub carrier: Option<String>,
    pub total_charges: f64,
    pub days_since_service: i64,
}

/// Procedures sharing patient, service date and surgery type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub chart_number: Option<i64>,
    pub date_of_service: NaiveDate,
    pub type_code: Option<String>,
    pub duplicate_count: usize,
    pub procedure_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverpaymentReport {
    pub severity: Severity,
    pub count: usize,
    pub total_overpayment: f64,
    pub procedures: Vec<OverpaymentAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaleClaimReport {
    pub severity: Severity,
    pub count: usize,
    pub total_uncollected: f64,
    pub procedures: Vec<StaleClaimAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    pub severity: Severity,
    pub count: usize,
    pub groups: Vec<DuplicateGroup>,
}

/// Every check in one sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub total_anomalies: usize,
    pub payment_exceeds_charges: OverpaymentReport,
    pub missing_payments: StaleClaimReport,
    pub duplicate_procedures: DuplicateReport,
}

/// Overpayment anomalies rolled up per carrier or per patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierAnomalySummary {
    pub carrier: String,
    pub anomaly_count: usize,
    pub total_overpayment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientAnomalySummary {
    pub chart_number: Option<i64>,
    pub anomaly_count: usize,
    pub total_overpayment: f64,
}

/// Runs the anomaly checks against a fixed evaluation date.
pub struct AnomalyDetector {
    as_of: NaiveDate,
    stale_after_days: i64,
}

impl AnomalyDetector {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
        }
    }

    /// Overrides the stale-claim threshold.
    pub fn stale_after_days(mut self, days: i64) -> Self {
        self.stale_after_days = days;
        self
    }

    pub fn detect_all(&self, records: &[ProcedureRecord]) -> AnomalyReport {
        let payment_exceeds_charges = self.overpayments(records);
        let missing_payments = self.stale_claims(records);
        let duplicate_procedures = self.duplicates(records);

        AnomalyReport {
            total_anomalies: payment_exceeds_charges.count
                + missing_payments.count
                + duplicate_procedures.count,
            payment_exceeds_charges,
            missing_payments,
            duplicate_procedures,
        }
    }

    /// Procedures paid more than billed (`payments > charges > 0`), worst
    /// first.
    pub fn overpayments(&self, records: &[ProcedureRecord]) -> OverpaymentReport {
        let mut procedures: Vec<OverpaymentAnomaly> = records
            .iter()
            .filter(|r| r.total_charges > 0.0 && r.total_payments > r.total_charges)
            .map(|r| {
                let overpayment = r.total_payments - r.total_charges;
                OverpaymentAnomaly {
                    procedure_id: r.procedure_id.clone(),
                    chart_number: r.chart_number,
                    date_of_service: r.date_of_service,
                    type_code: r.type_code.clone(),
                    carrier: r.carrier.clone(),
                    total_charges: r.total_charges,
                    total_payments: r.total_payments,
                    overpayment: utils::round2(overpayment),
                    overpayment_percent: utils::round2(overpayment / r.total_charges * 100.0),
                }
            })
            .collect();

        procedures.sort_by(|a, b| {
            b.overpayment
                .partial_cmp(&a.overpayment)
                .unwrap_or(Ordering::Equal)
        });

        OverpaymentReport {
            severity: Severity::High,
            count: procedures.len(),
            total_overpayment: utils::round2(procedures.iter().map(|p| p.overpayment).sum()),
            procedures,
        }
    }

    /// Billed procedures still unpaid `stale_after_days` or more after
    /// service, largest charges first.
    pub fn stale_claims(&self, records: &[ProcedureRecord]) -> StaleClaimReport {
        let mut procedures: Vec<StaleClaimAnomaly> = records
            .iter()
            .filter_map(|r| {
                let days_since_service = utils::days_between(r.date_of_service, self.as_of);
                let is_stale = r.total_charges > 0.0
                    && r.total_payments == 0.0
                    && days_since_service >= self.stale_after_days;
                is_stale.then(|| StaleClaimAnomaly {
                    procedure_id: r.procedure_id.clone(),
                    chart_number: r.chart_number,
                    date_of_service: r.date_of_service,
                    type_code: r.type_code.clone(),
                    carrier: r.carrier.clone(),
                    total_charges: r.total_charges,
                    days_since_service,
                })
            })
            .collect();

        procedures.sort_by(|a, b| {
            b.total_charges
                .partial_cmp(&a.total_charges)
                .unwrap_or(Ordering::Equal)
        });

        StaleClaimReport {
            severity: Severity::Medium,
            count: procedures.len(),
            total_uncollected: utils::round2(procedures.iter().map(|p| p.total_charges).sum()),
            procedures,
        }
    }

    /// Groups of procedures sharing (patient, service date, surgery type).
    pub fn duplicates(&self, records: &[ProcedureRecord]) -> DuplicateReport {
        type DuplicateKey = (Option<i64>, NaiveDate, Option<String>);

        let mut order: Vec<DuplicateKey> = Vec::new();
        let mut members: HashMap<DuplicateKey, Vec<String>> = HashMap::new();

        for record in records {
            let key = (
                record.chart_number,
                record.date_of_service,
                record.type_code.clone(),
            );
            if !members.contains_key(&key) {
                order.push(key.clone());
            }
            members
                .entry(key)
                .or_default()
                .push(record.procedure_id.clone());
        }

        let groups: Vec<DuplicateGroup> = order
            .into_iter()
            .filter_map(|key| {
                let procedure_ids = members.remove(&key).unwrap_or_default();
                if procedure_ids.len() < 2 {
                    return None;
                }
                let (chart_number, date_of_service, type_code) = key;
                Some(DuplicateGroup {
                    chart_number,
                    date_of_service,
                    type_code,
                    duplicate_count: procedure_ids.len(),
                    procedure_ids,
                })
            })
            .collect();

        DuplicateReport {
            severity: Severity::Low,
            count: groups.len(),
            groups,
        }
    }

    /// Overpayment anomalies per carrier, most anomalies first. Records with
    /// no carrier roll up under `"Unknown"`.
    pub fn summary_by_carrier(&self, records: &[ProcedureRecord]) -> Vec<CarrierAnomalySummary> {
        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, (usize, f64)> = HashMap::new();

        for anomaly in self.overpayments(records).procedures {
            let carrier = anomaly
                .carrier
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            if !totals.contains_key(&carrier) {
                order.push(carrier.clone());
            }
            let slot = totals.entry(carrier).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += anomaly.overpayment;
        }

        let mut carriers: Vec<CarrierAnomalySummary> = order
            .into_iter()
            .map(|carrier| {
                let (anomaly_count, total_overpayment) =
                    totals.get(&carrier).copied().unwrap_or((0, 0.0));
                CarrierAnomalySummary {
                    carrier,
                    anomaly_count,
                    total_overpayment: utils::round2(total_overpayment),
                }
            })
            .collect();

        carriers.sort_by(|a, b| b.anomaly_count.cmp(&a.anomaly_count));
        carriers
    }

    /// Patients with the most overpayment anomalies, capped at `limit`.
    pub fn summary_by_patient(
        &self,
        records: &[ProcedureRecord],
        limit: usize,
    ) -> Vec<PatientAnomalySummary> {
        let mut order: Vec<Option<i64>> = Vec::new();
        let mut totals: HashMap<Option<i64>, (usize, f64)> = HashMap::new();

        for anomaly in self.overpayments(records).procedures {
            if !totals.contains_key(&anomaly.chart_number) {
                order.push(anomaly.chart_number);
            }
            let slot = totals.entry(anomaly.chart_number).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += anomaly.overpayment;
        }

        let mut patients: Vec<PatientAnomalySummary> = order
            .into_iter()
            .map(|chart_number| {
                let (anomaly_count, total_overpayment) =
                    totals.get(&chart_number).copied().unwrap_or((0, 0.0));
                PatientAnomalySummary {
                    chart_number,
                    anomaly_count,
                    total_overpayment: utils::round2(total_overpayment),
                }
            })
            .collect();

        patients.sort_by(|a, b| b.anomaly_count.cmp(&a.anomaly_count));
        patients.truncate(limit);
        patients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        id: &str,
        chart: Option<i64>,
        dos: NaiveDate,
        carrier: Option<&str>,
        charges: f64,
        payments: f64,
    ) -> ProcedureRecord {
        ProcedureRecord {
            chart_number: chart,
            type_code: Some("CATH".to_string()),
            carrier: carrier.map(str::to_string),
            total_charges: charges,
            total_payments: payments,
            ..ProcedureRecord::new(id, dos)
        }
    }

    #[test]
    fn test_overpayments_sorted_by_excess() {
        let detector = AnomalyDetector::new(date(2024, 7, 1));
        let records = vec![
            record("P1", Some(1), date(2024, 1, 1), Some("Aetna"), 100.0, 150.0),
            record("P2", Some(2), date(2024, 1, 2), Some("Cigna"), 100.0, 400.0),
            record("P3", Some(3), date(2024, 1, 3), None, 100.0, 90.0),
            // Zero-charge records are excluded even when paid.
            record("P4", Some(4), date(2024, 1, 4), None, 0.0, 50.0),
        ];

        let report = detector.overpayments(&records);
        assert_eq!(report.count, 2);
        assert_eq!(report.severity, Severity::High);
        assert_eq!(report.procedures[0].procedure_id, "P2");
        assert_eq!(report.procedures[0].overpayment, 300.0);
        assert_eq!(report.procedures[0].overpayment_percent, 300.0);
        assert_eq!(report.total_overpayment, 350.0);
    }

    #[test]
    fn test_stale_claims_threshold_boundary() {
        let as_of = date(2024, 7, 1);
        let detector = AnomalyDetector::new(as_of);
        let records = vec![
            // Exactly 180 days before as_of.
            record("P1", Some(1), date(2024, 1, 3), None, 500.0, 0.0),
            // One day short of stale.
            record("P2", Some(2), date(2024, 1, 4), None, 900.0, 0.0),
            // Old but paid.
            record("P3", Some(3), date(2023, 1, 1), None, 700.0, 700.0),
        ];

        let report = detector.stale_claims(&records);
        assert_eq!(report.count, 1);
        assert_eq!(report.procedures[0].procedure_id, "P1");
        assert_eq!(report.procedures[0].days_since_service, 180);
        assert_eq!(report.total_uncollected, 500.0);
    }

    #[test]
    fn test_stale_threshold_override() {
        let detector = AnomalyDetector::new(date(2024, 7, 1)).stale_after_days(30);
        let records = vec![record("P1", Some(1), date(2024, 5, 1), None, 100.0, 0.0)];

        assert_eq!(detector.stale_claims(&records).count, 1);
    }

    #[test]
    fn test_duplicates_grouped_by_patient_date_type() {
        let detector = AnomalyDetector::new(date(2024, 7, 1));
        let dos = date(2024, 2, 1);
        let records = vec![
            record("P1", Some(7), dos, None, 100.0, 0.0),
            record("P2", Some(7), dos, None, 100.0, 0.0),
            record("P3", Some(8), dos, None, 100.0, 0.0),
        ];

        let report = detector.duplicates(&records);
        assert_eq!(report.count, 1);
        assert_eq!(report.groups[0].duplicate_count, 2);
        assert_eq!(report.groups[0].procedure_ids, vec!["P1", "P2"]);
    }

    #[test]
    fn test_detect_all_counts_every_check() {
        let as_of = date(2024, 7, 1);
        let detector = AnomalyDetector::new(as_of);
        let dos = date(2023, 6, 1);
        let records = vec![
            record("P1", Some(1), dos, Some("Aetna"), 100.0, 150.0),
            record("P2", Some(2), dos, None, 800.0, 0.0),
            record("P3", Some(3), dos, None, 100.0, 50.0),
            record("P4", Some(3), dos, None, 100.0, 50.0),
        ];

        let report = detector.detect_all(&records);
        assert_eq!(report.payment_exceeds_charges.count, 1);
        // P2 through P4 are all unpaid or partially paid; only P2 has zero
        // payments and is old enough.
        assert_eq!(report.missing_payments.count, 1);
        assert_eq!(report.duplicate_procedures.count, 1);
        assert_eq!(report.total_anomalies, 3);
    }

    #[test]
    fn test_carrier_summary_normalizes_unknown() {
        let detector = AnomalyDetector::new(date(2024, 7, 1));
        let records = vec![
            record("P1", Some(1), date(2024, 1, 1), None, 100.0, 130.0),
            record("P2", Some(2), date(2024, 1, 2), None, 100.0, 120.0),
            record("P3", Some(3), date(2024, 1, 3), Some("Aetna"), 100.0, 110.0),
        ];

        let carriers = detector.summary_by_carrier(&records);
        assert_eq!(carriers.len(), 2);
        assert_eq!(carriers[0].carrier, "Unknown");
        assert_eq!(carriers[0].anomaly_count, 2);
        assert_eq!(carriers[0].total_overpayment, 50.0);
        assert_eq!(carriers[1].carrier, "Aetna");
    }

    #[test]
    fn test_patient_summary_respects_limit() {
        let detector = AnomalyDetector::new(date(2024, 7, 1));
        let records = vec![
            record("P1", Some(1), date(2024, 1, 1), None, 100.0, 130.0),
            record("P2", Some(1), date(2024, 1, 2), None, 100.0, 120.0),
            record("P3", Some(2), date(2024, 1, 3), None, 100.0, 110.0),
            record("P4", Some(3), date(2024, 1, 4), None, 100.0, 105.0),
        ];

        let patients = detector.summary_by_patient(&records, 2);
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].chart_number, Some(1));
        assert_eq!(patients[0].anomaly_count, 2);
        assert_eq!(patients[0].total_overpayment, 50.0);
    }
}
