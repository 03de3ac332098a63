//! Collection-rate and recovery-rate math.
//!
//! Both rates share one zero-division policy: a group with no charges reports
//! 0%, never NaN or infinity, so rates stay safe to sort and compare.
//! Recovery rates additionally bucket payments into fixed elapsed-month
//! horizons, measured against an explicit `as_of` date so results are
//! reproducible.

use crate::error::{AnalyticsError, Result};
use crate::record::ProcedureRecord;
use crate::utils;
use chrono::NaiveDate;
use serde::Serialize;

/// The fixed recovery horizons, in months.
pub const RECOVERY_HORIZONS: [u32; 4] = [1, 3, 6, 12];

/// Payments as a percentage of charges, rounded to two decimals.
///
/// Zero charges report 0% regardless of payments. Payments against a
/// zero-charge group are a data-quality condition for anomaly detection,
/// not a rate.
pub fn collection_rate(charges: f64, payments: f64) -> f64 {
    if charges > 0.0 {
        utils::round2(payments / charges * 100.0)
    } else {
        0.0
    }
}

/// Recovery within one horizon: how much of the eligible charges was paid
/// within `horizon` months of service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryWindow {
    /// Percent of eligible charges paid within the horizon, capped at 100.
    pub percent: f64,
    /// Amount paid within the horizon, over eligible records.
    pub amount: f64,
    /// Number of eligible records (horizon fully elapsed as of `as_of`).
    pub procedures: usize,
}

/// Recovery windows at every fixed horizon, plus the overall picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryAnalysis {
    pub recovery_1_month: RecoveryWindow,
    pub recovery_3_month: RecoveryWindow,
    pub recovery_6_month: RecoveryWindow,
    pub recovery_12_month: RecoveryWindow,
    /// Collection rate over every input record, elapsed or not.
    pub overall_collection_rate: f64,
    pub total_charges: f64,
    pub total_payments: f64,
}

/// Computes one recovery window.
///
/// Only records whose `date_of_service` lies at least `horizon_months` before
/// `as_of` participate; anything younger is excluded from both numerator and
/// denominator rather than counted as "not yet recovered", so recent
/// procedures cannot depress the rate. Eligibility is evaluated fresh for
/// every horizon. Rejects horizons outside [`RECOVERY_HORIZONS`].
pub fn recovery_rate(
    records: &[ProcedureRecord],
    horizon_months: u32,
    as_of: NaiveDate,
) -> Result<RecoveryWindow> {
    if !RECOVERY_HORIZONS.contains(&horizon_months) {
        return Err(AnalyticsError::UnsupportedHorizon(horizon_months));
    }
    Ok(recovery_window(records, horizon_months, as_of))
}

pub(crate) fn recovery_window(
    records: &[ProcedureRecord],
    horizon_months: u32,
    as_of: NaiveDate,
) -> RecoveryWindow {
    let mut eligible = 0usize;
    let mut eligible_charges = 0.0;
    let mut paid_within = 0.0;

    for record in records {
        let window_end = match utils::add_months(record.date_of_service, horizon_months) {
            Some(end) if end <= as_of => end,
            _ => continue,
        };
        eligible += 1;
        eligible_charges += record.total_charges;
        paid_within += record.payments_within(window_end);
    }

    RecoveryWindow {
        // Overpaid procedures can push the raw ratio past 100.
        percent: collection_rate(eligible_charges, paid_within).min(100.0),
        amount: paid_within,
        procedures: eligible,
    }
}

/// Computes all four fixed-horizon windows over one record set.
pub fn analyze_recovery(records: &[ProcedureRecord], as_of: NaiveDate) -> RecoveryAnalysis {
    let total_charges: f64 = records.iter().map(|r| r.total_charges).sum();
    let total_payments: f64 = records.iter().map(|r| r.total_payments).sum();

    RecoveryAnalysis {
        recovery_1_month: recovery_window(records, 1, as_of),
        recovery_3_month: recovery_window(records, 3, as_of),
        recovery_6_month: recovery_window(records, 6, as_of),
        recovery_12_month: recovery_window(records, 12, as_of),
        overall_collection_rate: collection_rate(total_charges, total_payments),
        total_charges,
        total_payments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PaymentEvent;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paid_record(
        id: &str,
        dos: NaiveDate,
        charges: f64,
        deposits: &[(NaiveDate, f64)],
    ) -> ProcedureRecord {
        ProcedureRecord {
            total_charges: charges,
            total_payments: deposits.iter().map(|(_, amount)| amount).sum(),
            payments: deposits
                .iter()
                .map(|&(date_of_deposit, amount)| PaymentEvent {
                    date_of_deposit,
                    amount,
                })
                .collect(),
            ..ProcedureRecord::new(id, dos)
        }
    }

    #[test]
    fn test_collection_rate_boundaries() {
        assert_eq!(collection_rate(0.0, 0.0), 0.0);
        assert_eq!(collection_rate(0.0, 500.0), 0.0);
        assert_eq!(collection_rate(100.0, 50.0), 50.0);
        assert_eq!(collection_rate(1500.0, 800.0), 53.33);
    }

    #[test]
    fn test_horizon_eligibility() {
        let as_of = date(2024, 7, 1);
        let records = vec![
            // One month elapsed exactly: 1-month bucket only.
            paid_record("P1", date(2024, 6, 1), 500.0, &[(date(2024, 6, 15), 200.0)]),
            // Six months elapsed: 1/3/6 buckets, not 12.
            paid_record(
                "P2",
                date(2024, 1, 1),
                1000.0,
                &[(date(2024, 3, 15), 400.0)],
            ),
        ];

        let one = recovery_rate(&records, 1, as_of).unwrap();
        assert_eq!(one.procedures, 2);

        let three = recovery_rate(&records, 3, as_of).unwrap();
        assert_eq!(three.procedures, 1);

        let six = recovery_rate(&records, 6, as_of).unwrap();
        assert_eq!(six.procedures, 1);

        let twelve = recovery_rate(&records, 12, as_of).unwrap();
        assert_eq!(twelve.procedures, 0);
        assert_eq!(twelve.percent, 0.0);
        assert_eq!(twelve.amount, 0.0);
    }

    #[test]
    fn test_window_only_counts_payments_inside_horizon() {
        let as_of = date(2024, 7, 1);
        // Paid 400 on 2024-03-15: outside the 1-month window (ends 2024-02-01),
        // inside the 3-month window (ends 2024-04-01).
        let records = vec![paid_record(
            "P1",
            date(2024, 1, 1),
            1000.0,
            &[(date(2024, 3, 15), 400.0)],
        )];

        let one = recovery_rate(&records, 1, as_of).unwrap();
        assert_eq!(one.procedures, 1);
        assert_eq!(one.amount, 0.0);
        assert_eq!(one.percent, 0.0);

        let three = recovery_rate(&records, 3, as_of).unwrap();
        assert_eq!(three.amount, 400.0);
        assert_eq!(three.percent, 40.0);
    }

    #[test]
    fn test_mixed_eligibility_denominator() {
        let as_of = date(2024, 7, 1);
        let records = vec![
            paid_record("P1", date(2024, 6, 1), 500.0, &[(date(2024, 6, 15), 200.0)]),
            paid_record("P2", date(2024, 1, 1), 1000.0, &[]),
        ];

        // Both eligible at 1 month: 200 of 1500 paid within window.
        let one = recovery_rate(&records, 1, as_of).unwrap();
        assert_eq!(one.procedures, 2);
        assert_eq!(one.amount, 200.0);
        assert_eq!(one.percent, 13.33);
    }

    #[test]
    fn test_overpayment_caps_percent() {
        let as_of = date(2024, 7, 1);
        let records = vec![paid_record(
            "P1",
            date(2024, 1, 1),
            100.0,
            &[(date(2024, 1, 20), 150.0)],
        )];

        let one = recovery_rate(&records, 1, as_of).unwrap();
        assert_eq!(one.percent, 100.0);
        assert_eq!(one.amount, 150.0);
    }

    #[test]
    fn test_unsupported_horizon_rejected() {
        let err = recovery_rate(&[], 2, date(2024, 7, 1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::UnsupportedHorizon(2)));
    }

    #[test]
    fn test_analyze_recovery_totals() {
        let as_of = date(2024, 7, 1);
        let records = vec![
            paid_record("P1", date(2023, 1, 10), 1000.0, &[(date(2023, 2, 1), 800.0)]),
            paid_record("P2", date(2024, 6, 20), 500.0, &[]),
        ];

        let analysis = analyze_recovery(&records, as_of);
        assert_eq!(analysis.total_charges, 1500.0);
        assert_eq!(analysis.total_payments, 800.0);
        assert_eq!(analysis.overall_collection_rate, 53.33);
        // P2 is too recent for any horizon.
        assert_eq!(analysis.recovery_1_month.procedures, 1);
        assert_eq!(analysis.recovery_12_month.procedures, 1);
        assert_eq!(analysis.recovery_12_month.percent, 80.0);
    }
}
