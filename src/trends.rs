//! Time-phased views: billing trends per calendar period, the
//! days-to-payment distribution, and the outstanding-balance aging report.

use crate::rates;
use crate::record::{ProcedureRecord, ProcedureStatus};
use crate::utils;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar resolution for [`trends`]. Weeks run Monday to Sunday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
}

impl Granularity {
    fn key(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Day => date.format("%Y-%m-%d").to_string(),
            Granularity::Week => date.format("%Y-W%W").to_string(),
            Granularity::Month => date.format("%Y-%m").to_string(),
        }
    }
}

/// Billing activity within one calendar period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Period key: `YYYY-MM-DD`, `YYYY-W##` or `YYYY-MM` depending on
    /// granularity.
    pub period: String,
    pub procedure_count: usize,
    pub total_charges: f64,
    pub total_payments: f64,
    pub total_adjustments: f64,
    pub collection_rate: f64,
}

#[derive(Default)]
struct PeriodSlot {
    procedures: usize,
    charges: f64,
    payments: f64,
    adjustments: f64,
}

/// Buckets records by service-date period, ascending. Only observed periods
/// appear; gaps are the rendering layer's concern.
pub fn trends(records: &[ProcedureRecord], granularity: Granularity) -> Vec<TrendPoint> {
    let mut periods: BTreeMap<String, PeriodSlot> = BTreeMap::new();

    for record in records {
        let slot = periods
            .entry(granularity.key(record.date_of_service))
            .or_default();
        slot.procedures += 1;
        slot.charges += record.total_charges;
        slot.payments += record.total_payments;
        slot.adjustments += record.total_adjustments;
    }

    periods
        .into_iter()
        .map(|(period, slot)| TrendPoint {
            period,
            procedure_count: slot.procedures,
            total_charges: slot.charges,
            total_payments: slot.payments,
            total_adjustments: slot.adjustments,
            collection_rate: rates::collection_rate(slot.charges, slot.payments),
        })
        .collect()
}

/// One bucket of the days-to-payment histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    /// Inclusive day range label, e.g. "31-60" or "365+".
    pub range: String,
    pub count: usize,
    pub percent: f64,
}

/// How quickly procedures get their first payment, over the records that
/// have been paid at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaysToPaymentDistribution {
    pub avg_days: Option<f64>,
    pub median_days: Option<i64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub distribution: Vec<DistributionBucket>,
}

const DAY_BUCKETS: [(i64, Option<i64>); 7] = [
    (0, Some(30)),
    (31, Some(60)),
    (61, Some(90)),
    (91, Some(120)),
    (121, Some(180)),
    (181, Some(365)),
    (366, None),
];

pub fn days_to_payment_distribution(records: &[ProcedureRecord]) -> DaysToPaymentDistribution {
    let mut days: Vec<i64> = records
        .iter()
        .filter_map(|r| r.days_to_first_payment)
        .collect();
    days.sort_unstable();

    if days.is_empty() {
        return DaysToPaymentDistribution {
            avg_days: None,
            median_days: None,
            min_days: None,
            max_days: None,
            distribution: Vec::new(),
        };
    }

    let total = days.len();
    let distribution = DAY_BUCKETS
        .iter()
        .map(|&(low, high)| {
            let count = match high {
                Some(high) => days.iter().filter(|&&d| d >= low && d <= high).count(),
                None => days.iter().filter(|&&d| d >= low).count(),
            };
            let range = match high {
                Some(high) => format!("{}-{}", low, high),
                None => format!("{}+", low - 1),
            };
            DistributionBucket {
                range,
                count,
                percent: utils::round1(count as f64 / total as f64 * 100.0),
            }
        })
        .collect();

    let values: Vec<f64> = days.iter().map(|&d| d as f64).collect();

    DaysToPaymentDistribution {
        avg_days: utils::mean(&values).map(utils::round1),
        median_days: Some(days[total / 2]),
        min_days: days.first().copied(),
        max_days: days.last().copied(),
        distribution,
    }
}

/// One bucket of the aging report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingBucket {
    pub age_bucket: String,
    pub procedure_count: usize,
    pub total_outstanding: f64,
    pub percent: f64,
}

const AGING_LABELS: [&str; 5] = ["0-30", "31-60", "61-90", "91-120", "120+"];

fn aging_label(age_days: i64) -> &'static str {
    if age_days <= 30 {
        "0-30"
    } else if age_days <= 60 {
        "31-60"
    } else if age_days <= 90 {
        "61-90"
    } else if age_days <= 120 {
        "91-120"
    } else {
        "120+"
    }
}

/// Buckets the open balances (pending or partially paid procedures with a
/// positive outstanding amount) by age since service as of `as_of`. All five
/// buckets are reported, zero or not, in ascending age order.
pub fn aging_report(records: &[ProcedureRecord], as_of: NaiveDate) -> Vec<AgingBucket> {
    let mut counts: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    let mut total_outstanding = 0.0;

    for record in records {
        if !matches!(
            record.status(),
            ProcedureStatus::Pending | ProcedureStatus::Partial
        ) {
            continue;
        }
        let balance = record.outstanding_balance();
        if balance <= 0.0 {
            continue;
        }

        let age = utils::days_between(record.date_of_service, as_of);
        let slot = counts.entry(aging_label(age)).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += balance;
        total_outstanding += balance;
    }

    AGING_LABELS
        .iter()
        .map(|&label| {
            let (count, outstanding) = counts.get(label).copied().unwrap_or((0, 0.0));
            let percent = if total_outstanding > 0.0 {
                utils::round1(outstanding / total_outstanding * 100.0)
            } else {
                0.0
            };
            AgingBucket {
                age_bucket: label.to_string(),
                procedure_count: count,
                total_outstanding: outstanding,
                percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn billed(id: &str, dos: NaiveDate, charges: f64, payments: f64) -> ProcedureRecord {
        ProcedureRecord {
            total_charges: charges,
            total_payments: payments,
            ..ProcedureRecord::new(id, dos)
        }
    }

    #[test]
    fn test_monthly_trends_ascending() {
        let records = vec![
            billed("P1", date(2024, 2, 10), 500.0, 250.0),
            billed("P2", date(2024, 1, 5), 1000.0, 800.0),
            billed("P3", date(2024, 1, 20), 1000.0, 200.0),
        ];

        let points = trends(&records, Granularity::Month);
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].period, "2024-01");
        assert_eq!(points[0].procedure_count, 2);
        assert_eq!(points[0].total_charges, 2000.0);
        assert_eq!(points[0].collection_rate, 50.0);

        assert_eq!(points[1].period, "2024-02");
        assert_eq!(points[1].collection_rate, 50.0);
    }

    #[test]
    fn test_week_and_day_period_keys() {
        // 2024 starts on a Monday, so Jan 15 falls in week 03.
        let records = vec![billed("P1", date(2024, 1, 15), 100.0, 0.0)];

        assert_eq!(trends(&records, Granularity::Week)[0].period, "2024-W03");
        assert_eq!(trends(&records, Granularity::Day)[0].period, "2024-01-15");
    }

    #[test]
    fn test_distribution_buckets_and_stats() {
        let records = vec![
            ProcedureRecord {
                days_to_first_payment: Some(10),
                ..ProcedureRecord::new("P1", date(2024, 1, 1))
            },
            ProcedureRecord {
                days_to_first_payment: Some(45),
                ..ProcedureRecord::new("P2", date(2024, 1, 2))
            },
            ProcedureRecord {
                days_to_first_payment: Some(400),
                ..ProcedureRecord::new("P3", date(2024, 1, 3))
            },
            ProcedureRecord::new("P4", date(2024, 1, 4)),
        ];

        let dist = days_to_payment_distribution(&records);
        assert_eq!(dist.avg_days, Some(151.7));
        assert_eq!(dist.median_days, Some(45));
        assert_eq!(dist.min_days, Some(10));
        assert_eq!(dist.max_days, Some(400));

        assert_eq!(dist.distribution.len(), 7);
        assert_eq!(dist.distribution[0].range, "0-30");
        assert_eq!(dist.distribution[0].count, 1);
        assert_eq!(dist.distribution[0].percent, 33.3);
        assert_eq!(dist.distribution[6].range, "365+");
        assert_eq!(dist.distribution[6].count, 1);
        assert_eq!(dist.distribution[1].count, 1);
        assert_eq!(dist.distribution[2].count, 0);
    }

    #[test]
    fn test_distribution_with_no_paid_records() {
        let records = vec![ProcedureRecord::new("P1", date(2024, 1, 1))];
        let dist = days_to_payment_distribution(&records);

        assert_eq!(dist.avg_days, None);
        assert_eq!(dist.median_days, None);
        assert!(dist.distribution.is_empty());
    }

    #[test]
    fn test_aging_buckets_outstanding_balances() {
        let as_of = date(2024, 7, 1);
        let records = vec![
            // 45 days old, fully open.
            billed("P1", date(2024, 5, 17), 500.0, 0.0),
            // 10 days old, partially paid.
            billed("P2", date(2024, 6, 21), 500.0, 250.0),
            // Collected; never ages.
            billed("P3", date(2024, 1, 1), 1000.0, 1000.0),
        ];

        let report = aging_report(&records, as_of);
        assert_eq!(report.len(), 5);

        let fresh = &report[0];
        assert_eq!(fresh.age_bucket, "0-30");
        assert_eq!(fresh.procedure_count, 1);
        assert_eq!(fresh.total_outstanding, 250.0);
        assert_eq!(fresh.percent, 33.3);

        let older = &report[1];
        assert_eq!(older.age_bucket, "31-60");
        assert_eq!(older.total_outstanding, 500.0);
        assert_eq!(older.percent, 66.7);

        assert_eq!(report[4].age_bucket, "120+");
        assert_eq!(report[4].procedure_count, 0);
    }

    #[test]
    fn test_aging_with_nothing_outstanding() {
        let records = vec![billed("P1", date(2024, 1, 1), 1000.0, 1000.0)];
        let report = aging_report(&records, date(2024, 7, 1));

        assert!(report.iter().all(|bucket| bucket.procedure_count == 0));
        assert!(report.iter().all(|bucket| bucket.percent == 0.0));
    }
}
