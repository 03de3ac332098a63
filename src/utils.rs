use chrono::{Months, NaiveDate};

/// Adds whole calendar months, clamping to the end of shorter months
/// (Jan 31 + 1 month = Feb 28/29). `None` on date overflow.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Whether `horizon_months` have fully elapsed since `date_of_service`
/// as of `as_of`.
pub fn horizon_elapsed(date_of_service: NaiveDate, horizon_months: u32, as_of: NaiveDate) -> bool {
    add_months(date_of_service, horizon_months).map_or(false, |end| end <= as_of)
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Rounds to two decimals, the precision rates are reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
        assert_eq!(add_months(date(2024, 6, 1), 12), Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_horizon_elapsed_boundary() {
        let as_of = date(2024, 7, 1);

        // Exactly one month old counts as elapsed.
        assert!(horizon_elapsed(date(2024, 6, 1), 1, as_of));
        assert!(!horizon_elapsed(date(2024, 6, 2), 1, as_of));

        assert!(horizon_elapsed(date(2024, 1, 1), 6, as_of));
        assert!(!horizon_elapsed(date(2024, 1, 1), 12, as_of));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2024, 1, 1), date(2024, 1, 31)), 30);
        assert_eq!(days_between(date(2024, 1, 31), date(2024, 1, 1)), -30);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(53.333333), 53.33);
        assert_eq!(round2(99.999), 100.0);
        assert_eq!(round1(41.25), 41.3);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
    }
}
