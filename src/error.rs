use crate::record::Dimension;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("No grouping dimensions supplied: expected between 1 and 4")]
    EmptyDimensions,

    #[error("Too many grouping dimensions: got {0}, at most 4 are supported")]
    TooManyDimensions(usize),

    #[error("Duplicate grouping dimension: {0}")]
    DuplicateDimension(Dimension),

    #[error("Unknown dimension key '{0}': must be one of surgery_type, carrier, billing_subcategory, patient, procedure_id")]
    UnknownDimension(String),

    #[error("Unknown sort field '{0}': must be one of group_value, procedure_count, total_charges, total_payments, collection_rate, avg_days_to_payment")]
    UnknownSortField(String),

    #[error("Invalid date range: date_from {date_from} is after date_to {date_to}")]
    InvalidDateRange {
        date_from: NaiveDate,
        date_to: NaiveDate,
    },

    #[error("Unsupported recovery horizon {0}: must be 1, 3, 6 or 12 months")]
    UnsupportedHorizon(u32),

    #[error("Rollup mismatch on '{group_value}' ({field}): parent has {parent}, children sum to {children}")]
    RollupMismatch {
        group_value: String,
        field: &'static str,
        parent: f64,
        children: f64,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
