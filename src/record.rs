use crate::error::AnalyticsError;
use crate::rates;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display and grouping value substituted for any missing descriptive field.
///
/// Records with a null carrier, surgery type, subcategory or chart number are
/// never dropped from aggregation; they group under this label instead.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A categorical axis records can be grouped by.
///
/// The set is closed: matrix queries accept an ordered list of one to four
/// distinct dimensions, and anything outside this enumeration is rejected
/// during validation rather than coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Surgery-type code (`type_code`), e.g. "CATH" or "ORTHO".
    SurgeryType,
    /// Primary insurance carrier name.
    Carrier,
    /// Billing subcategory label.
    BillingSubcategory,
    /// Patient, identified by chart number.
    Patient,
    /// Individual procedure identifier (finest grain).
    ProcedureId,
}

impl Dimension {
    /// All dimensions, in the order the original dashboard lists them.
    pub const ALL: [Dimension; 5] = [
        Dimension::SurgeryType,
        Dimension::Carrier,
        Dimension::BillingSubcategory,
        Dimension::Patient,
        Dimension::ProcedureId,
    ];

    /// The wire key for this dimension, as used in query strings.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::SurgeryType => "surgery_type",
            Dimension::Carrier => "carrier",
            Dimension::BillingSubcategory => "billing_subcategory",
            Dimension::Patient => "patient",
            Dimension::ProcedureId => "procedure_id",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "surgery_type" => Ok(Dimension::SurgeryType),
            "carrier" => Ok(Dimension::Carrier),
            "billing_subcategory" => Ok(Dimension::BillingSubcategory),
            "patient" => Ok(Dimension::Patient),
            "procedure_id" => Ok(Dimension::ProcedureId),
            other => Err(AnalyticsError::UnknownDimension(other.to_string())),
        }
    }
}

/// Collection standing of a procedure, derived from its amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStatus {
    /// Charges billed, nothing received, nothing written off.
    Pending,
    /// Some payment received, but less than 95% of charges.
    Partial,
    /// Payments cover at least 95% of charges.
    Collected,
    /// No payments, but adjustments cover at least 95% of charges.
    WrittenOff,
}

/// One payment deposit applied to a procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentEvent {
    #[schemars(description = "Date the payment was deposited, YYYY-MM-DD")]
    pub date_of_deposit: NaiveDate,
    #[schemars(description = "Amount deposited. Positive for payments received")]
    pub amount: f64,
}

/// One billed surgical procedure, the flat input unit of every aggregation.
///
/// Descriptive fields are nullable and normalize to [`UNKNOWN_LABEL`] when
/// used as a grouping value; monetary fields default to zero so sums stay
/// well-defined. `procedure_id` is expected to be unique within a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcedureRecord {
    #[schemars(description = "Unique procedure identifier")]
    pub procedure_id: String,

    #[schemars(description = "Patient chart number. Null when the upload did not carry one")]
    pub chart_number: Option<i64>,

    #[schemars(description = "Date the procedure was performed, YYYY-MM-DD")]
    pub date_of_service: NaiveDate,

    #[schemars(description = "Surgery-type code, e.g. CATH")]
    pub type_code: Option<String>,

    #[schemars(description = "Human-readable surgery-type label, e.g. Cardiac Catheterization")]
    pub type_name: Option<String>,

    #[schemars(description = "Primary insurance carrier name")]
    pub carrier: Option<String>,

    #[schemars(description = "Billing subcategory label")]
    pub billing_subcategory: Option<String>,

    #[serde(default)]
    #[schemars(description = "Total amount billed. Non-negative")]
    pub total_charges: f64,

    #[serde(default)]
    #[schemars(description = "Total amount received. May exceed charges; that is flagged by anomaly detection, not rejected")]
    pub total_payments: f64,

    #[serde(default)]
    #[schemars(description = "Total amount adjusted or written off")]
    pub total_adjustments: f64,

    #[schemars(description = "Days from service to the first payment deposit. Null when never paid")]
    pub days_to_first_payment: Option<i64>,

    #[serde(default)]
    #[schemars(description = "Individual payment deposits, used for recovery-horizon math")]
    pub payments: Vec<PaymentEvent>,
}

impl ProcedureRecord {
    /// A record with the given identity and service date and everything else
    /// empty or zero. Fill the rest with struct-update syntax.
    pub fn new(procedure_id: impl Into<String>, date_of_service: NaiveDate) -> Self {
        Self {
            procedure_id: procedure_id.into(),
            chart_number: None,
            date_of_service,
            type_code: None,
            type_name: None,
            carrier: None,
            billing_subcategory: None,
            total_charges: 0.0,
            total_payments: 0.0,
            total_adjustments: 0.0,
            days_to_first_payment: None,
            payments: Vec::new(),
        }
    }

    /// This record's grouping value for `dimension`, with nulls normalized
    /// to [`UNKNOWN_LABEL`].
    pub fn dimension_value(&self, dimension: Dimension) -> String {
        self.dimension_value_opt(dimension)
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
    }

    /// The raw grouping value for `dimension`, `None` when the record has no
    /// value for it.
    pub fn dimension_value_opt(&self, dimension: Dimension) -> Option<String> {
        match dimension {
            Dimension::SurgeryType => self.type_code.clone(),
            Dimension::Carrier => self.carrier.clone(),
            Dimension::BillingSubcategory => self.billing_subcategory.clone(),
            Dimension::Patient => self.chart_number.map(|chart| chart.to_string()),
            Dimension::ProcedureId => Some(self.procedure_id.clone()),
        }
    }

    /// Payments as a percentage of charges for this record alone.
    pub fn collection_rate(&self) -> f64 {
        rates::collection_rate(self.total_charges, self.total_payments)
    }

    /// Charges not yet covered by payments. Negative when overpaid.
    pub fn outstanding_balance(&self) -> f64 {
        self.total_charges - self.total_payments
    }

    /// Sum of payment deposits made on or before `cutoff`.
    pub fn payments_within(&self, cutoff: NaiveDate) -> f64 {
        self.payments
            .iter()
            .filter(|event| event.date_of_deposit <= cutoff)
            .map(|event| event.amount)
            .sum()
    }

    /// Collection standing. A procedure counts as collected or written off
    /// once payments or adjustments cover 95% of charges.
    pub fn status(&self) -> ProcedureStatus {
        if self.total_charges > 0.0 {
            if self.total_payments >= self.total_charges * 0.95 {
                ProcedureStatus::Collected
            } else if self.total_payments > 0.0 {
                ProcedureStatus::Partial
            } else if self.total_adjustments >= self.total_charges * 0.95 {
                ProcedureStatus::WrittenOff
            } else {
                ProcedureStatus::Pending
            }
        } else {
            ProcedureStatus::Pending
        }
    }
}
