//! # Surgery Billing Analytics
//!
//! An aggregation engine for surgical billing data: dynamic multi-dimensional
//! grouping, collection and recovery rates, trend and aging reports, and
//! anomaly sweeps over normalized procedure records.
//!
//! ## Core Concepts
//!
//! - **Procedure Record**: One surgery's rolled-up billing position (charges, payments, adjustments) plus its payment timeline
//! - **Dimension**: A grouping axis (surgery type, carrier, billing subcategory, patient, procedure); a query nests one to four of them
//! - **Aggregate Tree**: Nested groups in first-seen order, every node carrying its own rollups; records missing a value group under "Unknown"
//! - **Filter vs Selection**: The record filter scopes the data before aggregation and changes every number downstream; the selection prunes the finished tree for display and never changes rollups or the summary
//! - **Recovery Horizons**: Payments measured 1, 3, 6 and 12 months after service, over records old enough for the horizon to have fully elapsed
//!
//! ## Example
//!
//! ```rust,ignore
//! use surgery_billing_analytics::*;
//! use chrono::NaiveDate;
//!
//! let rows = vec![
//!     TransactionRow {
//!         procedure_id: "PROC-001".to_string(),
//!         chart_number: Some(1001),
//!         date_of_service: NaiveDate::from_ymd_opt(2024, 1, 15),
//!         date_of_deposit: None,
//!         type_code: Some("CATH".to_string()),
//!         surgery_type: Some("Cardiac Catheterization".to_string()),
//!         carrier: Some("Aetna".to_string()),
//!         billing_subcategory: Some("Facility".to_string()),
//!         charges: 1500.0,
//!         total_payments: 0.0,
//!         adjustments: 0.0,
//!     },
//!     TransactionRow {
//!         procedure_id: "PROC-001".to_string(),
//!         chart_number: Some(1001),
//!         date_of_service: NaiveDate::from_ymd_opt(2024, 1, 15),
//!         date_of_deposit: NaiveDate::from_ymd_opt(2024, 2, 20),
//!         type_code: Some("CATH".to_string()),
//!         surgery_type: None,
//!         carrier: Some("Aetna".to_string()),
//!         billing_subcategory: None,
//!         charges: 0.0,
//!         total_payments: 800.0,
//!         adjustments: 0.0,
//!     },
//! ];
//!
//! let records = build_procedure_records(&rows);
//! let engine = AnalyticsEngine::new(&records);
//!
//! let query = AnalyticsQuery::new(vec![Dimension::SurgeryType, Dimension::Carrier]);
//! let response = engine.run(&query)?;
//! println!("{}", serde_json::to_string_pretty(&response.data)?);
//! ```

pub mod anomaly;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod ingestion;
pub mod query;
pub mod rates;
pub mod record;
pub mod sort;
pub mod summary;
pub mod trends;
pub mod utils;

pub use anomaly::{
    AnomalyDetector, AnomalyReport, CarrierAnomalySummary, DuplicateReport, OverpaymentReport,
    PatientAnomalySummary, Severity, StaleClaimReport, DEFAULT_STALE_AFTER_DAYS,
};
pub use catalog::{build_catalog, dimension_options, DateRange, FilterCatalog, FilterOption};
pub use error::{AnalyticsError, Result};
pub use filter::{filter, FilterSelection};
pub use grouping::{
    group, validate_dimensions, verify_rollup_conservation, AggregateNode, MAX_GROUP_DEPTH,
};
pub use ingestion::*;
pub use query::*;
pub use rates::{
    analyze_recovery, collection_rate, recovery_rate, RecoveryAnalysis, RecoveryWindow,
    RECOVERY_HORIZONS,
};
pub use record::{Dimension, PaymentEvent, ProcedureRecord, ProcedureStatus, UNKNOWN_LABEL};
pub use sort::{sort_siblings, SortDirection, SortField, SortSpec};
pub use summary::{dashboard_metrics, summarize, DashboardMetrics, Summary};
pub use trends::{
    aging_report, days_to_payment_distribution, trends, AgingBucket, DaysToPaymentDistribution,
    DistributionBucket, Granularity, TrendPoint,
};
pub use utils::*;

use chrono::NaiveDate;
use log::info;

/// One-stop surface over a loaded record set. Construction is free; every
/// report borrows the same records.
pub struct AnalyticsEngine<'a> {
    records: &'a [ProcedureRecord],
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(records: &'a [ProcedureRecord]) -> Self {
        Self { records }
    }

    /// Answers a dynamic grouping query.
    pub fn run(&self, query: &AnalyticsQuery) -> Result<AnalyticsResponse> {
        info!(
            "running analytics query over {} records: {:?}",
            self.records.len(),
            query.dimensions
        );
        query::run_query(self.records, query)
    }

    /// Headline practice metrics over every record.
    pub fn dashboard(&self) -> DashboardMetrics {
        summary::dashboard_metrics(self.records)
    }

    /// Recovery horizons, overall and by surgery type and carrier.
    pub fn recovery(&self, query: &RecoveryQuery) -> Result<RecoveryReport> {
        query::recovery_report(self.records, query)
    }

    /// Projected recovery for procedures like these, from their history.
    pub fn expected_recovery(
        &self,
        type_code: Option<&str>,
        carrier: Option<&str>,
        as_of: NaiveDate,
    ) -> ExpectedRecovery {
        query::expected_recovery(self.records, type_code, carrier, as_of)
    }

    /// Charges, payments and collection rate per calendar period.
    pub fn trends(&self, granularity: Granularity) -> Vec<TrendPoint> {
        trends::trends(self.records, granularity)
    }

    /// How long payment takes, bucketed by days from service.
    pub fn days_to_payment(&self) -> DaysToPaymentDistribution {
        trends::days_to_payment_distribution(self.records)
    }

    /// Outstanding balances bucketed by claim age.
    pub fn aging(&self, as_of: NaiveDate) -> Vec<AgingBucket> {
        trends::aging_report(self.records, as_of)
    }

    /// Every anomaly check in one sweep.
    pub fn anomalies(&self, as_of: NaiveDate) -> AnomalyReport {
        AnomalyDetector::new(as_of).detect_all(self.records)
    }

    /// Filter-picker options observed in the records.
    pub fn catalog(&self) -> FilterCatalog {
        catalog::build_catalog(self.records)
    }
}
