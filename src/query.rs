//! The JSON-facing query types and the pipelines that answer them.
//!
//! A query carries two filters with different jobs. The [`RecordFilter`]
//! scopes which records exist before any aggregation, so it changes every
//! number downstream. The [`FilterSelection`] prunes the grouped tree for
//! display after rollups are computed, so the summary stays a statement
//! about the whole scoped data set no matter which branches are shown.

use crate::error::{AnalyticsError, Result};
use crate::filter::{self, FilterSelection};
use crate::grouping::{self, AggregateNode};
use crate::rates::{self, RecoveryAnalysis};
use crate::record::{Dimension, ProcedureRecord};
use crate::sort::{self, SortSpec};
use crate::summary::{self, Summary};
use chrono::{NaiveDate, Utc};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Narrows the record set before aggregation. Conditions are conjunctive;
/// `None` means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecordFilter {
    #[schemars(description = "Earliest date of service to include, inclusive")]
    pub date_from: Option<NaiveDate>,
    #[schemars(description = "Latest date of service to include, inclusive")]
    pub date_to: Option<NaiveDate>,
    #[schemars(description = "Keep only this patient chart number")]
    pub chart_number: Option<i64>,
    #[schemars(description = "Keep only this surgery-type code")]
    pub type_code: Option<String>,
    #[schemars(description = "Keep only this insurance carrier")]
    pub carrier: Option<String>,
    #[schemars(description = "Keep only this billing subcategory")]
    pub billing_subcategory: Option<String>,
}

impl RecordFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(date_from), Some(date_to)) = (self.date_from, self.date_to) {
            if date_from > date_to {
                return Err(AnalyticsError::InvalidDateRange { date_from, date_to });
            }
        }
        Ok(())
    }

    pub fn matches(&self, record: &ProcedureRecord) -> bool {
        if let Some(date_from) = self.date_from {
            if record.date_of_service < date_from {
                return false;
            }
        }
        if let Some(date_to) = self.date_to {
            if record.date_of_service > date_to {
                return false;
            }
        }
        if let Some(chart) = self.chart_number {
            if record.chart_number != Some(chart) {
                return false;
            }
        }
        if let Some(code) = &self.type_code {
            if record.type_code.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if let Some(carrier) = &self.carrier {
            if record.carrier.as_deref() != Some(carrier.as_str()) {
                return false;
            }
        }
        if let Some(subcategory) = &self.billing_subcategory {
            if record.billing_subcategory.as_deref() != Some(subcategory.as_str()) {
                return false;
            }
        }
        true
    }

    /// Clones the records that pass, rejecting an inverted date range.
    pub fn apply(&self, records: &[ProcedureRecord]) -> Result<Vec<ProcedureRecord>> {
        self.validate()?;
        Ok(records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect())
    }
}

/// One dynamic grouping request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsQuery {
    #[schemars(description = "Dimensions to nest, outermost first. One to four, no repeats")]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    #[schemars(description = "Record-level scope applied before any aggregation")]
    pub filter: RecordFilter,
    #[serde(default)]
    #[schemars(
        description = "Group values to keep per dimension, applied to the finished tree. Dimensions not named pass through untouched"
    )]
    pub selection: FilterSelection,
    #[serde(default)]
    #[schemars(description = "Ordering for the top-level groups. Omitted means first-seen order")]
    pub sort: Option<SortSpec>,
}

impl AnalyticsQuery {
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalyticsQuery)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

/// A grouped tree plus the summary over everything the record filter kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResponse {
    pub data: Vec<AggregateNode>,
    pub summary: Summary,
}

/// Answers a grouping query end to end: scope, group, prune, sort.
pub fn run_query(records: &[ProcedureRecord], query: &AnalyticsQuery) -> Result<AnalyticsResponse> {
    grouping::validate_dimensions(&query.dimensions)?;
    let scoped = query.filter.apply(records)?;
    debug!(
        "query keeps {} of {} records across {} dimensions",
        scoped.len(),
        records.len(),
        query.dimensions.len()
    );

    let mut data = grouping::group(&scoped, &query.dimensions)?;
    data = filter::filter(&data, &query.dimensions, &query.selection);
    if let Some(sort_spec) = query.sort {
        sort::sort_siblings(&mut data, sort_spec.field, sort_spec.direction);
    }

    Ok(AnalyticsResponse {
        data,
        summary: summary::summarize(&scoped),
    })
}

/// Scope and evaluation date for a recovery report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RecoveryQuery {
    pub filter: RecordFilter,
    #[schemars(description = "Evaluation date for horizon eligibility. Omitted means today")]
    pub as_of: Option<NaiveDate>,
}

/// Recovery percentages for one group value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryBreakdownRow {
    pub group_value: String,
    pub recovery_1_month: f64,
    pub recovery_3_month: f64,
    pub recovery_6_month: f64,
    pub recovery_12_month: f64,
    pub overall_collection_rate: f64,
    pub total_charges: f64,
    pub total_payments: f64,
}

impl RecoveryBreakdownRow {
    fn from_analysis(group_value: String, analysis: &RecoveryAnalysis) -> Self {
        Self {
            group_value,
            recovery_1_month: analysis.recovery_1_month.percent,
            recovery_3_month: analysis.recovery_3_month.percent,
            recovery_6_month: analysis.recovery_6_month.percent,
            recovery_12_month: analysis.recovery_12_month.percent,
            overall_collection_rate: analysis.overall_collection_rate,
            total_charges: analysis.total_charges,
            total_payments: analysis.total_payments,
        }
    }
}

/// Recovery over the scoped records, overall and broken down by surgery type
/// and by carrier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryReport {
    pub as_of: NaiveDate,
    pub overall: RecoveryAnalysis,
    pub by_surgery_type: Vec<RecoveryBreakdownRow>,
    pub by_carrier: Vec<RecoveryBreakdownRow>,
}

pub fn recovery_report(
    records: &[ProcedureRecord],
    query: &RecoveryQuery,
) -> Result<RecoveryReport> {
    let scoped = query.filter.apply(records)?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    debug!("recovery report over {} records as of {}", scoped.len(), as_of);

    Ok(RecoveryReport {
        as_of,
        overall: rates::analyze_recovery(&scoped, as_of),
        by_surgery_type: recovery_breakdown(&scoped, Dimension::SurgeryType, as_of),
        by_carrier: recovery_breakdown(&scoped, Dimension::Carrier, as_of),
    })
}

/// One recovery analysis per distinct value of `dimension`, in the order
/// values first appear. Records with no value for the dimension pool under
/// `"Unknown"`, same as the grouping engine; no record is dropped.
pub fn recovery_breakdown(
    records: &[ProcedureRecord],
    dimension: Dimension,
    as_of: NaiveDate,
) -> Vec<RecoveryBreakdownRow> {
    let mut order: Vec<String> = Vec::new();
    let mut partitions: HashMap<String, Vec<ProcedureRecord>> = HashMap::new();

    for record in records {
        let value = record.dimension_value(dimension);
        if !partitions.contains_key(&value) {
            order.push(value.clone());
        }
        partitions.entry(value).or_default().push(record.clone());
    }

    order
        .into_iter()
        .map(|value| {
            let members = partitions.remove(&value).unwrap_or_default();
            let analysis = rates::analyze_recovery(&members, as_of);
            RecoveryBreakdownRow::from_analysis(value, &analysis)
        })
        .collect()
}

/// Historical recovery echoed as the expectation for procedures like these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedRecovery {
    pub expected_1_month_percent: f64,
    pub expected_3_month_percent: f64,
    pub expected_6_month_percent: f64,
    pub expected_12_month_percent: f64,
    pub overall_collection_rate: f64,
    /// Records the expectation was measured on, at the longest horizon.
    pub based_on_procedures: usize,
    pub type_code: Option<String>,
    pub carrier: Option<String>,
}

pub fn expected_recovery(
    records: &[ProcedureRecord],
    type_code: Option<&str>,
    carrier: Option<&str>,
    as_of: NaiveDate,
) -> ExpectedRecovery {
    let scoped: Vec<ProcedureRecord> = records
        .iter()
        .filter(|record| {
            type_code.map_or(true, |code| record.type_code.as_deref() == Some(code))
                && carrier.map_or(true, |name| record.carrier.as_deref() == Some(name))
        })
        .cloned()
        .collect();

    let analysis = rates::analyze_recovery(&scoped, as_of);
    ExpectedRecovery {
        expected_1_month_percent: analysis.recovery_1_month.percent,
        expected_3_month_percent: analysis.recovery_3_month.percent,
        expected_6_month_percent: analysis.recovery_6_month.percent,
        expected_12_month_percent: analysis.recovery_12_month.percent,
        overall_collection_rate: analysis.overall_collection_rate,
        based_on_procedures: analysis.recovery_12_month.procedures,
        type_code: type_code.map(str::to_string),
        carrier: carrier.map(str::to_string),
    }
}
