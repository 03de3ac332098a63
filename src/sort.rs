use crate::error::AnalyticsError;
use crate::grouping::AggregateNode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A sortable field of an [`AggregateNode`]. `GroupValue` compares
/// lexicographically, everything else numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    GroupValue,
    ProcedureCount,
    TotalCharges,
    TotalPayments,
    CollectionRate,
    AvgDaysToPayment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// A field plus direction; defaults to charges descending, the order the
/// original dashboard presents every breakdown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SortSpec {
    pub field: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::TotalCharges,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for SortField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group_value" => Ok(SortField::GroupValue),
            "procedure_count" => Ok(SortField::ProcedureCount),
            "total_charges" => Ok(SortField::TotalCharges),
            "total_payments" => Ok(SortField::TotalPayments),
            "collection_rate" => Ok(SortField::CollectionRate),
            "avg_days_to_payment" => Ok(SortField::AvgDaysToPayment),
            other => Err(AnalyticsError::UnknownSortField(other.to_string())),
        }
    }
}

/// Orders one sibling slice in place. The sort is shallow (children keep
/// their own order; re-invoke per level for multi-level sorting) and stable,
/// so ties keep the grouping engine's first-seen order.
pub fn sort_siblings(nodes: &mut [AggregateNode], field: SortField, direction: SortDirection) {
    nodes.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare(a: &AggregateNode, b: &AggregateNode, field: SortField) -> Ordering {
    match field {
        SortField::GroupValue => a.group_value.cmp(&b.group_value),
        SortField::ProcedureCount => a.procedure_count.cmp(&b.procedure_count),
        SortField::TotalCharges => compare_f64(a.total_charges, b.total_charges),
        SortField::TotalPayments => compare_f64(a.total_payments, b.total_payments),
        SortField::CollectionRate => compare_f64(a.collection_rate, b.collection_rate),
        SortField::AvgDaysToPayment => a
            .avg_days_to_payment
            .partial_cmp(&b.avg_days_to_payment)
            .unwrap_or(Ordering::Equal),
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
