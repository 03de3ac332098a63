//! The dynamic multi-dimensional grouping engine.
//!
//! Takes a flat record set and an ordered list of one to four dimensions and
//! builds a nested tree of [`AggregateNode`]s, one level per dimension. Every
//! node carries its own rollups; parents and children are built from the same
//! partitions, so counts and sums conserve exactly level to level.

use crate::error::{AnalyticsError, Result};
use crate::rates;
use crate::record::{Dimension, ProcedureRecord};
use crate::utils;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Grouping never nests deeper than this many dimensions.
pub const MAX_GROUP_DEPTH: usize = 4;

/// One grouped summary row, possibly with nested children for the remaining
/// dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateNode {
    /// The dimension this node groups by.
    pub dimension: Dimension,
    /// The (null-normalized) value of that dimension shared by every
    /// contributing record.
    pub group_value: String,
    pub procedure_count: usize,
    pub total_charges: f64,
    pub total_payments: f64,
    /// Payments over charges for this group, see [`rates::collection_rate`].
    pub collection_rate: f64,
    /// Mean of the known days-to-first-payment values, or null when no
    /// contributing record has been paid.
    pub avg_days_to_payment: Option<f64>,
    /// Human surgery-type label; set on surgery-type nodes whose records
    /// carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Earliest service date; set on patient nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_visit: Option<NaiveDate>,
    /// Latest service date; set on patient nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<NaiveDate>,
    /// Child nodes for the next dimension. Absent, not empty, at the leaf
    /// level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<AggregateNode>>,
}

/// Rejects dimension lists the engine cannot group by: empty lists, more
/// than [`MAX_GROUP_DEPTH`] entries, or repeated dimensions. Nothing is
/// silently truncated or deduplicated.
pub fn validate_dimensions(dimensions: &[Dimension]) -> Result<()> {
    if dimensions.is_empty() {
        return Err(AnalyticsError::EmptyDimensions);
    }
    if dimensions.len() > MAX_GROUP_DEPTH {
        return Err(AnalyticsError::TooManyDimensions(dimensions.len()));
    }

    let mut seen = HashSet::new();
    for &dimension in dimensions {
        if !seen.insert(dimension) {
            return Err(AnalyticsError::DuplicateDimension(dimension));
        }
    }

    Ok(())
}

/// Groups `records` by the ordered `dimensions`, producing one tree level per
/// dimension.
///
/// Partitions appear in first-seen order of the grouping value among the
/// input records, which makes output deterministic for a fixed input; callers
/// wanting a different order sort afterwards. Missing descriptive values
/// partition under `"Unknown"` rather than being dropped. An empty record set
/// produces an empty tree.
pub fn group(records: &[ProcedureRecord], dimensions: &[Dimension]) -> Result<Vec<AggregateNode>> {
    validate_dimensions(dimensions)?;
    let refs: Vec<&ProcedureRecord> = records.iter().collect();
    Ok(group_level(&refs, dimensions))
}

fn group_level(records: &[&ProcedureRecord], dimensions: &[Dimension]) -> Vec<AggregateNode> {
    let (&dimension, rest) = match dimensions.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    // 1. Partition by the current dimension, remembering first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut partitions: HashMap<String, Vec<&ProcedureRecord>> = HashMap::new();
    for &record in records {
        let value = record.dimension_value(dimension);
        if !partitions.contains_key(&value) {
            order.push(value.clone());
        }
        partitions.entry(value).or_default().push(record);
    }

    // 2. Roll up each partition, recursing for the remaining dimensions.
    order
        .into_iter()
        .map(|value| {
            let members = partitions.remove(&value).unwrap_or_default();
            let children = if rest.is_empty() {
                None
            } else {
                Some(group_level(&members, rest))
            };
            build_node(dimension, value, &members, children)
        })
        .collect()
}

fn build_node(
    dimension: Dimension,
    group_value: String,
    members: &[&ProcedureRecord],
    children: Option<Vec<AggregateNode>>,
) -> AggregateNode {
    let total_charges: f64 = members.iter().map(|r| r.total_charges).sum();
    let total_payments: f64 = members.iter().map(|r| r.total_payments).sum();

    let known_days: Vec<f64> = members
        .iter()
        .filter_map(|r| r.days_to_first_payment)
        .map(|days| days as f64)
        .collect();

    let type_name = if dimension == Dimension::SurgeryType {
        members.iter().find_map(|r| r.type_name.clone())
    } else {
        None
    };

    let (first_visit, last_visit) = if dimension == Dimension::Patient {
        (
            members.iter().map(|r| r.date_of_service).min(),
            members.iter().map(|r| r.date_of_service).max(),
        )
    } else {
        (None, None)
    };

    AggregateNode {
        dimension,
        group_value,
        procedure_count: members.len(),
        total_charges,
        total_payments,
        collection_rate: rates::collection_rate(total_charges, total_payments),
        avg_days_to_payment: utils::mean(&known_days).map(utils::round1),
        type_name,
        first_visit,
        last_visit,
        children,
    }
}

/// Checks the rollup-conservation invariant on a freshly grouped tree: every
/// non-leaf node's count equals the sum of its children's counts, and its
/// charge/payment sums match the children's within `tolerance`.
///
/// Display-filtered trees deliberately break this invariant, because
/// surviving parents keep their pre-filter rollups; run the verifier on the
/// output of [`group`], not of the filter engine.
pub fn verify_rollup_conservation(nodes: &[AggregateNode], tolerance: f64) -> Result<()> {
    for node in nodes {
        let children = match &node.children {
            Some(children) => children,
            None => continue,
        };

        let count_sum: usize = children.iter().map(|c| c.procedure_count).sum();
        if count_sum != node.procedure_count {
            return Err(AnalyticsError::RollupMismatch {
                group_value: node.group_value.clone(),
                field: "procedure_count",
                parent: node.procedure_count as f64,
                children: count_sum as f64,
            });
        }

        let charge_sum: f64 = children.iter().map(|c| c.total_charges).sum();
        if (charge_sum - node.total_charges).abs() > tolerance {
            return Err(AnalyticsError::RollupMismatch {
                group_value: node.group_value.clone(),
                field: "total_charges",
                parent: node.total_charges,
                children: charge_sum,
            });
        }

        let payment_sum: f64 = children.iter().map(|c| c.total_payments).sum();
        if (payment_sum - node.total_payments).abs() > tolerance {
            return Err(AnalyticsError::RollupMismatch {
                group_value: node.group_value.clone(),
                field: "total_payments",
                parent: node.total_payments,
                children: payment_sum,
            });
        }

        verify_rollup_conservation(children, tolerance)?;
    }

    Ok(())
}
