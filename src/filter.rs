//! Post-grouping display filtering.
//!
//! A [`FilterSelection`] narrows which group values stay visible at each tree
//! level. Filtering is display-only by design: surviving parents keep the
//! rollups they were grouped with, and dataset-wide totals come from the
//! summary aggregator instead, so a narrowed view never misstates the grand
//! totals it sits under.

use crate::grouping::AggregateNode;
use crate::record::Dimension;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Per-dimension sets of group values to keep.
///
/// An empty set means "nothing selected, show nothing" at that dimension's
/// level. A set holding every observed value filters nothing. A dimension
/// with no entry at all is passed through unchanged, so callers only list the
/// dimensions they actually narrow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FilterSelection {
    allowed: HashMap<Dimension, HashSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allowed values for one dimension, replacing any previous
    /// selection for it.
    pub fn select<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }

    /// The selection recorded for `dimension`, if any.
    pub fn allowed(&self, dimension: Dimension) -> Option<&HashSet<String>> {
        self.allowed.get(&dimension)
    }

    /// True when no dimension has a recorded selection.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Prunes a grouped tree top-down by `selection`.
///
/// At each level, nodes survive when their `group_value` is allowed for that
/// level's dimension; an empty selection set drops the whole level without
/// recursing. After recursion, a non-leaf parent whose children were all
/// filtered away is dropped too; true leaves are kept or dropped solely by
/// their own level's selection.
///
/// The input tree is left untouched and surviving nodes keep their original
/// pre-filter rollups. A selection containing every value observed at a level
/// therefore reproduces that level exactly. Filtering is monotonic: it only
/// ever removes nodes.
pub fn filter(
    tree: &[AggregateNode],
    dimensions: &[Dimension],
    selection: &FilterSelection,
) -> Vec<AggregateNode> {
    filter_level(tree, dimensions, selection, 0)
}

fn filter_level(
    nodes: &[AggregateNode],
    dimensions: &[Dimension],
    selection: &FilterSelection,
    level: usize,
) -> Vec<AggregateNode> {
    let allowed = dimensions
        .get(level)
        .and_then(|&dimension| selection.allowed(dimension));

    if let Some(values) = allowed {
        if values.is_empty() {
            return Vec::new();
        }
    }

    let mut kept = Vec::new();
    for node in nodes {
        if let Some(values) = allowed {
            if !values.contains(&node.group_value) {
                continue;
            }
        }

        let children = node
            .children
            .as_ref()
            .map(|children| filter_level(children, dimensions, selection, level + 1));

        if let Some(ref remaining) = children {
            if remaining.is_empty() {
                continue;
            }
        }

        let mut survivor = node.clone();
        survivor.children = children;
        kept.push(survivor);
    }

    kept
}
