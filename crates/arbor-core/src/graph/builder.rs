//! Flat records to forest.
//!
//! # Algorithm
//!
//! 1. Every record gets one arena node, in input order.
//! 2. **Subtype pass** (runs first, takes precedence): a record with a
//!    `subtype_of_id` is attached under that record's `sub_types` when the
//!    target exists and is not the record itself; otherwise it is promoted to
//!    root. Either way the record is done, and its `parent_ids` are not
//!    consulted.
//! 3. **Parent pass**: each remaining record is attached once under every
//!    distinct parent id that exists and is not itself. With no valid parent
//!    (or no parents at all) it becomes a root.
//! 4. Roots are returned in input order.
//!
//! Dangling and self references are never errors; they resolve by orphan
//! promotion. A record that only takes part in a pure parent cycle has
//! parents and is therefore not a root, so it is not reachable from the
//! forest. Callers that care can scan for that with
//! [`find_parent_cycles`](super::cycles::find_parent_cycles).
//!
//! # Failure policy
//!
//! [`build_tree`] never fails. Structurally malformed input (an empty id or a
//! repeated id) is reported by [`try_build_tree`]; the infallible wrapper logs
//! it and renders an empty forest so the surrounding UI stays interactive.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::HashMap;

use super::forest::{Forest, Node, NodeIndex};
use crate::error::ErrorCode;
use crate::model::{ParentEdges, Record};

/// Structurally malformed record batches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("record at position {position} has an empty id")]
    MissingId { position: usize },
    #[error("id '{id}' appears more than once (positions {first} and {second})")]
    DuplicateId {
        id: String,
        first: usize,
        second: usize,
    },
}

impl BuildError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingId { .. } | Self::DuplicateId { .. } => ErrorCode::MalformedRecords,
        }
    }
}

/// Build the forest for `records`, degrading to an empty forest on malformed
/// input.
pub fn build_tree(records: &[Record]) -> Forest {
    match try_build_tree(records) {
        Ok(forest) => forest,
        Err(e) => {
            tracing::warn!(code = %e.code(), error = %e, "hierarchy build failed, rendering empty forest");
            Forest::empty()
        }
    }
}

/// Build the forest for `records`.
///
/// # Errors
///
/// Returns [`BuildError`] when an id is empty or repeated.
pub fn try_build_tree(records: &[Record]) -> Result<Forest, BuildError> {
    check_ids(records)?;

    let mut forest = Forest::with_capacity(records.len());
    let roots = place_records(&mut forest, records);
    forest.set_roots(roots);

    tracing::debug!(
        records = records.len(),
        roots = forest.len(),
        "built hierarchy forest"
    );
    Ok(forest)
}

/// Reject empty and repeated ids.
pub(crate) fn check_ids<R: ParentEdges>(records: &[R]) -> Result<(), BuildError> {
    let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        if record.id().is_empty() {
            return Err(BuildError::MissingId { position });
        }
        if let Some(&first) = first_seen.get(record.id()) {
            return Err(BuildError::DuplicateId {
                id: record.id().to_string(),
                first,
                second: position,
            });
        }
        first_seen.insert(record.id(), position);
    }
    Ok(())
}

/// Push one node per record, run both passes, and return the root slots in
/// input order.
pub(crate) fn place_records(forest: &mut Forest, records: &[Record]) -> Vec<NodeIndex> {
    let slots: Vec<NodeIndex> = records
        .iter()
        .map(|record| forest.push(Node::from_record(record)))
        .collect();
    let lookup: HashMap<&str, NodeIndex> = records
        .iter()
        .zip(&slots)
        .map(|(record, slot)| (record.id.as_str(), *slot))
        .collect();

    let mut processed = vec![false; records.len()];
    let mut is_root = vec![false; records.len()];
    let mut orphans = 0usize;

    // Subtype pass.
    for (i, record) in records.iter().enumerate() {
        let Some(target) = record.subtype_target() else {
            continue;
        };
        match lookup.get(target) {
            Some(&parent) if target != record.id => {
                forest.node_mut(parent).sub_types.push(slots[i]);
            }
            _ => {
                is_root[i] = true;
                orphans += 1;
            }
        }
        processed[i] = true;
    }

    orphans += parent_pass(forest, records, &slots, &lookup, &mut processed, &mut is_root);

    if orphans > 0 {
        tracing::debug!(orphans, "promoted records with invalid references to root");
    }
    log_unreachable(forest, &slots, &is_root);

    collect_roots(&slots, &is_root)
}

/// Attach every unprocessed record under each valid parent; promote the rest.
///
/// Returns how many records were promoted because all of their parent ids
/// were invalid.
pub(crate) fn parent_pass<R: ParentEdges>(
    forest: &mut Forest,
    records: &[R],
    slots: &[NodeIndex],
    lookup: &HashMap<&str, NodeIndex>,
    processed: &mut [bool],
    is_root: &mut [bool],
) -> usize {
    let mut orphans = 0usize;

    for (i, record) in records.iter().enumerate() {
        if processed[i] {
            continue;
        }
        if record.parent_ids().is_empty() {
            is_root[i] = true;
            continue;
        }

        let mut attached: Vec<NodeIndex> = Vec::new();
        for parent_id in record.parent_ids() {
            if parent_id == record.id() {
                continue;
            }
            let Some(&parent) = lookup.get(parent_id.as_str()) else {
                continue;
            };
            if attached.contains(&parent) {
                continue;
            }
            attached.push(parent);
            forest.node_mut(parent).children.push(slots[i]);
        }

        if attached.is_empty() {
            is_root[i] = true;
            orphans += 1;
        } else {
            processed[i] = true;
        }
    }

    orphans
}

pub(crate) fn collect_roots(slots: &[NodeIndex], is_root: &[bool]) -> Vec<NodeIndex> {
    slots
        .iter()
        .zip(is_root)
        .filter_map(|(slot, root)| root.then_some(*slot))
        .collect()
}

/// Slots among `slots` that no root reaches.
pub(crate) fn unreachable_slots(
    forest: &Forest,
    slots: &[NodeIndex],
    is_root: &[bool],
) -> Vec<NodeIndex> {
    let mut seen = vec![false; forest.node_count()];
    let mut stack: Vec<NodeIndex> = collect_roots(slots, is_root);
    while let Some(idx) = stack.pop() {
        if std::mem::replace(&mut seen[idx.index()], true) {
            continue;
        }
        let node = &forest[idx];
        stack.extend(node.sub_types.iter().chain(&node.children).copied());
    }
    slots.iter().copied().filter(|s| !seen[s.index()]).collect()
}

fn log_unreachable(forest: &Forest, slots: &[NodeIndex], is_root: &[bool]) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let hidden = unreachable_slots(forest, slots, is_root).len();
    if hidden > 0 {
        tracing::debug!(hidden, "records caught in parent cycles are not reachable from any root");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
