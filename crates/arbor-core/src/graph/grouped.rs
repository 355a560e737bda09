//! Items nested under type pseudo-roots.
//!
//! The grouped forest shows items organised by category while keeping the
//! items' own parent/subtype nesting intact:
//!
//! ```text
//! Vehicles            (type group)
//!   Trucks            (type group, parent type: Vehicles)
//!     truck-7         (item, type: Trucks)
//!       trailer-2     (item, parent: truck-7)
//!   van-1             (item, type: Vehicles)
//! Uncategorized       (reserved group)
//!   loose-item
//! ```
//!
//! # Algorithm
//!
//! 1. One pseudo-root per type record, nested among themselves by the same
//!    parent pass the plain builder uses, plus the reserved `uncategorized`
//!    group. Type groups caught in a type-parent cycle are lifted to the top
//!    level so that their items stay visible.
//! 2. The item forest is built exactly as by
//!    [`build_tree`](super::builder::build_tree).
//! 3. Each root item is attached to the group for its `type_id`; items with
//!    no type, or a type that is not in the catalog, go to `uncategorized`.
//!    Inside a group, child type groups come before items.
//! 4. Type groups with no item anywhere below them are pruned, together with
//!    ancestors that become empty. `uncategorized` is pruned by the same rule.
//! 5. Surviving top-level groups are returned in catalog order, with
//!    `uncategorized` last.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::HashMap;

use super::builder::{
    BuildError, check_ids, collect_roots, parent_pass, place_records, unreachable_slots,
};
use super::forest::{Forest, Node, NodeIndex};
use crate::config::GroupingConfig;
use crate::model::{Record, TypeRecord};

/// Grouped forest with the default `uncategorized` group.
pub fn build_grouped_tree(items: &[Record], types: &[TypeRecord]) -> Forest {
    build_grouped_tree_with(items, types, &GroupingConfig::default())
}

/// Grouped forest, degrading to an empty forest on malformed input.
pub fn build_grouped_tree_with(
    items: &[Record],
    types: &[TypeRecord],
    grouping: &GroupingConfig,
) -> Forest {
    match try_build_grouped_tree(items, types, grouping) {
        Ok(forest) => forest,
        Err(e) => {
            tracing::warn!(code = %e.code(), error = %e, "grouped build failed, rendering empty forest");
            Forest::empty()
        }
    }
}

/// Grouped forest.
///
/// # Errors
///
/// Returns [`BuildError`] when an item or type id is empty or repeated
/// within its own catalog.
pub fn try_build_grouped_tree(
    items: &[Record],
    types: &[TypeRecord],
    grouping: &GroupingConfig,
) -> Result<Forest, BuildError> {
    check_ids(items)?;
    check_ids(types)?;

    let mut forest = Forest::with_capacity(items.len() + types.len() + 1);

    // Item forest first, so record ids are indexed.
    let item_roots = place_records(&mut forest, items);

    // Type skeleton.
    let type_slots: Vec<NodeIndex> = types
        .iter()
        .map(|t| forest.push(Node::type_group(t)))
        .collect();
    let type_lookup: HashMap<&str, NodeIndex> = types
        .iter()
        .zip(&type_slots)
        .map(|(t, slot)| (t.id.as_str(), *slot))
        .collect();
    let mut processed = vec![false; types.len()];
    let mut is_root = vec![false; types.len()];
    parent_pass(
        &mut forest,
        types,
        &type_slots,
        &type_lookup,
        &mut processed,
        &mut is_root,
    );
    for stranded in unreachable_slots(&forest, &type_slots, &is_root) {
        tracing::debug!(type_id = %forest[stranded].id, "lifting type group out of a type cycle");
        if let Some(pos) = type_slots.iter().position(|s| *s == stranded) {
            is_root[pos] = true;
        }
    }
    let type_roots = collect_roots(&type_slots, &is_root);

    let uncategorized = forest.push(Node::uncategorized(
        &grouping.uncategorized_id,
        &grouping.uncategorized_title,
    ));

    // Attach root items to their groups.
    for item in item_roots {
        let group = forest[item]
            .type_id
            .as_deref()
            .filter(|t| !t.is_empty())
            .and_then(|t| type_lookup.get(t).copied())
            .unwrap_or(uncategorized);
        forest.node_mut(group).children.push(item);
    }

    // Prune empty groups.
    let groups: Vec<NodeIndex> = type_slots
        .iter()
        .copied()
        .chain(std::iter::once(uncategorized))
        .collect();
    let has_items = groups_with_items(&forest, &groups);
    let keeps = |idx: NodeIndex| -> bool {
        !forest[idx].kind.is_pseudo() || has_items[idx.index()]
    };
    let pruned_children: Vec<(NodeIndex, Vec<NodeIndex>)> = type_slots
        .iter()
        .map(|slot| {
            let kept = forest[*slot]
                .children
                .iter()
                .copied()
                .filter(|c| keeps(*c))
                .collect();
            (*slot, kept)
        })
        .collect();
    let mut roots: Vec<NodeIndex> = type_roots.into_iter().filter(|r| keeps(*r)).collect();
    if keeps(uncategorized) {
        roots.push(uncategorized);
    }
    let pruned = type_slots.iter().filter(|s| !keeps(**s)).count();

    for (slot, kept) in pruned_children {
        forest.node_mut(slot).children = kept;
    }
    forest.set_roots(roots);

    tracing::debug!(
        items = items.len(),
        types = types.len(),
        pruned,
        groups = forest.len(),
        "built grouped forest"
    );
    Ok(forest)
}

/// Marks, per arena slot, the groups with a record somewhere below them
/// through nested groups.
///
/// Iterated to a fixpoint, so every member of a type cycle sees the items
/// hung under any other member.
fn groups_with_items(forest: &Forest, groups: &[NodeIndex]) -> Vec<bool> {
    let mut found = vec![false; forest.node_count()];
    let mut changed = true;
    while changed {
        changed = false;
        for group in groups {
            if found[group.index()] {
                continue;
            }
            let has = forest[*group]
                .children
                .iter()
                .any(|c| !forest[*c].kind.is_pseudo() || found[c.index()]);
            if has {
                found[group.index()] = true;
                changed = true;
            }
        }
    }
    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
