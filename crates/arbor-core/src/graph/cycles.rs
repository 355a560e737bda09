//! Cycle prevention for parent and subtype edits.
//!
//! # Overview
//!
//! Records may only be edited in ways that keep both edge kinds acyclic. The
//! guard is consulted synchronously before an edit that would add an entry to
//! `parent_ids` (or set `subtype_of_id`) is committed. On a positive answer the
//! caller rejects the edit and leaves the record unchanged.
//!
//! # Design
//!
//! - **Iterative ancestor walk**: starting at the candidate parent, follow
//!   edges upward with an explicit frontier. If the walk reaches the node
//!   being edited, the new edge would close a loop.
//! - **Visited set**: every id is expanded at most once, so the walk
//!   terminates even when the stored records already contain a cycle.
//! - **Depth bound**: the walk gives up once it reaches an ancestor more than
//!   `max_depth` levels above the candidate, and reports a cycle. Width does
//!   not count: a DAG with many ancestors on few levels is walked in full.
//!
//! Dangling parent ids are simply dead ends for the walk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use arbor_core::graph::cycles::would_create_cycle;
//!
//! if would_create_cycle("shelf", "book", &records) {
//!     return Err(/* surface diagnostic, leave record unchanged */);
//! }
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::ErrorCode;
use crate::model::{ParentEdges, Record};

/// Default upper bound on ancestor-walk expansions.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Errors and reports
// ---------------------------------------------------------------------------

/// Which edge kind an edit would add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Parent,
    Subtype,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("parent"),
            Self::Subtype => f.write_str("subtype"),
        }
    }
}

/// A rejected edit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("making '{candidate}' a {edge} of '{node_id}' would create a cycle")]
    CycleDetected {
        node_id: String,
        candidate: String,
        edge: EdgeKind,
    },
}

impl CycleError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }
}

/// A cycle already present in stored `parent_ids` edges.
///
/// The path starts and ends at the same id, following child -> parent edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub path: Vec<String>,
}

impl CycleReport {
    /// Number of distinct records in the loop.
    pub fn cycle_len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_self_loop(&self) -> bool {
        self.cycle_len() == 1
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self_loop() {
            write!(f, "self-loop on '{}'", self.path[0])
        } else {
            write!(f, "cycle ({} records): {}", self.cycle_len(), self.path.join(" → "))
        }
    }
}

// ---------------------------------------------------------------------------
// Edge index
// ---------------------------------------------------------------------------

/// Borrowed `id -> parent_ids` lookup over a record slice.
///
/// When ids repeat, the first record wins, matching the builders.
struct ParentLookup<'a> {
    parents: HashMap<&'a str, &'a [String]>,
}

impl<'a> ParentLookup<'a> {
    fn new<R: ParentEdges>(records: &'a [R]) -> Self {
        let mut parents = HashMap::with_capacity(records.len());
        for record in records {
            parents.entry(record.id()).or_insert(record.parent_ids());
        }
        Self { parents }
    }

    fn parents_of(&self, id: &str) -> &'a [String] {
        self.parents.get(id).copied().unwrap_or_default()
    }

    fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Would adding `candidate_parent_id` to `node_id`'s `parent_ids` close a loop?
///
/// True for a self reference, or when `node_id` is already an ancestor of
/// `candidate_parent_id`.
pub fn would_create_cycle(candidate_parent_id: &str, node_id: &str, records: &[Record]) -> bool {
    would_create_cycle_bounded(candidate_parent_id, node_id, records, DEFAULT_MAX_DEPTH)
}

/// [`would_create_cycle`] with an explicit bound on ancestor levels.
pub fn would_create_cycle_bounded<R: ParentEdges>(
    candidate_parent_id: &str,
    node_id: &str,
    records: &[R],
    max_depth: usize,
) -> bool {
    if candidate_parent_id == node_id {
        return true;
    }

    let lookup = ParentLookup::new(records);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut frontier: VecDeque<(&str, usize)> = VecDeque::new();
    frontier.push_back((candidate_parent_id, 0));

    while let Some((current, level)) = frontier.pop_front() {
        if current == node_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if level > max_depth {
            tracing::debug!(
                candidate = candidate_parent_id,
                node = node_id,
                max_depth,
                "ancestor walk exceeded bound, treating edit as cyclic"
            );
            return true;
        }
        for parent in lookup.parents_of(current) {
            if !visited.contains(parent.as_str()) {
                frontier.push_back((parent, level + 1));
            }
        }
    }

    false
}

/// Would setting `node_id`'s `subtype_of_id` to `candidate_id` close a loop
/// in the single-parent subtype chain?
pub fn would_create_subtype_cycle(candidate_id: &str, node_id: &str, records: &[Record]) -> bool {
    would_create_subtype_cycle_bounded(candidate_id, node_id, records, DEFAULT_MAX_DEPTH)
}

/// [`would_create_subtype_cycle`] with an explicit step bound.
pub fn would_create_subtype_cycle_bounded(
    candidate_id: &str,
    node_id: &str,
    records: &[Record],
    max_depth: usize,
) -> bool {
    if candidate_id == node_id {
        return true;
    }

    let mut chain: HashMap<&str, Option<&str>> = HashMap::with_capacity(records.len());
    for record in records {
        chain
            .entry(record.id.as_str())
            .or_insert_with(|| record.subtype_target());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(candidate_id);
    let mut steps = 0usize;

    while let Some(id) = current {
        if id == node_id {
            return true;
        }
        if !visited.insert(id) {
            break; // pre-existing loop that does not pass through node_id
        }
        steps += 1;
        if steps > max_depth {
            tracing::debug!(
                candidate = candidate_id,
                node = node_id,
                max_depth,
                "subtype walk exceeded bound, treating edit as cyclic"
            );
            return true;
        }
        current = chain.get(id).copied().flatten();
    }

    false
}

/// Reject a parent edit that would create a cycle.
///
/// # Errors
///
/// Returns [`CycleError::CycleDetected`] when [`would_create_cycle`] is true.
pub fn validate_parent_edit(
    node_id: &str,
    candidate_parent_id: &str,
    records: &[Record],
    max_depth: usize,
) -> Result<(), CycleError> {
    if would_create_cycle_bounded(candidate_parent_id, node_id, records, max_depth) {
        tracing::debug!(node = node_id, candidate = candidate_parent_id, "rejected parent edit");
        return Err(CycleError::CycleDetected {
            node_id: node_id.to_string(),
            candidate: candidate_parent_id.to_string(),
            edge: EdgeKind::Parent,
        });
    }
    Ok(())
}

/// Reject a subtype edit that would create a cycle.
///
/// # Errors
///
/// Returns [`CycleError::CycleDetected`] when
/// [`would_create_subtype_cycle`] is true.
pub fn validate_subtype_edit(
    node_id: &str,
    candidate_id: &str,
    records: &[Record],
    max_depth: usize,
) -> Result<(), CycleError> {
    if would_create_subtype_cycle_bounded(candidate_id, node_id, records, max_depth) {
        tracing::debug!(node = node_id, candidate = candidate_id, "rejected subtype edit");
        return Err(CycleError::CycleDetected {
            node_id: node_id.to_string(),
            candidate: candidate_id.to_string(),
            edge: EdgeKind::Subtype,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ancestor / descendant queries
// ---------------------------------------------------------------------------

/// All ancestors of `node_id` through `parent_ids`, nearest first (BFS).
///
/// Dangling ids are skipped. Cycles are tolerated.
pub fn ancestor_ids<R: ParentEdges>(node_id: &str, records: &[R]) -> Vec<String> {
    let lookup = ParentLookup::new(records);
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(node_id);
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(node_id);
    let mut result = Vec::new();

    while let Some(current) = queue.pop_front() {
        for parent in lookup.parents_of(current) {
            if lookup.contains(parent) && visited.insert(parent.as_str()) {
                result.push(parent.clone());
                queue.push_back(parent);
            }
        }
    }

    result
}

/// All descendants of `node_id` through reverse `parent_ids` edges, in BFS
/// order. `node_id` itself is not included.
pub fn descendant_ids<R: ParentEdges>(node_id: &str, records: &[R]) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for record in records {
        if !seen.insert(record.id()) {
            continue;
        }
        for parent in record.parent_ids() {
            children.entry(parent.as_str()).or_default().push(record.id());
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(node_id);
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(node_id);
    let mut result = Vec::new();

    while let Some(current) = queue.pop_front() {
        for &child in children.get(current).map(Vec::as_slice).unwrap_or_default() {
            if visited.insert(child) {
                result.push(child.to_string());
                queue.push_back(child);
            }
        }
    }

    result
}

// ---------------------------------------------------------------------------
// Corruption scan
// ---------------------------------------------------------------------------

/// DFS colours for the cycle scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Every cycle already present in stored `parent_ids` edges.
///
/// Each back edge found by an iterative colour DFS yields one report. Edges
/// to unknown ids are ignored.
pub fn find_parent_cycles<R: ParentEdges>(records: &[R]) -> Vec<CycleReport> {
    let (ids, adjacency) = index_records(records);
    let mut color = vec![Color::White; ids.len()];
    let mut reports = Vec::new();

    for start in 0..ids.len() {
        if color[start] != Color::White {
            continue;
        }
        // (node, next edge to inspect)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        color[start] = Color::Gray;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&next) = adjacency[node].get(top.1) {
                top.1 += 1;
                match color[next] {
                    Color::White => {
                        color[next] = Color::Gray;
                        stack.push((next, 0));
                    }
                    Color::Gray => {
                        let from = stack
                            .iter()
                            .position(|(n, _)| *n == next)
                            .unwrap_or_default();
                        let mut path: Vec<String> =
                            stack[from..].iter().map(|(n, _)| ids[*n].to_string()).collect();
                        path.push(ids[next].to_string());
                        reports.push(CycleReport { path });
                    }
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    reports
}

/// Whether stored `parent_ids` edges contain any cycle.
pub fn has_parent_cycles<R: ParentEdges>(records: &[R]) -> bool {
    let (ids, adjacency) = index_records(records);
    let mut color = vec![Color::White; ids.len()];

    for start in 0..ids.len() {
        if color[start] != Color::White {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        color[start] = Color::Gray;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&next) = adjacency[node].get(top.1) {
                top.1 += 1;
                match color[next] {
                    Color::White => {
                        color[next] = Color::Gray;
                        stack.push((next, 0));
                    }
                    Color::Gray => return true,
                    Color::Black => {}
                }
            } else {
                color[node] = Color::Black;
                stack.pop();
            }
        }
    }

    false
}

/// Dense ids plus child -> parent adjacency over known ids.
fn index_records<R: ParentEdges>(records: &[R]) -> (Vec<&str>, Vec<Vec<usize>>) {
    let mut slot: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut ids: Vec<&str> = Vec::with_capacity(records.len());
    let mut firsts: Vec<&R> = Vec::with_capacity(records.len());
    for record in records {
        if !slot.contains_key(record.id()) {
            slot.insert(record.id(), ids.len());
            ids.push(record.id());
            firsts.push(record);
        }
    }

    let adjacency = firsts
        .iter()
        .map(|record| {
            record
                .parent_ids()
                .iter()
                .filter_map(|p| slot.get(p.as_str()).copied())
                .collect()
        })
        .collect();

    (ids, adjacency)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRecord;

    fn rec(id: &str, parents: &[&str]) -> Record {
        Record::new(id, id).with_parents(parents.iter().copied())
    }

    // -----------------------------------------------------------------------
    // would_create_cycle
    // -----------------------------------------------------------------------

    #[test]
    fn self_reference_is_a_cycle() {
        assert!(would_create_cycle("A", "A", &[]));
        assert!(would_create_cycle("A", "A", &[rec("A", &[])]));
    }

    #[test]
    fn direct_child_as_parent_is_a_cycle() {
        // B's parent is A; making B a parent of A closes A -> B -> A.
        let records = vec![rec("A", &[]), rec("B", &["A"])];
        assert!(would_create_cycle("B", "A", &records));
    }

    #[test]
    fn deep_descendant_as_parent_is_a_cycle() {
        let records = vec![rec("A", &[]), rec("B", &["A"]), rec("C", &["B"]), rec("D", &["C"])];
        assert!(would_create_cycle("D", "A", &records));
    }

    #[test]
    fn multi_parent_path_is_followed() {
        // D has parents X and C; C's ancestor is A.
        let records = vec![
            rec("A", &[]),
            rec("X", &[]),
            rec("C", &["A"]),
            rec("D", &["X", "C"]),
        ];
        assert!(would_create_cycle("D", "A", &records));
        assert!(!would_create_cycle("D", "Y", &records));
    }

    #[test]
    fn unrelated_nodes_are_not_a_cycle() {
        let records = vec![rec("A", &[]), rec("B", &[]), rec("C", &["A"])];
        assert!(!would_create_cycle("B", "C", &records));
        assert!(!would_create_cycle("A", "B", &records));
    }

    #[test]
    fn ancestor_as_parent_is_not_a_cycle() {
        // Adding A as an extra parent of C (already under A via B) is fine.
        let records = vec![rec("A", &[]), rec("B", &["A"]), rec("C", &["B"])];
        assert!(!would_create_cycle("A", "C", &records));
    }

    #[test]
    fn dangling_parents_are_dead_ends() {
        let records = vec![rec("A", &["ghost"]), rec("B", &[])];
        assert!(!would_create_cycle("A", "B", &records));
    }

    #[test]
    fn terminates_on_corrupt_existing_cycle() {
        // X <-> Y already loop; asking about an unrelated node must terminate.
        let records = vec![rec("X", &["Y"]), rec("Y", &["X"]), rec("Z", &[])];
        assert!(!would_create_cycle("X", "Z", &records));
        assert!(would_create_cycle("X", "Y", &records));
    }

    #[test]
    fn depth_bound_is_conservative() {
        let names: Vec<String> = (0..50).map(|i| format!("n{i}")).collect();
        let mut records = vec![rec(&names[0], &[])];
        for i in 1..50 {
            records.push(rec(&names[i], &[names[i - 1].as_str()]));
        }
        assert!(!would_create_cycle_bounded(&names[49], "other", &records, 100));
        assert!(would_create_cycle_bounded(&names[49], "other", &records, 10));
        // n0 sits exactly 49 levels above n49.
        assert!(!would_create_cycle_bounded(&names[49], "other", &records, 49));
        assert!(would_create_cycle_bounded(&names[49], "other", &records, 48));
    }

    #[test]
    fn depth_bound_ignores_width() {
        let parents: Vec<String> = (0..500).map(|i| format!("p{i}")).collect();
        let mut records: Vec<Record> = parents.iter().map(|p| rec(p, &[])).collect();
        let refs: Vec<&str> = parents.iter().map(String::as_str).collect();
        records.push(rec("leaf", &refs));
        records.push(rec("other", &[]));
        assert!(!would_create_cycle_bounded("leaf", "other", &records, 3));
        assert!(would_create_cycle_bounded("leaf", "p499", &records, 3));
    }

    #[test]
    fn works_over_type_records() {
        let types = vec![
            TypeRecord::new("T1", "Root"),
            TypeRecord::new("T2", "Mid").with_parents(["T1"]),
        ];
        assert!(would_create_cycle_bounded("T2", "T1", &types, DEFAULT_MAX_DEPTH));
        assert!(!would_create_cycle_bounded("T1", "T2", &types, DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn large_chain_detected() {
        let names: Vec<String> = (0..1000).map(|i| format!("n{i}")).collect();
        let mut records = vec![rec(&names[0], &[])];
        for i in 1..1000 {
            records.push(rec(&names[i], &[names[i - 1].as_str()]));
        }
        assert!(would_create_cycle(&names[999], &names[0], &records));
        assert!(!would_create_cycle(&names[0], &names[999], &records));
    }

    // -----------------------------------------------------------------------
    // would_create_subtype_cycle
    // -----------------------------------------------------------------------

    #[test]
    fn subtype_self_reference_is_a_cycle() {
        assert!(would_create_subtype_cycle("A", "A", &[]));
    }

    #[test]
    fn subtype_chain_cycle_detected() {
        let records = vec![
            Record::new("A", "A"),
            Record::new("B", "B").subtype_of("A"),
            Record::new("C", "C").subtype_of("B"),
        ];
        assert!(would_create_subtype_cycle("C", "A", &records));
        assert!(!would_create_subtype_cycle("A", "C", &records));
    }

    #[test]
    fn subtype_walk_ignores_parent_edges() {
        let records = vec![Record::new("A", "A"), Record::new("B", "B").with_parents(["A"])];
        assert!(!would_create_subtype_cycle("B", "A", &records));
    }

    #[test]
    fn subtype_walk_terminates_on_existing_loop() {
        let records = vec![
            Record::new("X", "X").subtype_of("Y"),
            Record::new("Y", "Y").subtype_of("X"),
        ];
        assert!(!would_create_subtype_cycle("X", "Z", &records));
    }

    // -----------------------------------------------------------------------
    // validate_*
    // -----------------------------------------------------------------------

    #[test]
    fn validate_parent_edit_reports_cycle() {
        let records = vec![rec("A", &[]), rec("B", &["A"])];
        let err = validate_parent_edit("A", "B", &records, DEFAULT_MAX_DEPTH).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CycleDetected);
        let msg = err.to_string();
        assert!(msg.contains("'B'") && msg.contains("'A'"), "msg: {msg}");
        assert!(msg.contains("parent"), "msg: {msg}");
        assert!(validate_parent_edit("B", "A", &records, DEFAULT_MAX_DEPTH).is_ok());
    }

    #[test]
    fn validate_subtype_edit_reports_cycle() {
        let records = vec![Record::new("A", "A"), Record::new("B", "B").subtype_of("A")];
        let err = validate_subtype_edit("A", "B", &records, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(err.to_string().contains("subtype"));
    }

    // -----------------------------------------------------------------------
    // ancestor_ids / descendant_ids
    // -----------------------------------------------------------------------

    #[test]
    fn ancestors_nearest_first() {
        let records = vec![rec("G1", &[]), rec("G2", &["G1"]), rec("T", &["G2", "ghost"])];
        assert_eq!(ancestor_ids("T", &records), vec!["G2", "G1"]);
        assert!(ancestor_ids("G1", &records).is_empty());
    }

    #[test]
    fn ancestors_tolerate_cycles() {
        let records = vec![rec("A", &["B"]), rec("B", &["A"])];
        assert_eq!(ancestor_ids("A", &records), vec!["B"]);
    }

    #[test]
    fn descendants_bfs() {
        let records = vec![
            rec("R", &[]),
            rec("C1", &["R"]),
            rec("C2", &["R"]),
            rec("G", &["C1", "C2"]),
        ];
        assert_eq!(descendant_ids("R", &records), vec!["C1", "C2", "G"]);
        assert!(descendant_ids("G", &records).is_empty());
    }

    // -----------------------------------------------------------------------
    // find_parent_cycles / has_parent_cycles
    // -----------------------------------------------------------------------

    #[test]
    fn scan_clean_dag() {
        let records = vec![rec("A", &[]), rec("B", &["A"]), rec("C", &["A", "B"])];
        assert!(find_parent_cycles(&records).is_empty());
        assert!(!has_parent_cycles(&records));
    }

    #[test]
    fn scan_finds_self_loop() {
        let records = vec![rec("A", &["A"])];
        let cycles = find_parent_cycles(&records);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_self_loop());
        assert!(cycles[0].to_string().contains("self-loop"));
        assert!(has_parent_cycles(&records));
    }

    #[test]
    fn scan_finds_three_cycle() {
        let records = vec![rec("A", &["C"]), rec("B", &["A"]), rec("C", &["B"])];
        let cycles = find_parent_cycles(&records);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].cycle_len(), 3);
        assert_eq!(cycles[0].path.first(), cycles[0].path.last());
        assert!(cycles[0].to_string().contains("3 records"));
    }

    #[test]
    fn scan_finds_disjoint_cycles() {
        let records = vec![
            rec("A", &["B"]),
            rec("B", &["A"]),
            rec("C", &["D"]),
            rec("D", &["C"]),
            rec("E", &["ghost"]),
        ];
        assert_eq!(find_parent_cycles(&records).len(), 2);
    }

    #[test]
    fn scan_handles_long_chain_without_recursion() {
        let names: Vec<String> = (0..5000).map(|i| format!("n{i}")).collect();
        let mut records = vec![rec(&names[0], &[names[4999].as_str()])];
        for i in 1..5000 {
            records.push(rec(&names[i], &[names[i - 1].as_str()]));
        }
        let cycles = find_parent_cycles(&records);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].cycle_len(), 5000);
    }
}
