//! Arena-backed forest produced by one build pass.
//!
//! # Representation
//!
//! Every node lives exactly once in an arena (`Vec<Node>`). Edges are stored
//! as [`NodeIndex`] adjacency lists, never as owned child nodes. A record with
//! several valid parents therefore appears under each of them by index: the
//! positions are distinct, the underlying entry is shared and cannot diverge.
//!
//! A forest is immutable once the builder returns it. Rebuilding produces a
//! fresh forest; nothing is patched in place.
//!
//! # Flattening
//!
//! [`Forest::flatten`] walks the forest in pre-order to assign each visible
//! position an index. For every node its `sub_types` are visited before its
//! `children`, and both before the next sibling, which matches the visual
//! layout so that index ranges are visually contiguous.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

use serde::Serialize;
use std::collections::HashMap;
use std::ops::Index;

use crate::model::{Record, TypeRecord};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Position of a node in the forest arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A data record from the item catalog.
    Record,
    /// Synthetic pseudo-root for a type catalog entry.
    TypeGroup,
    /// The reserved pseudo-root for items without a known type.
    Uncategorized,
}

impl NodeKind {
    /// Pseudo-roots are display-only and never map to a deletable record.
    pub const fn is_pseudo(self) -> bool {
        !matches!(self, Self::Record)
    }
}

/// A record plus its resolved edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub title: String,
    pub parent_ids: Vec<String>,
    pub subtype_of_id: Option<String>,
    pub type_id: Option<String>,
    pub kind: NodeKind,
    /// Nodes attached through `parent_ids` edges, in source order.
    pub children: Vec<NodeIndex>,
    /// Nodes attached through `subtype_of_id` edges, in source order.
    pub sub_types: Vec<NodeIndex>,
}

impl Node {
    pub(crate) fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            parent_ids: record.parent_ids.clone(),
            subtype_of_id: record.subtype_of_id.clone(),
            type_id: record.type_id.clone(),
            kind: NodeKind::Record,
            children: Vec::new(),
            sub_types: Vec::new(),
        }
    }

    pub(crate) fn type_group(record: &TypeRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            parent_ids: record.parent_ids.clone(),
            subtype_of_id: None,
            type_id: None,
            kind: NodeKind::TypeGroup,
            children: Vec::new(),
            sub_types: Vec::new(),
        }
    }

    pub(crate) fn uncategorized(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            parent_ids: Vec::new(),
            subtype_of_id: None,
            type_id: None,
            kind: NodeKind::Uncategorized,
            children: Vec::new(),
            sub_types: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.sub_types.is_empty()
    }
}

/// How a flattened position was reached from its parent position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Root,
    Child,
    SubType,
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// Ordered root list over a node arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<NodeIndex>,
    /// Record id -> arena slot. Pseudo-roots are not indexed here because a
    /// type id may legitimately equal an item id.
    by_id: HashMap<String, NodeIndex>,
}

impl Forest {
    /// A forest with no nodes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            roots: Vec::new(),
            by_id: HashMap::with_capacity(capacity),
        }
    }

    /// Push a node into the arena. Record nodes are indexed by id.
    pub(crate) fn push(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len());
        if node.kind == NodeKind::Record {
            self.by_id.insert(node.id.clone(), idx);
        }
        self.nodes.push(node);
        idx
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut Node {
        &mut self.nodes[idx.0]
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<NodeIndex>) {
        self.roots = roots;
    }

    /// Root positions in display order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Root nodes in display order.
    pub fn root_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.roots.iter().map(|idx| &self.nodes[idx.0])
    }

    /// Ids of the root nodes in display order.
    pub fn root_ids(&self) -> Vec<&str> {
        self.root_nodes().map(|n| n.id.as_str()).collect()
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.0)
    }

    /// Arena slot of the record with `id`, if it took part in the build.
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// The record node with `id`.
    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.find(id).map(|idx| &self.nodes[idx.0])
    }

    pub fn children(&self, idx: NodeIndex) -> impl Iterator<Item = &Node> + '_ {
        self.nodes[idx.0]
            .children
            .iter()
            .map(|child| &self.nodes[child.0])
    }

    pub fn sub_types(&self, idx: NodeIndex) -> impl Iterator<Item = &Node> + '_ {
        self.nodes[idx.0]
            .sub_types
            .iter()
            .map(|child| &self.nodes[child.0])
    }

    /// Number of slots the node occupies directly: one per parent it is
    /// attached under, plus one if it is a root.
    pub fn attachment_count(&self, idx: NodeIndex) -> usize {
        let as_root = self.roots.iter().filter(|r| **r == idx).count();
        let as_child = self
            .nodes
            .iter()
            .map(|n| {
                n.children.iter().filter(|c| **c == idx).count()
                    + n.sub_types.iter().filter(|c| **c == idx).count()
            })
            .sum::<usize>();
        as_root + as_child
    }

    /// Number of nodes in the arena (including unreachable ones).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Pre-order flattening of every visible position.
    ///
    /// A node already on the current root-to-node path is skipped, so
    /// corrupt cyclic data cannot recurse forever. Positions deeper than
    /// `max_depth` are not emitted.
    pub fn flatten(&self, max_depth: usize) -> FlatView {
        let mut entries = Vec::new();
        let mut on_path = vec![false; self.nodes.len()];
        for root in &self.roots {
            self.visit(*root, 0, Relation::Root, max_depth, &mut on_path, &mut entries);
        }
        FlatView { entries }
    }

    fn visit(
        &self,
        idx: NodeIndex,
        depth: usize,
        relation: Relation,
        max_depth: usize,
        on_path: &mut [bool],
        entries: &mut Vec<FlatEntry>,
    ) {
        if depth > max_depth || on_path[idx.0] {
            return;
        }
        let node = &self.nodes[idx.0];
        entries.push(FlatEntry {
            node: idx,
            id: node.id.clone(),
            kind: node.kind,
            depth,
            relation,
        });

        on_path[idx.0] = true;
        for sub in &node.sub_types {
            self.visit(*sub, depth + 1, Relation::SubType, max_depth, on_path, entries);
        }
        for child in &node.children {
            self.visit(*child, depth + 1, Relation::Child, max_depth, on_path, entries);
        }
        on_path[idx.0] = false;
    }

    /// Owned nested rendering of the forest, for serialization.
    ///
    /// Uses the same limits as [`Forest::flatten`]: a node already on the
    /// current path is cut, and nothing deeper than `max_depth` is emitted.
    pub fn to_nested(&self, max_depth: usize) -> Vec<NestedNode> {
        let mut on_path = vec![false; self.nodes.len()];
        self.roots
            .iter()
            .filter_map(|root| self.nest(*root, 0, max_depth, &mut on_path))
            .collect()
    }

    fn nest(
        &self,
        idx: NodeIndex,
        depth: usize,
        max_depth: usize,
        on_path: &mut [bool],
    ) -> Option<NestedNode> {
        if depth > max_depth || on_path[idx.0] {
            return None;
        }
        on_path[idx.0] = true;
        let node = &self.nodes[idx.0];
        let sub_types = node
            .sub_types
            .iter()
            .filter_map(|sub| self.nest(*sub, depth + 1, max_depth, on_path))
            .collect();
        let children = node
            .children
            .iter()
            .filter_map(|child| self.nest(*child, depth + 1, max_depth, on_path))
            .collect();
        on_path[idx.0] = false;
        Some(NestedNode {
            id: node.id.clone(),
            title: node.title.clone(),
            kind: node.kind,
            children,
            sub_types,
        })
    }
}

impl Index<NodeIndex> for Forest {
    type Output = Node;

    fn index(&self, idx: NodeIndex) -> &Self::Output {
        &self.nodes[idx.0]
    }
}

/// Owned tree shape used for JSON output and structural assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedNode {
    pub id: String,
    pub title: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_types: Vec<NestedNode>,
}

// ---------------------------------------------------------------------------
// FlatView
// ---------------------------------------------------------------------------

/// One visible position in the flattened forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatEntry {
    pub node: NodeIndex,
    pub id: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub relation: Relation,
}

/// Pre-order positions of a forest. Position `i` is what the UI calls the
/// node's index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatView {
    entries: Vec<FlatEntry>,
}

impl FlatView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FlatEntry> {
        self.entries.get(index)
    }

    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.id.as_str())
    }

    /// Entries at every position between `a` and `b`, inclusive, in either
    /// order. Out-of-range bounds are clamped to the view.
    pub fn entries_between(&self, a: usize, b: usize) -> impl Iterator<Item = &FlatEntry> + '_ {
        let lo = a.min(b);
        let hi = a.max(b);
        self.entries
            .iter()
            .skip(lo)
            .take(hi.saturating_sub(lo).saturating_add(1))
    }

    pub fn ids_between(&self, a: usize, b: usize) -> impl Iterator<Item = &str> + '_ {
        self.entries_between(a, b).map(|e| e.id.as_str())
    }

    /// First position showing `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatEntry> + '_ {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(forest: &mut Forest, id: &str) -> NodeIndex {
        forest.push(Node::from_record(&Record::new(id, id)))
    }

    /// A(sub: C, children: B(children: D)), E
    fn sample() -> Forest {
        let mut f = Forest::with_capacity(5);
        let a = leaf(&mut f, "A");
        let b = leaf(&mut f, "B");
        let c = leaf(&mut f, "C");
        let d = leaf(&mut f, "D");
        let e = leaf(&mut f, "E");
        f.node_mut(a).children.push(b);
        f.node_mut(a).sub_types.push(c);
        f.node_mut(b).children.push(d);
        f.set_roots(vec![a, e]);
        f
    }

    #[test]
    fn empty_forest() {
        let f = Forest::empty();
        assert!(f.is_empty());
        assert_eq!(f.len(), 0);
        assert!(f.flatten(16).is_empty());
        assert!(f.to_nested(64).is_empty());
    }

    #[test]
    fn find_and_index() {
        let f = sample();
        let b = f.find("B").unwrap();
        assert_eq!(f[b].id, "B");
        assert_eq!(f.find_node("D").unwrap().id, "D");
        assert!(f.find("Z").is_none());
        assert_eq!(f.root_ids(), vec!["A", "E"]);
    }

    #[test]
    fn flatten_visits_subtypes_before_children() {
        let f = sample();
        let flat = f.flatten(16);
        assert_eq!(flat.ids(), vec!["A", "C", "B", "D", "E"]);
        let depths: Vec<usize> = flat.iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 2, 0]);
        assert_eq!(flat.get(1).unwrap().relation, Relation::SubType);
        assert_eq!(flat.get(2).unwrap().relation, Relation::Child);
        assert_eq!(flat.get(4).unwrap().relation, Relation::Root);
    }

    #[test]
    fn flatten_respects_max_depth() {
        let f = sample();
        let flat = f.flatten(1);
        assert_eq!(flat.ids(), vec!["A", "C", "B", "E"]);
    }

    #[test]
    fn multi_attached_node_gets_one_position_per_parent() {
        let mut f = Forest::with_capacity(3);
        let a = leaf(&mut f, "A");
        let b = leaf(&mut f, "B");
        let shared = leaf(&mut f, "S");
        f.node_mut(a).children.push(shared);
        f.node_mut(b).children.push(shared);
        f.set_roots(vec![a, b]);

        let flat = f.flatten(16);
        assert_eq!(flat.ids(), vec!["A", "S", "B", "S"]);
        assert_eq!(flat.get(1).unwrap().node, flat.get(3).unwrap().node);
        assert_eq!(f.attachment_count(shared), 2);
        assert_eq!(flat.position_of("S"), Some(1));
    }

    #[test]
    fn flatten_terminates_on_cyclic_adjacency() {
        let mut f = Forest::with_capacity(2);
        let a = leaf(&mut f, "A");
        let b = leaf(&mut f, "B");
        f.node_mut(a).children.push(b);
        f.node_mut(b).children.push(a);
        f.set_roots(vec![a]);

        assert_eq!(f.flatten(1_000).ids(), vec!["A", "B"]);
        let nested = f.to_nested(64);
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].children[0].id, "B");
        assert!(nested[0].children[0].children.is_empty());
    }

    #[test]
    fn deep_chain_is_cut_at_max_depth() {
        let len = 100_000;
        let mut f = Forest::with_capacity(len);
        let nodes: Vec<NodeIndex> = (0..len).map(|i| leaf(&mut f, &format!("n{i}"))).collect();
        for pair in nodes.windows(2) {
            f.node_mut(pair[0]).children.push(pair[1]);
        }
        f.set_roots(vec![nodes[0]]);

        assert_eq!(f.flatten(256).len(), 257);

        let nested = f.to_nested(256);
        let mut depth = 0;
        let mut cursor = &nested[0];
        while let Some(next) = cursor.children.first() {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, 256);
        assert_eq!(cursor.id, "n256");
    }

    #[test]
    fn nested_respects_max_depth() {
        let nested = sample().to_nested(1);
        assert_eq!(nested[0].sub_types[0].id, "C");
        assert_eq!(nested[0].children[0].id, "B");
        assert!(nested[0].children[0].children.is_empty());
    }

    #[test]
    fn ids_between_is_order_independent_and_clamped() {
        let flat = sample().flatten(16);
        let forward: Vec<&str> = flat.ids_between(1, 3).collect();
        let backward: Vec<&str> = flat.ids_between(3, 1).collect();
        assert_eq!(forward, vec!["C", "B", "D"]);
        assert_eq!(forward, backward);
        let clamped: Vec<&str> = flat.ids_between(3, 99).collect();
        assert_eq!(clamped, vec!["D", "E"]);
    }

    #[test]
    fn pseudo_kinds() {
        assert!(!NodeKind::Record.is_pseudo());
        assert!(NodeKind::TypeGroup.is_pseudo());
        assert!(NodeKind::Uncategorized.is_pseudo());
    }

    #[test]
    fn nested_serializes_without_empty_lists() {
        let json = serde_json::to_value(sample().to_nested(64)).unwrap();
        assert_eq!(json[1]["id"], "E");
        assert!(json[1].get("children").is_none());
        assert_eq!(json[0]["sub_types"][0]["id"], "C");
        assert_eq!(json[0]["kind"], "record");
    }
}
