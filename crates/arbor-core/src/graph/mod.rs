//! Forest construction and structural checks over flat hierarchy records.
//!
//! ## Submodules
//!
//! - [`forest`]: Arena forest, pre-order flattening and nested rendering.
//! - [`builder`]: Records to forest, with subtype precedence and orphan
//!   promotion.
//! - [`grouped`]: Records nested under type pseudo-roots.
//! - [`cycles`]: Edit-time cycle guards, ancestry queries and cycle scans.

pub mod builder;
pub mod cycles;
pub mod forest;
pub mod grouped;

pub use builder::{BuildError, build_tree, try_build_tree};
pub use cycles::{CycleError, CycleReport, EdgeKind, would_create_cycle, would_create_subtype_cycle};
pub use forest::{FlatEntry, FlatView, Forest, NestedNode, Node, NodeIndex, NodeKind, Relation};
pub use grouped::{build_grouped_tree, build_grouped_tree_with, try_build_grouped_tree};
