//! arbor-core library.
//!
//! Turns flat records carrying parent and subtype references into a
//! renderable forest, guards edits against cycles, and tracks selection and
//! deletion state for an interactive tree view.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module, each mapping to an
//!   [`ErrorCode`](error::ErrorCode); `anyhow::Result` at config I/O edges.
//! - **Logging**: `tracing` macros only. The library never installs a
//!   subscriber.

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod view;

pub use graph::{
    Forest, build_grouped_tree, build_tree, would_create_cycle, would_create_subtype_cycle,
};
pub use model::{Record, TypeRecord};
pub use view::HierarchyView;
