//! Record shapes supplied by the data-store collaborator.
//!
//! - [`record`]: hierarchy records (items and types) and the edge accessors
//!   shared by the builders and the cycle guard.

pub mod record;

pub use record::{ParentEdges, Record, TypeRecord};
