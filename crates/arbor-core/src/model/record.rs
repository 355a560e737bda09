//! Flat hierarchy records as delivered by the data store.
//!
//! A [`Record`] carries two independent edge kinds:
//!
//! - **Parent edges** (`parent_ids`): many-to-many, rendered as `children`.
//! - **Subtype edge** (`subtype_of_id`): at most one, rendered as `sub_types`.
//!
//! Records are read-only inputs. The builders never mutate them and never
//! assume the edges they carry are valid: dangling or self references are
//! resolved by orphan promotion at build time.

use serde::{Deserialize, Serialize};

/// Access to the multi-parent edges of a record.
///
/// Implemented by both [`Record`] and [`TypeRecord`] so the parent pass and
/// ancestor walks can run over either catalog.
pub trait ParentEdges {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn parent_ids(&self) -> &[String];
}

/// One entity in the item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub subtype_of_id: Option<String>,
    /// Type catalog entry this record is grouped under, if any.
    #[serde(default)]
    pub type_id: Option<String>,
}

impl Record {
    /// Create a record with no edges.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_ids: Vec::new(),
            subtype_of_id: None,
            type_id: None,
        }
    }

    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn subtype_of(mut self, id: impl Into<String>) -> Self {
        self.subtype_of_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn typed(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    /// The subtype target, treating an empty string as absent.
    pub fn subtype_target(&self) -> Option<&str> {
        self.subtype_of_id.as_deref().filter(|id| !id.is_empty())
    }

    /// The type id, treating an empty string as absent.
    pub fn type_key(&self) -> Option<&str> {
        self.type_id.as_deref().filter(|id| !id.is_empty())
    }
}

impl ParentEdges for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }
}

/// One entry in the type catalog used by the grouped forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

impl TypeRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }
}

impl ParentEdges for TypeRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }
}
