//! Click-driven selection over a flattened forest.
//!
//! # State
//!
//! - `selected`: the set of selected record ids.
//! - `groups`: the set of selected pseudo-root ids. Kept apart from records
//!   since a type id may equal an item id, and pseudo-roots are never data.
//! - [`SelectionState`]: where the anchor (last plainly or toggle-clicked
//!   position) sits, if anywhere.
//!
//! # Transitions
//!
//! | Event                 | Selected ids                       | Next state                  |
//! |-----------------------|------------------------------------|-----------------------------|
//! | click `i`             | `{id(i)}`                          | `Anchored { i }`            |
//! | toggle-click `i`      | membership of `id(i)` flipped      | `Anchored { i }`            |
//! | range-click `i`, `j`  | `∪ {id(k) : k in min..=max(i, j)}` | `RangeAnchored { j, i }`    |
//! | range-click, no anchor| as click `i`                       | `Anchored { i }`            |
//! | canvas click / reset  | `{}`                               | `Idle`                      |
//!
//! A range click never moves the anchor, so repeated range clicks all
//! measure from the same origin. Rebuilding the forest does not touch the
//! selection: ids that no longer render simply stop resolving.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

use std::collections::BTreeSet;

use super::ViewError;
use crate::graph::forest::{FlatEntry, FlatView};

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl / Cmd.
    pub toggle: bool,
    /// Shift.
    pub range: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        toggle: false,
        range: false,
    };
    pub const TOGGLE: Self = Self {
        toggle: true,
        range: false,
    };
    pub const RANGE: Self = Self {
        toggle: false,
        range: true,
    };
}

/// Anchor state of the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing clicked since the last reset.
    #[default]
    Idle,
    /// Last click was a plain or toggle click at `anchor`.
    Anchored { anchor: usize },
    /// Last click extended a range from `anchor` to `extent`.
    RangeAnchored { anchor: usize, extent: usize },
}

impl SelectionState {
    /// The position range clicks extend from.
    pub const fn anchor(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Anchored { anchor } | Self::RangeAnchored { anchor, .. } => Some(anchor),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Anchored { .. } => "anchored",
            Self::RangeAnchored { .. } => "range-anchored",
        }
    }
}

/// Per-view selection state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: BTreeSet<String>,
    groups: BTreeSet<String>,
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected record ids. Pseudo-roots are never included.
    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Selected pseudo-root (type group) ids.
    pub fn selected_groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Whether the position's node is selected, by kind and id.
    pub fn is_entry_selected(&self, entry: &FlatEntry) -> bool {
        self.set_for(entry).contains(&entry.id)
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Position of the last plain or toggle click.
    pub fn last_clicked_index(&self) -> Option<usize> {
        self.state.anchor()
    }

    /// Handle a click on the node shown at `index` in `view`.
    ///
    /// Range takes precedence when both modifiers are held.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::IndexOutOfRange`] when `index` is not a position
    /// in `view`; the selection is left unchanged.
    pub fn on_node_click(
        &mut self,
        view: &FlatView,
        index: usize,
        modifiers: Modifiers,
    ) -> Result<(), ViewError> {
        let Some(entry) = view.get(index) else {
            return Err(ViewError::IndexOutOfRange {
                index,
                len: view.len(),
            });
        };

        self.state = match (modifiers, self.state.anchor()) {
            (Modifiers { range: true, .. }, Some(anchor)) => {
                for between in view.entries_between(anchor, index) {
                    self.set_for_mut(between).insert(between.id.clone());
                }
                SelectionState::RangeAnchored {
                    anchor,
                    extent: index,
                }
            }
            (Modifiers { toggle: true, range: false }, _) => {
                let set = self.set_for_mut(entry);
                if !set.remove(&entry.id) {
                    set.insert(entry.id.clone());
                }
                SelectionState::Anchored { anchor: index }
            }
            _ => {
                self.clear_ids();
                self.set_for_mut(entry).insert(entry.id.clone());
                SelectionState::Anchored { anchor: index }
            }
        };
        Ok(())
    }

    /// Click on empty canvas: clear everything.
    pub fn on_canvas_click(&mut self) {
        self.clear_ids();
        self.state = SelectionState::Idle;
    }

    /// Drop all selection state, e.g. when the view switches to another tree.
    pub fn reset(&mut self) {
        self.on_canvas_click();
    }

    /// Narrow the selection to exactly `id` without moving the anchor.
    pub(crate) fn select_only(&mut self, id: &str) {
        self.clear_ids();
        self.selected.insert(id.to_string());
    }

    /// Forget the selected ids after they were handed off for deletion.
    pub(crate) fn clear_ids(&mut self) {
        self.selected.clear();
        self.groups.clear();
    }

    fn set_for(&self, entry: &FlatEntry) -> &BTreeSet<String> {
        if entry.kind.is_pseudo() {
            &self.groups
        } else {
            &self.selected
        }
    }

    fn set_for_mut(&mut self, entry: &FlatEntry) -> &mut BTreeSet<String> {
        if entry.kind.is_pseudo() {
            &mut self.groups
        } else {
            &mut self.selected
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
