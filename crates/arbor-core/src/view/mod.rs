//! Interactive state over a built forest.
//!
//! [`HierarchyView`] owns one forest, its flattened positions, a
//! [`SelectionController`] and a [`DeletionCoordinator`], and routes UI
//! events to them. All state is per view instance; nothing is global.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

pub mod deletion;
pub mod selection;

pub use deletion::{
    ConfirmPrompt, DeleteFailure, DeleteReport, DeletionCoordinator, DeletionSink, DeletionState,
};
pub use selection::{Modifiers, SelectionController, SelectionState};

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::RenderConfig;
use crate::error::ErrorCode;
use crate::graph::forest::{FlatView, Forest};

/// Errors raised by view event handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("position {index} is outside the visible tree ({len} positions)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{event}' is not valid while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

impl ViewError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::IndexOutOfRange { .. } => ErrorCode::IndexOutOfRange,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
        }
    }
}

/// One rendered tree plus its interaction state.
#[derive(Debug, Clone)]
pub struct HierarchyView {
    forest: Forest,
    flat: FlatView,
    selection: SelectionController,
    deletion: DeletionCoordinator,
    max_depth: usize,
}

impl HierarchyView {
    pub fn new(forest: Forest, render: &RenderConfig) -> Self {
        let flat = forest.flatten(render.max_depth);
        Self {
            forest,
            flat,
            selection: SelectionController::new(),
            deletion: DeletionCoordinator::new(),
            max_depth: render.max_depth,
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn flat(&self) -> &FlatView {
        &self.flat
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        self.selection.selected_ids()
    }

    pub fn pending_delete_ids(&self) -> &BTreeSet<String> {
        self.deletion.pending_ids()
    }

    pub fn deletion_state(&self) -> DeletionState {
        self.deletion.state()
    }

    /// Replace the forest after the records changed. Selection is kept:
    /// ids that no longer render simply stop matching any position.
    pub fn rebuild(&mut self, forest: Forest) {
        self.flat = forest.flatten(self.max_depth);
        self.forest = forest;
        debug!(positions = self.flat.len(), "view rebuilt");
    }

    /// Show a different tree. Selection and any open menu are dropped.
    pub fn switch_tree(&mut self, forest: Forest) {
        self.rebuild(forest);
        self.selection.reset();
        self.deletion.cancel();
    }

    /// Primary click on the node at `index`.
    ///
    /// While the context menu is open the click only dismisses it; while a
    /// confirmation is pending clicks are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::IndexOutOfRange`] for a position not in the view.
    pub fn on_node_click(&mut self, index: usize, modifiers: Modifiers) -> Result<(), ViewError> {
        if self.deletion.is_confirm_pending() {
            return Ok(());
        }
        if self.deletion.is_menu_open() {
            self.deletion.click_outside();
            return Ok(());
        }
        self.selection.on_node_click(&self.flat, index, modifiers)
    }

    /// Click on empty canvas.
    pub fn on_canvas_click(&mut self) {
        if self.deletion.is_confirm_pending() {
            return;
        }
        if self.deletion.is_menu_open() {
            self.deletion.click_outside();
            return;
        }
        self.selection.on_canvas_click();
    }

    /// Secondary click on the node at `index`. Returns whether a menu opened.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::IndexOutOfRange`] for a position not in the view,
    /// or [`ViewError::InvalidTransition`] while a confirmation is pending.
    pub fn on_node_context_menu(&mut self, index: usize, x: i32, y: i32) -> Result<bool, ViewError> {
        if self.deletion.is_confirm_pending() {
            return Err(ViewError::InvalidTransition {
                state: self.deletion.state().name(),
                event: "context-menu",
            });
        }
        let Some(entry) = self.flat.get(index) else {
            return Err(ViewError::IndexOutOfRange {
                index,
                len: self.flat.len(),
            });
        };
        let target = &self.forest[entry.node];
        Ok(self
            .deletion
            .on_node_context_menu(&mut self.selection, target, x, y))
    }

    /// "Delete" chosen from the context menu.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidTransition`] unless the menu is open.
    pub fn on_choose_delete(&mut self) -> Result<ConfirmPrompt, ViewError> {
        self.deletion.choose_delete()
    }

    /// Confirm the pending deletion.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidTransition`] unless a confirmation is
    /// pending.
    pub fn on_confirm_delete(
        &mut self,
        sink: &mut dyn DeletionSink,
    ) -> Result<DeleteReport, ViewError> {
        self.deletion.confirm(&mut self.selection, sink)
    }

    /// Dismiss the menu or the confirmation dialog.
    pub fn on_cancel_delete(&mut self) {
        self.deletion.cancel();
    }
}
