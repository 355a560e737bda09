//! Context-menu driven deletion of selected records.
//!
//! The coordinator walks `Idle -> MenuOpen -> ConfirmPending -> Idle`.
//! Opening the menu fixes the pending set; confirming dispatches one delete
//! request per pending id, independently of one another, through a
//! [`DeletionSink`]. Cancelling at any point leaves the selection alone.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info, warn};

use super::ViewError;
use super::selection::SelectionController;
use crate::error::ErrorCode;
use crate::graph::forest::Node;

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// A single delete request that the backing store refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delete of '{id}' failed: {reason}")]
pub struct DeleteFailure {
    pub id: String,
    pub reason: String,
}

impl DeleteFailure {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub const fn code(&self) -> ErrorCode {
        ErrorCode::DeleteFailed
    }
}

/// Receiver of confirmed delete requests.
pub trait DeletionSink {
    /// Request removal of one record.
    ///
    /// # Errors
    ///
    /// Returns a [`DeleteFailure`] when the store rejects the request. Other
    /// ids in the same batch are still requested.
    fn delete_by_id(&mut self, id: &str) -> Result<(), DeleteFailure>;

    /// Called once after every id of a confirmed batch has been requested.
    fn on_delete_confirmed(&mut self, _ids: &[String]) {}
}

impl<F> DeletionSink for F
where
    F: FnMut(&str) -> Result<(), DeleteFailure>,
{
    fn delete_by_id(&mut self, id: &str) -> Result<(), DeleteFailure> {
        self(id)
    }
}

// ---------------------------------------------------------------------------
// Prompt / report
// ---------------------------------------------------------------------------

/// Text of the confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPrompt {
    /// Exactly one record pending; names it.
    Single { title: String },
    /// Several records pending; counts them.
    Many { count: usize },
}

impl fmt::Display for ConfirmPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single { title } => write!(f, "Delete \"{title}\"?"),
            Self::Many { count } => write!(f, "Delete {count} items?"),
        }
    }
}

/// Outcome of a confirmed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Every id that was requested, in request order.
    pub requested: Vec<String>,
    pub failed: Vec<DeleteFailure>,
}

impl DeleteReport {
    pub fn succeeded(&self) -> usize {
        self.requested.len() - self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionState {
    #[default]
    Idle,
    /// Context menu shown at viewport coordinates `(x, y)`.
    MenuOpen { x: i32, y: i32 },
    /// Confirmation dialog shown.
    ConfirmPending,
}

impl DeletionState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::MenuOpen { .. } => "menu-open",
            Self::ConfirmPending => "confirm-pending",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionCoordinator {
    state: DeletionState,
    pending: BTreeSet<String>,
    /// Title of the right-clicked node, used when exactly one id is pending.
    subject_title: String,
}

impl DeletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeletionState {
        self.state
    }

    pub fn pending_ids(&self) -> &BTreeSet<String> {
        &self.pending
    }

    pub fn is_menu_open(&self) -> bool {
        matches!(self.state, DeletionState::MenuOpen { .. })
    }

    pub fn is_confirm_pending(&self) -> bool {
        self.state == DeletionState::ConfirmPending
    }

    /// Right-click on `target` at `(x, y)`.
    ///
    /// A selected target carries the selected records into the pending set;
    /// an unselected one narrows the selection to itself first. Selected
    /// pseudo-roots are never pending. Returns `false` without changing
    /// anything when `target` is a pseudo-root.
    pub fn on_node_context_menu(
        &mut self,
        selection: &mut SelectionController,
        target: &Node,
        x: i32,
        y: i32,
    ) -> bool {
        if target.kind.is_pseudo() {
            debug!(id = %target.id, "context menu ignored on pseudo-root");
            return false;
        }

        if !selection.is_selected(&target.id) {
            selection.select_only(&target.id);
        }
        self.pending = selection.selected_ids().clone();
        self.subject_title.clone_from(&target.title);
        self.state = DeletionState::MenuOpen { x, y };
        debug!(id = %target.id, pending = self.pending.len(), "context menu opened");
        true
    }

    /// "Delete" chosen from the open menu.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidTransition`] unless the menu is open.
    pub fn choose_delete(&mut self) -> Result<ConfirmPrompt, ViewError> {
        if !self.is_menu_open() {
            return Err(self.invalid("choose-delete"));
        }
        self.state = DeletionState::ConfirmPending;
        Ok(self.prompt())
    }

    /// Prompt for the current pending set.
    pub fn prompt(&self) -> ConfirmPrompt {
        if self.pending.len() == 1 {
            ConfirmPrompt::Single {
                title: self.subject_title.clone(),
            }
        } else {
            ConfirmPrompt::Many {
                count: self.pending.len(),
            }
        }
    }

    /// Confirm the dialog: request every pending id, then clear the pending
    /// set and the selection.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidTransition`] unless a confirmation is
    /// pending. Individual delete failures are collected in the report.
    pub fn confirm(
        &mut self,
        selection: &mut SelectionController,
        sink: &mut dyn DeletionSink,
    ) -> Result<DeleteReport, ViewError> {
        if !self.is_confirm_pending() {
            return Err(self.invalid("confirm"));
        }

        let requested: Vec<String> = std::mem::take(&mut self.pending).into_iter().collect();
        info!(count = requested.len(), "deleting records");

        let mut failed = Vec::new();
        for id in &requested {
            if let Err(failure) = sink.delete_by_id(id) {
                warn!(id = %id, reason = %failure.reason, "delete request failed");
                failed.push(failure);
            }
        }
        sink.on_delete_confirmed(&requested);

        selection.clear_ids();
        self.subject_title.clear();
        self.state = DeletionState::Idle;
        Ok(DeleteReport { requested, failed })
    }

    /// Dismiss the menu or the dialog. The selection is retained.
    pub fn cancel(&mut self) {
        if self.state != DeletionState::Idle {
            debug!(from = self.state.name(), "deletion cancelled");
        }
        self.pending.clear();
        self.subject_title.clear();
        self.state = DeletionState::Idle;
    }

    /// Click outside an open menu closes it. No effect in other states.
    pub fn click_outside(&mut self) {
        if self.is_menu_open() {
            self.cancel();
        }
    }

    fn invalid(&self, event: &'static str) -> ViewError {
        ViewError::InvalidTransition {
            state: self.state.name(),
            event,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
