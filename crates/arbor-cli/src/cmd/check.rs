//! `arbor check-parent`: ask whether a parent or subtype edit is allowed.

use std::io::Write;
use std::path::PathBuf;

use arbor_core::config::EngineConfig;
use arbor_core::error::ErrorCode;
use arbor_core::graph::EdgeKind;
use arbor_core::graph::cycles::{ancestor_ids, validate_parent_edit, validate_subtype_edit};
use arbor_core::model::Record;
use clap::Args;
use serde::Serialize;

use crate::input::load_catalog;
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `arbor check-parent`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON record file.
    pub file: PathBuf,

    /// Record being edited.
    pub node: String,

    /// Proposed parent (or subtype target with `--subtype`).
    pub candidate: String,

    /// Check a `subtype_of_id` edit instead of a `parent_ids` edit.
    #[arg(long)]
    pub subtype: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    node: String,
    candidate: String,
    edge: String,
    allowed: bool,
    /// Ancestors of the candidate through `parent_ids`, nearest first.
    candidate_ancestors: Vec<String>,
}

/// Execute `arbor check-parent`. Fails when the edit would create a cycle.
pub fn run_check(args: &CheckArgs, output: OutputMode, config: &EngineConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.file)?;
    let records = &catalog.items;

    for id in [&args.node, &args.candidate] {
        if !records.iter().any(|r| &r.id == id) {
            render_error(
                output,
                &CliError::from_code(ErrorCode::RecordNotFound, format!("no record with id '{id}'")),
            )?;
            anyhow::bail!("record '{id}' not found");
        }
    }

    let payload = check(args, records, config.cycles.max_depth);
    if !payload.allowed {
        let edge = if args.subtype { EdgeKind::Subtype } else { EdgeKind::Parent };
        let message = format!(
            "making '{}' a {edge} of '{}' would create a cycle",
            args.candidate, args.node
        );
        render_error(output, &CliError::from_code(ErrorCode::CycleDetected, &message))?;
        anyhow::bail!(message);
    }

    render(output, &payload, render_check_human)
}

fn check(args: &CheckArgs, records: &[Record], max_depth: usize) -> CheckOutput {
    let (edge, result) = if args.subtype {
        (
            EdgeKind::Subtype,
            validate_subtype_edit(&args.node, &args.candidate, records, max_depth),
        )
    } else {
        (
            EdgeKind::Parent,
            validate_parent_edit(&args.node, &args.candidate, records, max_depth),
        )
    };

    CheckOutput {
        node: args.node.clone(),
        candidate: args.candidate.clone(),
        edge: edge.to_string(),
        allowed: result.is_ok(),
        candidate_ancestors: ancestor_ids(&args.candidate, records),
    }
}

fn render_check_human(
    payload: &CheckOutput,
    _mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(
        w,
        "ok: '{}' can be a {} of '{}'",
        payload.candidate, payload.edge, payload.node
    )
}
