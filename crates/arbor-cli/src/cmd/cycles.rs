//! `arbor cycles`: list cycles already present in stored parent edges.

use std::io::Write;
use std::path::PathBuf;

use arbor_core::graph::cycles::find_parent_cycles;
use clap::Args;
use serde::Serialize;

use crate::input::{Catalog, load_catalog};
use crate::output::{OutputMode, pretty_section, render};

/// Arguments for `arbor cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// JSON record file (array of records, or `{items, types}`).
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct CycleEntry {
    /// `items` or `types`.
    catalog: &'static str,
    /// Ids along the loop; the first id is repeated at the end.
    path: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<CycleEntry>,
}

/// Execute `arbor cycles`.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.file)?;
    let payload = scan(&catalog);
    if !payload.cycles.is_empty() {
        tracing::warn!(count = payload.cycles.len(), "stored parent edges contain cycles");
    }
    render(output, &payload, render_cycles_human)
}

fn scan(catalog: &Catalog) -> CyclesOutput {
    let items = find_parent_cycles(&catalog.items)
        .into_iter()
        .map(|report| CycleEntry {
            catalog: "items",
            path: report.path,
        });
    let types = find_parent_cycles(&catalog.types)
        .into_iter()
        .map(|report| CycleEntry {
            catalog: "types",
            path: report.path,
        });
    CyclesOutput {
        cycles: items.chain(types).collect(),
    }
}

fn render_cycles_human(
    payload: &CyclesOutput,
    mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No parent cycles found.")?;
        return Ok(());
    }

    if mode.is_pretty() {
        pretty_section(w, &format!("Parent cycles ({})", payload.cycles.len()))?;
        for (idx, cycle) in payload.cycles.iter().enumerate() {
            writeln!(w, "{:>3}. [{}] {}", idx + 1, cycle.catalog, cycle.path.join(" -> "))?;
        }
    } else {
        for cycle in &payload.cycles {
            writeln!(w, "{}\t{}", cycle.catalog, cycle.path.join("\t"))?;
        }
    }
    Ok(())
}
