//! `arbor grouped`: render items nested under their type groups.

use std::path::{Path, PathBuf};

use arbor_core::config::EngineConfig;
use arbor_core::graph::try_build_grouped_tree;
use clap::Args;

use super::tree::{TreeOutput, render_tree_human};
use super::{malformed, rows};
use crate::input::{load_catalog, load_types};
use crate::output::{OutputMode, render};

/// Arguments for `arbor grouped`.
#[derive(Args, Debug)]
pub struct GroupedArgs {
    /// JSON item file (array of records, or `{items, types}`).
    pub items: PathBuf,

    /// JSON type file. Defaults to the `types` of the item file.
    pub types: Option<PathBuf>,
}

/// Execute `arbor grouped`.
pub fn run_grouped(
    args: &GroupedArgs,
    output: OutputMode,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    let payload = build_output(&args.items, args.types.as_deref(), output, config)?;
    render(output, &payload, render_tree_human)
}

fn build_output(
    items: &Path,
    types: Option<&Path>,
    output: OutputMode,
    config: &EngineConfig,
) -> anyhow::Result<TreeOutput> {
    let catalog = load_catalog(items)?;
    let types = match types {
        Some(path) => load_types(path)?,
        None => catalog.types,
    };
    let forest = try_build_grouped_tree(&catalog.items, &types, &config.grouping)
        .map_err(|e| malformed(output, &e))?;
    Ok(TreeOutput {
        records: catalog.items.len(),
        roots: forest.to_nested(config.render.max_depth),
        rows: rows(&forest, config.render.max_depth),
    })
}
