//! `arbor flat`: list every visible position with its index.
//!
//! Indices are the positions selection clicks refer to.

use std::path::PathBuf;

use arbor_core::config::EngineConfig;
use arbor_core::graph::{try_build_grouped_tree, try_build_tree};
use clap::Args;

use super::{malformed, render_rows, rows};
use crate::input::{load_catalog, load_types};
use crate::output::{OutputMode, render};

/// Arguments for `arbor flat`.
#[derive(Args, Debug)]
pub struct FlatArgs {
    /// JSON record file (array of records, or `{items, types}`).
    pub file: PathBuf,

    /// Flatten the type-grouped forest instead of the plain one.
    #[arg(long)]
    pub grouped: bool,

    /// Type file for `--grouped`. Defaults to the `types` of the record file.
    #[arg(long, requires = "grouped")]
    pub types: Option<PathBuf>,

    /// Override the render depth limit.
    #[arg(long)]
    pub max_depth: Option<usize>,
}

/// Execute `arbor flat`.
pub fn run_flat(args: &FlatArgs, output: OutputMode, config: &EngineConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.file)?;
    let forest = if args.grouped {
        let types = match args.types.as_deref() {
            Some(path) => load_types(path)?,
            None => catalog.types,
        };
        try_build_grouped_tree(&catalog.items, &types, &config.grouping)
    } else {
        try_build_tree(&catalog.items)
    }
    .map_err(|e| malformed(output, &e))?;

    let max_depth = args.max_depth.unwrap_or(config.render.max_depth);
    let positions = rows(&forest, max_depth);
    render(output, &positions, |rows, mode, w| render_rows(rows, mode, true, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::Row;
    use arbor_core::graph::{NodeKind, Relation};
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: FlatArgs,
    }

    #[test]
    fn flat_args_defaults() {
        let parsed = Wrapper::parse_from(["test", "r.json"]);
        assert!(!parsed.args.grouped);
        assert!(parsed.args.types.is_none());
        assert!(parsed.args.max_depth.is_none());
    }

    #[test]
    fn types_requires_grouped() {
        assert!(Wrapper::try_parse_from(["test", "r.json", "--types", "t.json"]).is_err());
        let parsed = Wrapper::try_parse_from(["test", "r.json", "--grouped", "--types", "t.json"])
            .expect("parse");
        assert!(parsed.args.grouped);
    }

    #[test]
    fn pretty_rows_show_indices() {
        let rows = vec![Row {
            index: 0,
            depth: 0,
            relation: Relation::Root,
            kind: NodeKind::Record,
            id: "a".to_string(),
            title: "Alpha".to_string(),
        }];
        let mut out = Vec::new();
        render_rows(&rows, OutputMode::Pretty, true, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "   0  a  Alpha\n");
    }
}
