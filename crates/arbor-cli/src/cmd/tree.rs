//! `arbor tree`: render the plain forest of a record file.

use std::io::Write;
use std::path::{Path, PathBuf};

use arbor_core::config::EngineConfig;
use arbor_core::graph::{NestedNode, try_build_tree};
use clap::Args;
use serde::Serialize;

use super::{Row, malformed, render_rows, rows};
use crate::input::load_catalog;
use crate::output::{OutputMode, pretty_section, render};

/// Arguments for `arbor tree`.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// JSON record file (array of records, or `{items, types}`).
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub(crate) struct TreeOutput {
    pub records: usize,
    pub roots: Vec<NestedNode>,
    #[serde(skip)]
    pub rows: Vec<Row>,
}

/// Execute `arbor tree`.
pub fn run_tree(args: &TreeArgs, output: OutputMode, config: &EngineConfig) -> anyhow::Result<()> {
    let payload = build_output(&args.file, output, config)?;
    render(output, &payload, render_tree_human)
}

fn build_output(file: &Path, output: OutputMode, config: &EngineConfig) -> anyhow::Result<TreeOutput> {
    let catalog = load_catalog(file)?;
    let forest = try_build_tree(&catalog.items).map_err(|e| malformed(output, &e))?;
    Ok(TreeOutput {
        records: catalog.items.len(),
        roots: forest.to_nested(config.render.max_depth),
        rows: rows(&forest, config.render.max_depth),
    })
}

pub(crate) fn render_tree_human(
    payload: &TreeOutput,
    mode: OutputMode,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if mode.is_pretty() {
        pretty_section(
            w,
            &format!("Forest ({} records, {} roots)", payload.records, payload.roots.len()),
        )?;
    }
    render_rows(&payload.rows, mode, false, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_args_parse_file() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: TreeArgs,
        }

        let parsed = Wrapper::parse_from(["test", "records.json"]);
        assert_eq!(parsed.args.file, PathBuf::from("records.json"));
    }

    #[test]
    fn build_output_nests_reference_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"id":"A","title":"A"},
                {"id":"B","title":"B","parent_ids":["A"]},
                {"id":"C","title":"C","subtype_of_id":"A"},
                {"id":"D","title":"D","parent_ids":["X"]}]"#,
        )
        .expect("write");

        let payload = build_output(&path, OutputMode::Text, &EngineConfig::default()).expect("build");
        assert_eq!(payload.records, 4);
        let roots: Vec<&str> = payload.roots.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["A", "D"]);
        assert_eq!(payload.roots[0].children[0].id, "B");
        assert_eq!(payload.roots[0].sub_types[0].id, "C");
    }

    #[test]
    fn pretty_output_has_heading() {
        let payload = TreeOutput {
            records: 0,
            roots: Vec::new(),
            rows: Vec::new(),
        };
        let mut out = Vec::new();
        render_tree_human(&payload, OutputMode::Pretty, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("Forest (0 records, 0 roots)"));
        assert!(text.contains("No records."));
    }
}
