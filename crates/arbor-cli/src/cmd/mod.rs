//! Subcommand handlers.
//!
//! Each handler loads its record file, runs one engine operation, and hands a
//! serializable payload to [`crate::output::render`].

#![allow(clippy::must_use_candidate)]

pub mod check;
pub mod cycles;
pub mod flat;
pub mod grouped;
pub mod tree;

use std::io::{self, Write};

use arbor_core::graph::{BuildError, Forest, NodeKind, Relation};
use serde::Serialize;

use crate::output::{CliError, OutputMode, render_error};

/// One visible position of a forest, with the title resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub index: usize,
    pub depth: usize,
    pub relation: Relation,
    pub kind: NodeKind,
    pub id: String,
    pub title: String,
}

/// Flatten `forest` into display rows.
pub fn rows(forest: &Forest, max_depth: usize) -> Vec<Row> {
    forest
        .flatten(max_depth)
        .iter()
        .enumerate()
        .map(|(index, entry)| Row {
            index,
            depth: entry.depth,
            relation: entry.relation,
            kind: entry.kind,
            id: entry.id.clone(),
            title: forest[entry.node].title.clone(),
        })
        .collect()
}

/// Indented tree for pretty mode, tab-separated rows for text mode.
pub fn render_rows(
    rows: &[Row],
    mode: OutputMode,
    show_index: bool,
    w: &mut dyn Write,
) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(w, "No records.");
    }

    for row in rows {
        if mode.is_pretty() {
            let indent = "  ".repeat(row.depth);
            let marker = match row.relation {
                Relation::Root => "",
                Relation::Child => "- ",
                Relation::SubType => "~ ",
            };
            let label = if row.kind.is_pseudo() {
                format!("[{}]", row.title)
            } else {
                format!("{}  {}", row.id, row.title)
            };
            if show_index {
                writeln!(w, "{:>4}  {indent}{marker}{label}", row.index)?;
            } else {
                writeln!(w, "{indent}{marker}{label}")?;
            }
        } else {
            let relation = match row.relation {
                Relation::Root => "root",
                Relation::Child => "child",
                Relation::SubType => "subtype",
            };
            if show_index {
                write!(w, "{}\t", row.index)?;
            }
            writeln!(w, "{}\t{relation}\t{}\t{}", row.depth, row.id, row.title)?;
        }
    }
    Ok(())
}

/// Report a malformed record batch and turn it into a command failure.
pub fn malformed(output: OutputMode, err: &BuildError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from_code(err.code(), err.to_string()))
    {
        tracing::warn!(error = %render_err, "failed to render error");
    }
    anyhow::anyhow!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::graph::build_tree;
    use arbor_core::model::Record;

    fn sample_rows() -> Vec<Row> {
        let records = vec![
            Record::new("A", "Alpha"),
            Record::new("B", "Beta").with_parents(["A"]),
            Record::new("C", "Gamma").subtype_of("A"),
        ];
        rows(&build_tree(&records), 64)
    }

    #[test]
    fn rows_resolve_titles_in_preorder() {
        let rows = sample_rows();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C", "B"]);
        assert_eq!(rows[1].title, "Gamma");
        assert_eq!(rows[1].relation, Relation::SubType);
        assert_eq!(rows[2].index, 2);
    }

    #[test]
    fn pretty_rows_are_indented() {
        let mut out = Vec::new();
        render_rows(&sample_rows(), OutputMode::Pretty, false, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "A  Alpha\n  ~ C  Gamma\n  - B  Beta\n");
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let mut out = Vec::new();
        render_rows(&sample_rows(), OutputMode::Text, true, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.lines().next(), Some("0\t0\troot\tA\tAlpha"));
        assert_eq!(text.lines().nth(1), Some("1\t1\tsubtype\tC\tGamma"));
    }

    #[test]
    fn empty_rows_say_so() {
        let mut out = Vec::new();
        render_rows(&[], OutputMode::Pretty, false, &mut out).expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "No records.\n");
    }
}
