//! Colored text rendering of a delta.
//!
//! ```text
//! items
//!   1
//!     ~ v: "x" -> "y"
//!   + 2: {"id":2}
//! - legacy: true
//! ```

use std::fmt::Write;

use colored::Colorize;

use jcmp_diff::{DiffNode, DiffStats};
use jcmp_types::Value;

const INDENT: &str = "  ";

/// Render a delta as an indented tree, one difference per line.
pub fn render_tree(node: &DiffNode) -> String {
    let mut out = String::new();
    if node.is_unchanged() {
        let _ = writeln!(out, "{}", "No differences.".green());
        return out;
    }
    match node {
        DiffNode::Subtree(_) => render_entries(node, 0, &mut out),
        leaf => render_leaf("(document)", leaf, 0, &mut out),
    }
    out
}

/// One-line count of the leaves of a delta.
pub fn render_stats(stats: &DiffStats) -> String {
    format!(
        "{} only in first, {} only in second, {} changed",
        stats.only_in_first.to_string().red(),
        stats.only_in_second.to_string().green(),
        stats.changed.to_string().yellow(),
    )
}

fn render_entries(node: &DiffNode, depth: usize, out: &mut String) {
    for (key, child) in node.entries() {
        match child {
            DiffNode::Unchanged => {}
            DiffNode::Subtree(_) => {
                let _ = writeln!(out, "{}{}", INDENT.repeat(depth), key.bold());
                render_entries(child, depth + 1, out);
            }
            leaf => render_leaf(key, leaf, depth, out),
        }
    }
}

fn render_leaf(key: &str, leaf: &DiffNode, depth: usize, out: &mut String) {
    let indent = INDENT.repeat(depth);
    let _ = match leaf {
        DiffNode::OnlyInFirst(value) => writeln!(
            out,
            "{indent}{} {}: {}",
            "-".red().bold(),
            key,
            shown(value).red()
        ),
        DiffNode::OnlyInSecond(value) => writeln!(
            out,
            "{indent}{} {}: {}",
            "+".green().bold(),
            key,
            shown(value).green()
        ),
        DiffNode::Changed(first, second) => writeln!(
            out,
            "{indent}{} {}: {} -> {}",
            "~".yellow().bold(),
            key,
            shown(first).red(),
            shown(second).green()
        ),
        DiffNode::Unchanged | DiffNode::Subtree(_) => Ok(()),
    };
}

fn shown(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text:?}"),
        other => other.render(),
    }
}
