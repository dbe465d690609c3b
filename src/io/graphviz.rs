//! Graphviz `dot` export of a tree.
//!
//! Nodes are grouped in one cluster per depth, labelled with the
//! instance-weighted cost of that depth. Each node shows its instance count,
//! the first few instance names, and the recommended configuration with its
//! cost.

use crate::core::constants::GRAPH_LABEL_INSTANCES;
use crate::core::error::{PdtError, Result};
use crate::dataset::{InstanceSet, ResultsSet};
use crate::tree::{Tree, TreeNode};
use std::fmt;
use std::path::Path;

/// Renders `tree` in dot format.
pub fn to_dot(tree: &Tree, instances: &InstanceSet, results: &ResultsSet) -> Result<String> {
    let mut out = String::new();
    render(&mut out, tree, instances, results)
        .map_err(|e| PdtError::serialization(format!("cannot render tree: {}", e)))?;
    Ok(out)
}

fn render<W: fmt::Write>(
    out: &mut W,
    tree: &Tree,
    instances: &InstanceSet,
    results: &ResultsSet,
) -> fmt::Result {
    writeln!(out, "digraph G {{")?;
    writeln!(out, " graph [fontname = \"helvetica\"];")?;
    writeln!(out, " node [fontname = \"helvetica\"];")?;
    writeln!(out, " edge [fontname = \"helvetica\"];")?;

    for (depth, cost) in tree.cost_by_depth().iter().enumerate() {
        writeln!(out, "  subgraph clusterdepth{} {{", depth)?;
        writeln!(out, "    style=filled;")?;
        writeln!(out, "    color=\"PaleGreen\";")?;
        writeln!(out, "    label=< <b>Depth {} cost: {}</b> >;", depth, cost)?;
        for node in tree.nodes().iter().filter(|n| n.depth() == depth) {
            writeln!(out, "  \"{}\" [", node.graph_id())?;
            writeln!(out, "    label = <")?;
            node_label(out, node, instances, results)?;
            writeln!(out, "> shape=\"box\" fillcolor=\"LightYellow\" ];")?;
        }
        writeln!(out, "  }}")?;
    }
    writeln!(out)?;

    for node in tree.nodes() {
        let (feature, threshold) = match (node.split_feature(), node.split_threshold()) {
            (Some(f), Some(t)) => (f, t),
            _ => continue,
        };
        let feature_name = instances
            .feature_name(feature)
            .map(escape)
            .unwrap_or_else(|| feature.to_string());
        for (child, op) in [(node.left_child(), "≤"), (node.right_child(), ">")] {
            if let Some(child) = child.and_then(|c| tree.node(c)) {
                writeln!(
                    out,
                    "    {} -> {} [label=\"{}{}{}\"];",
                    node.graph_id(),
                    child.graph_id(),
                    feature_name,
                    op,
                    threshold
                )?;
            }
        }
    }

    writeln!(out, "}}")
}

fn node_label<W: fmt::Write>(
    out: &mut W,
    node: &TreeNode,
    instances: &InstanceSet,
    results: &ResultsSet,
) -> fmt::Result {
    fn row<W: fmt::Write>(out: &mut W, align: &str, color: &str, text: &str) -> fmt::Result {
        writeln!(out, "     <tr>")?;
        writeln!(
            out,
            "      <td align=\"{}\"><font color=\"{}\">{}</font></td>",
            align, color, text
        )?;
        writeln!(out, "     </tr>")
    }

    writeln!(
        out,
        "     <table border=\"1\" cellspacing=\"1\" cellborder=\"1\" bgcolor=\"LightYellow\">"
    )?;
    row(out, "center", "Indigo", &format!("<b>{} instances:</b>", node.size()))?;
    for &i in node.members().iter().take(GRAPH_LABEL_INSTANCES) {
        let name = instances.instance_name(i).map(escape).unwrap_or_default();
        row(out, "left", "Indigo", &format!("<i>{}</i>", name))?;
    }
    if node.size() > GRAPH_LABEL_INSTANCES {
        row(out, "center", "Indigo", "...")?;
    }
    row(out, "center", "DarkGreen", "<b>Best algorithm setting:</b>")?;
    let setting = results
        .algorithm_name(node.best_algorithm())
        .map(escape)
        .unwrap_or_default();
    row(out, "center", "Black", &setting)?;
    row(out, "center", "DarkGreen", &format!("{:.14}", node.best_cost()))?;
    writeln!(out, "    </table>")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Writes the dot rendering of `tree` to `path`.
pub fn write_dot<P: AsRef<Path>>(
    tree: &Tree,
    instances: &InstanceSet,
    results: &ResultsSet,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let dot = to_dot(tree, instances, results)?;
    std::fs::write(path, dot).map_err(|e| {
        PdtError::serialization(format!("cannot write {}: {}", path.display(), e))
    })?;
    log::info!("Tree drawing written to {}", path.display());
    Ok(())
}
