//! The `/chart.json` wire model: what the server hands the browser chart.
//!
//! A document is one nested node tree plus a `render_time` diagnostic.
//! `value` doubles as byte count (disk charts) and plain weight (the GDP
//! demo document calls the field `weight`, accepted as an alias).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::aggregate;
use crate::tree::arena::{FileNode, FileTree, NodeId, NodeKind};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed chart document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown node type tag {0}")]
    UnknownTag(i32),
    #[error("no node with id {0}")]
    NoSuchNode(u64),
}

fn default_typ() -> i32 {
    NodeKind::Dir.wire_tag()
}

/// One node of a chart document. Weight-only hierarchies (the GDP demo)
/// omit `typ`, `id`, and `num_children`; sensible defaults keep them
/// parseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartNode {
    pub name: String,
    /// Wire type tag; negative values mark synthetic, non-navigable cells
    #[serde(default = "default_typ")]
    pub typ: i32,
    #[serde(default)]
    pub id: u64,
    /// Bytes for disk charts, arbitrary weight units otherwise
    #[serde(alias = "weight")]
    pub value: f64,
    /// Total descendants in the full tree, not just the embedded ones
    #[serde(default)]
    pub num_children: u64,
    #[serde(default)]
    pub children: Vec<ChartNode>,
}

impl ChartNode {
    /// The frontend click rule: navigating into a node only makes sense
    /// when it is non-synthetic and has something underneath.
    pub fn can_navigate(&self) -> bool {
        self.typ >= 0 && self.num_children > 0
    }
}

/// A full chart response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDocument {
    #[serde(flatten)]
    pub root: ChartNode,
    /// Server-side render duration in seconds, diagnostics only
    #[serde(default)]
    pub render_time: f64,
}

/// Extract a depth-limited chart node for the subtree under `node`.
/// `depth` counts embedded child levels: 0 embeds no children, 1 embeds
/// direct children, and so on. `num_children` always reports the full
/// descendant count. Worklist-driven, so tree height never turns into
/// call-stack depth.
pub fn extract(tree: &FileTree, node: NodeId, depth: u16) -> ChartNode {
    // Flatten the subtree into (parent index, node) pairs, then fold the
    // children back into their parents. A node's descendants always land
    // at higher indices, so folding from the back works bottom-up; pushing
    // children onto the worklist in sibling order makes them pop in
    // reverse, which the reverse fold undoes.
    let mut flat: Vec<(usize, ChartNode)> = Vec::new();
    let mut pending: Vec<(NodeId, u16, usize)> = vec![(node, depth, 0)];
    while let Some((id, remaining, parent)) = pending.pop() {
        let n = tree.get(id);
        let idx = flat.len();
        flat.push((
            parent,
            ChartNode {
                name: n.name.to_string(),
                typ: n.kind.wire_tag(),
                id: id.0 as u64,
                value: n.size as f64,
                num_children: n.num_descendants as u64,
                children: Vec::new(),
            },
        ));
        if remaining > 0 {
            for child in tree.children(id) {
                pending.push((child, remaining - 1, idx));
            }
        }
    }

    while flat.len() > 1 {
        if let Some((parent, chart_node)) = flat.pop() {
            flat[parent].1.children.push(chart_node);
        }
    }
    let (_, root) = flat.swap_remove(0);
    root
}

/// Build a chart response for a node, stamping how long extraction took.
pub fn document(tree: &FileTree, node: NodeId, depth: u16) -> ChartDocument {
    let start = std::time::Instant::now();
    let root = extract(tree, node, depth);
    ChartDocument {
        root,
        render_time: start.elapsed().as_secs_f64(),
    }
}

/// Weight units survive as fixed-point so fractional GDP-style weights
/// keep their ratios in the integer arena.
const VALUE_SCALE: f64 = 1_000_000.0;

/// Rebuild an arena tree from a chart document, for laying out fetched
/// data. Unknown type tags are rejected rather than guessed at.
pub fn to_tree(root: &ChartNode) -> Result<FileTree, ChartError> {
    NodeKind::from_wire_tag(root.typ).ok_or(ChartError::UnknownTag(root.typ))?;

    let mut tree = FileTree::new(&root.name);
    tree.get_mut(tree.root).size = scaled_value(root.value);

    // Children pushed in reverse: add_child prepends to the sibling list.
    let mut pending: Vec<(&ChartNode, NodeId)> = vec![(root, tree.root)];
    while let Some((chart_node, arena_id)) = pending.pop() {
        for child in chart_node.children.iter().rev() {
            let kind =
                NodeKind::from_wire_tag(child.typ).ok_or(ChartError::UnknownTag(child.typ))?;
            let node = FileNode::new(&child.name, scaled_value(child.value), kind);
            let child_id = tree.add_child(arena_id, node);
            pending.push((child, child_id));
        }
    }

    aggregate::aggregate_sizes(&mut tree);
    aggregate::aggregate_counts(&mut tree);
    Ok(tree)
}

fn scaled_value(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value * VALUE_SCALE).round() as u64
    } else {
        0
    }
}
