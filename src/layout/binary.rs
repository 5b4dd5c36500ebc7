//! Binary guillotine treemap: at each level the child list is cut at the
//! prefix-sum midpoint and the rectangle is split along its longer side,
//! proportionally to the cumulative weight on each side. This is the tiling
//! the production chart uses; aspect ratios stay reasonable without the
//! row-building of the squarified variant.

use std::collections::HashMap;

use crate::layout::{LayoutError, LayoutRect, Rect, RectConfig, RectLayout};
use crate::tree::arena::{FileTree, NodeId};

/// Compute a binary treemap for the subtree under `root` inside a
/// `viewport_w` x `viewport_h` viewport.
pub fn compute_binary_layout(
    tree: &FileTree,
    root: NodeId,
    viewport_w: f64,
    viewport_h: f64,
    config: &RectConfig,
) -> Result<RectLayout, LayoutError> {
    let root_rect = validated_viewport(viewport_w, viewport_h)?;
    if tree.get(root).size == 0 && tree.children(root).next().is_some() {
        return Err(LayoutError::InvalidWeight(format!(
            "'{}' has children but no positive weight to subdivide by",
            tree.get(root).name
        )));
    }

    let mut rects = Vec::with_capacity(tree.len() / 4);
    let mut node_to_rect = HashMap::new();

    rects.push(LayoutRect {
        node: root,
        rect: root_rect,
        depth: 0,
    });
    node_to_rect.insert(root, 0);

    layout_children(tree, root, root_rect, 0, config, &mut rects, &mut node_to_rect);

    Ok(RectLayout {
        rects,
        node_to_rect,
    })
}

pub(crate) fn validated_viewport(w: f64, h: f64) -> Result<Rect, LayoutError> {
    if !(w > 0.0) || !(h > 0.0) {
        return Err(LayoutError::InvalidPolygon(format!(
            "viewport must have positive extent, got {}x{}",
            w, h
        )));
    }
    Ok(Rect::new(0.0, 0.0, w, h))
}

fn layout_children(
    tree: &FileTree,
    parent: NodeId,
    rect: Rect,
    depth: u16,
    config: &RectConfig,
    rects: &mut Vec<LayoutRect>,
    node_to_rect: &mut HashMap<NodeId, usize>,
) {
    if depth >= config.max_depth {
        return;
    }

    // Label band + gutters come off before the children are placed.
    let inner = rect.inset(&config.padding);
    if inner.area() < config.min_area {
        return;
    }

    let children: Vec<NodeId> = tree.children(parent).collect();
    if children.is_empty() {
        return;
    }

    let total: f64 = children.iter().map(|&id| tree.get(id).size as f64).sum();
    if total <= 0.0 {
        tracing::debug!(
            "skipping binary layout under '{}': zero total child weight at depth {}",
            tree.get(parent).name,
            depth
        );
        return;
    }

    // Prefix sums over the child weights, sums[0] = 0.
    let mut sums = Vec::with_capacity(children.len() + 1);
    sums.push(0.0);
    for &id in &children {
        sums.push(sums.last().unwrap() + tree.get(id).size as f64);
    }

    let mut placed = Vec::with_capacity(children.len());
    partition(&children, &sums, 0, children.len(), total, inner, &mut placed);

    for (child, child_rect) in placed {
        if child_rect.area() < config.min_area {
            continue;
        }
        let idx = rects.len();
        rects.push(LayoutRect {
            node: child,
            rect: child_rect,
            depth: depth + 1,
        });
        node_to_rect.insert(child, idx);

        layout_children(tree, child, child_rect, depth + 1, config, rects, node_to_rect);
    }
}

/// Guillotine split of `nodes[i..j]` into `rect`: cut the list where the
/// prefix sum is nearest to half the value, split the rect along its longer
/// side, recurse on both halves.
fn partition(
    nodes: &[NodeId],
    sums: &[f64],
    i: usize,
    j: usize,
    value: f64,
    rect: Rect,
    out: &mut Vec<(NodeId, Rect)>,
) {
    if i >= j {
        return;
    }
    if i + 1 == j {
        out.push((nodes[i], rect));
        return;
    }

    let offset = sums[i];
    let target = value * 0.5 + offset;

    // Binary search for the cut, then nudge to whichever side is closer.
    let mut k = i + 1;
    let mut hi = j - 1;
    while k < hi {
        let mid = (k + hi) / 2;
        if sums[mid] < target {
            k = mid + 1;
        } else {
            hi = mid;
        }
    }
    if (target - sums[k - 1]) < (sums[k] - target) && i + 1 < k {
        k -= 1;
    }

    let value_left = sums[k] - offset;
    let value_right = value - value_left;

    if rect.width() > rect.height() {
        let xk = if value > 0.0 {
            (rect.x0 * value_right + rect.x1 * value_left) / value
        } else {
            rect.x1
        };
        partition(nodes, sums, i, k, value_left, Rect::new(rect.x0, rect.y0, xk, rect.y1), out);
        partition(nodes, sums, k, j, value_right, Rect::new(xk, rect.y0, rect.x1, rect.y1), out);
    } else {
        let yk = if value > 0.0 {
            (rect.y0 * value_right + rect.y1 * value_left) / value
        } else {
            rect.y1
        };
        partition(nodes, sums, i, k, value_left, Rect::new(rect.x0, rect.y0, rect.x1, yk), out);
        partition(nodes, sums, k, j, value_right, Rect::new(rect.x0, yk, rect.x1, rect.y1), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Insets;
    use crate::tree::arena::{FileNode, FileTree, NodeKind};

    fn tree_with_weights(weights: &[u64]) -> (FileTree, Vec<NodeId>) {
        let mut tree = FileTree::new("root");
        // add_child prepends, so insert in reverse to keep the given order
        let mut ids: Vec<NodeId> = weights
            .iter()
            .rev()
            .map(|&w| tree.add_child(tree.root, FileNode::new("f", w, NodeKind::File)))
            .collect();
        ids.reverse();
        crate::tree::aggregate::aggregate_sizes(&mut tree);
        (tree, ids)
    }

    fn zero_padding() -> RectConfig {
        RectConfig {
            padding: Insets::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn fifty_thirty_twenty_guillotine_cuts() {
        let (tree, ids) = tree_with_weights(&[50, 30, 20]);
        let layout =
            compute_binary_layout(&tree, tree.root, 100.0, 100.0, &zero_padding()).unwrap();

        // First cut: a 50-area region and a 50-area remainder split 30/20.
        let r50 = layout.rects[layout.node_to_rect[&ids[0]]].rect;
        let r30 = layout.rects[layout.node_to_rect[&ids[1]]].rect;
        let r20 = layout.rects[layout.node_to_rect[&ids[2]]].rect;
        assert!((r50.area() - 5000.0).abs() < 1e-6);
        assert!((r30.area() - 3000.0).abs() < 1e-6);
        assert!((r20.area() - 2000.0).abs() < 1e-6);

        // The 30 and 20 rects tile the remainder of the first cut.
        assert!((r30.area() + r20.area() - r50.area()).abs() < 1e-6);
    }

    #[test]
    fn children_stay_inside_label_band() {
        let (tree, ids) = tree_with_weights(&[60, 40]);
        let config = RectConfig::default();
        let layout = compute_binary_layout(&tree, tree.root, 400.0, 300.0, &config).unwrap();

        for &id in &ids {
            let r = layout.rects[layout.node_to_rect[&id]].rect;
            assert!(r.y0 >= 25.0); // top label band
            assert!(r.x0 >= 6.0 && r.x1 <= 394.0 && r.y1 <= 294.0);
        }
    }

    #[test]
    fn single_child_fills_padded_region() {
        let (tree, ids) = tree_with_weights(&[10]);
        let layout =
            compute_binary_layout(&tree, tree.root, 100.0, 100.0, &zero_padding()).unwrap();
        let r = layout.rects[layout.node_to_rect[&ids[0]]].rect;
        assert!((r.area() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let (tree, _) = tree_with_weights(&[1]);
        let err = compute_binary_layout(&tree, tree.root, 0.0, 100.0, &zero_padding())
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPolygon(_)));
    }

    #[test]
    fn zero_weight_root_is_rejected() {
        let (tree, _) = tree_with_weights(&[0, 0]);
        let err = compute_binary_layout(&tree, tree.root, 100.0, 100.0, &zero_padding())
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidWeight(_)));
    }
}
