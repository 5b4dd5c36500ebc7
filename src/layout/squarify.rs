//! Squarified treemap tiling, the alternative to the binary cut. Builds
//! rows against the short side of the remaining space and keeps the worst
//! aspect ratio in each row as low as it can.

use std::collections::HashMap;

use crate::layout::binary::validated_viewport;
use crate::layout::{LayoutError, LayoutRect, Rect, RectConfig, RectLayout};
use crate::tree::arena::{FileTree, NodeId};

/// Compute a squarified treemap for the subtree under `root`.
pub fn compute_squarify_layout(
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

    let inner = rect.inset(&config.padding);
    if inner.area() < config.min_area {
        return;
    }

    let parent_size = tree.get(parent).size as f64;
    if parent_size <= 0.0 {
        tracing::debug!(
            "skipping squarified layout under '{}' with zero size at depth {}",
            tree.get(parent).name,
            depth
        );
        return;
    }

    // Sort children by size descending (critical for good squarified rows).
    let mut children: Vec<NodeId> = tree.children(parent).collect();
    children.sort_by_key(|&id| std::cmp::Reverse(tree.get(id).size));
    if children.is_empty() {
        return;
    }

    let total_area = inner.area();
    let areas: Vec<f64> = children
        .iter()
        .map(|&id| tree.get(id).size as f64 / parent_size * total_area)
        .collect();

    let positioned = squarify(&areas, inner.x0, inner.y0, inner.width(), inner.height());

    for (i, child_rect) in positioned.into_iter().enumerate() {
        let child = children[i];
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

/// Row-based squarified layout. Tries multiple row lengths and keeps the
/// one with the best worst-aspect-ratio score.
fn squarify(areas: &[f64], mut x: f64, mut y: f64, mut w: f64, mut h: f64) -> Vec<Rect> {
    let mut result = Vec::with_capacity(areas.len());
    let mut remaining: Vec<f64> = areas.to_vec();

    while !remaining.is_empty() {
        if w <= 1e-6 || h <= 1e-6 {
            break;
        }

        let horizontal = w >= h;
        let short = if horizontal { h } else { w };

        // Find the row length with the best worst-aspect-ratio.
        let mut best_score = f64::INFINITY;
        let mut best_k = 1;
        let mut row_sum = 0.0;

        for k in 1..=remaining.len().min(20) {
            let sum: f64 = remaining[0..k].iter().sum();
            let score = worst_aspect_ratio(&remaining[0..k], sum, short);
            if score < best_score {
                best_score = score;
                best_k = k;
                row_sum = sum;
            } else if k > 3 {
                break; // diminishing returns
            }
        }

        let row = &remaining[0..best_k];
        // A horizontal row's thickness consumes height and is computed
        // against the available width; a vertical column, vice versa.
        let long = if horizontal { w } else { h };
        let thickness = row_sum / long.max(1e-8);

        let mut offset = 0.0;
        for &area in row {
            let length = area / thickness.max(1e-8);

            if !length.is_finite() || !thickness.is_finite() || length <= 0.0 || thickness <= 0.0 {
                tracing::warn!(
                    "squarify: invalid dimensions (length={}, thickness={}, area={}), skipping",
                    length,
                    thickness,
                    area
                );
                continue;
            }

            let r = if horizontal {
                Rect::new(x + offset, y, x + offset + length, y + thickness)
            } else {
                Rect::new(x, y + offset, x + thickness, y + offset + length)
            };
            result.push(r);
            offset += length;
        }

        // Shrink the remaining space.
        if horizontal {
            y += thickness;
            h = (h - thickness).max(0.0);
        } else {
            x += thickness;
            w = (w - thickness).max(0.0);
        }

        remaining.drain(0..best_k);
    }

    result
}

fn worst_aspect_ratio(row: &[f64], sum: f64, side: f64) -> f64 {
    if row.is_empty() || sum <= 0.0 || side <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let max_r = row.iter().copied().fold(0.0, f64::max);
    let min_r = row.iter().copied().fold(f64::INFINITY, f64::min);
    let a = (side_sq * max_r) / sum_sq;
    let b = sum_sq / (side_sq * min_r);
    a.max(b)
}

#[cfg(test)]
mod tests {
    use super::squarify;

    #[test]
    fn single_item_fills_viewport_without_axis_swap() {
        let rects = squarify(&[1920.0 * 1080.0], 0.0, 0.0, 1920.0, 1080.0);
        assert_eq!(rects.len(), 1);
        let r = rects[0];
        assert!((r.width() - 1920.0).abs() < 1e-6);
        assert!((r.height() - 1080.0).abs() < 1e-6);
    }

    #[test]
    fn layout_preserves_area_for_simple_case() {
        let areas = [400.0, 300.0, 200.0, 100.0];
        let rects = squarify(&areas, 0.0, 0.0, 50.0, 20.0);
        let total_in: f64 = areas.iter().sum();
        let total_out: f64 = rects.iter().map(|r| r.area()).sum();
        assert!((total_in - total_out).abs() < 1e-6);
    }

    #[test]
    fn rows_stay_inside_the_viewport() {
        let areas = [500.0, 300.0, 200.0];
        let rects = squarify(&areas, 0.0, 0.0, 40.0, 25.0);
        assert_eq!(rects.len(), 3);
        for r in &rects {
            assert!(r.x0 >= -1e-9 && r.y0 >= -1e-9);
            assert!(r.x1 <= 40.0 + 1e-9 && r.y1 <= 25.0 + 1e-9);
        }
    }
}
