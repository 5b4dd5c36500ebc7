//! Recursive Voronoi subdivision of a weighted hierarchy.
//!
//! One level at a time: place one site per child inside the parent's
//! polygon, relax until sibling cell areas are proportional to sibling
//! weights, then descend into each child with its new cell as the clipping
//! region. Driven by an explicit worklist so tree height never turns into
//! call-stack depth.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::geom::{Point, Polygon, AREA_EPSILON};
use crate::layout::relax::{CellEngine, RelaxParams};
use crate::layout::LayoutError;
use crate::tree::arena::{FileTree, NodeId};

/// Configuration for recursive Voronoi subdivision.
#[derive(Debug, Clone)]
pub struct VoronoiConfig {
    /// Relative area error at which a subdivision step stops relaxing
    pub convergence_ratio: f64,
    /// Iteration cap per subdivision step
    pub max_iterations: u32,
    /// Weights below this fraction of the largest sibling weight are
    /// clamped up, so tiny files still get visible cells
    pub min_weight_ratio: f64,
    /// Seed for the site-placement PRNG; same seed, same layout
    pub seed: u64,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            convergence_ratio: 0.01,
            max_iterations: 50,
            min_weight_ratio: 0.01,
            seed: 0,
        }
    }
}

/// One node's cell in the finished layout.
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    pub node: NodeId,
    pub polygon: Polygon,
    /// Final site position (label anchor)
    pub site: Point,
    pub depth: u16,
    /// Whether the subdivision step that produced this cell converged
    pub converged: bool,
}

/// The full Voronoi layout: every node in the subtree gets a cell, root
/// included. The tree itself is never mutated.
#[derive(Debug)]
pub struct VoronoiLayout {
    pub cells: Vec<VoronoiCell>,
    /// node → index into `cells`
    pub node_to_cell: HashMap<NodeId, usize>,
}

impl VoronoiLayout {
    pub fn cell(&self, node: NodeId) -> Option<&VoronoiCell> {
        self.node_to_cell.get(&node).map(|&i| &self.cells[i])
    }

    /// True when every subdivision step met its convergence tolerance.
    pub fn fully_converged(&self) -> bool {
        self.cells.iter().all(|c| c.converged)
    }
}

/// Assign every node under `root` a cell polygon inside `clip`, sibling
/// areas proportional to sibling weights. The root keeps `clip` unchanged.
pub fn compute_voronoi_layout(
    tree: &FileTree,
    root: NodeId,
    clip: &Polygon,
    engine: &dyn CellEngine,
    config: &VoronoiConfig,
) -> Result<VoronoiLayout, LayoutError> {
    if clip.len() < 3 {
        return Err(LayoutError::InvalidPolygon(format!(
            "clipping polygon needs at least 3 vertices, got {}",
            clip.len()
        )));
    }
    if clip.area() <= AREA_EPSILON {
        return Err(LayoutError::InvalidPolygon(
            "clipping polygon encloses zero area".into(),
        ));
    }

    let mut root_clip = clip.clone();
    root_clip.normalize_ccw();

    let params = RelaxParams {
        convergence_ratio: config.convergence_ratio,
        max_iterations: config.max_iterations,
    };
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut cells = Vec::with_capacity(tree.len());
    let mut node_to_cell = HashMap::with_capacity(tree.len());

    let root_site = root_clip.centroid();
    node_to_cell.insert(root, cells.len());
    cells.push(VoronoiCell {
        node: root,
        polygon: root_clip.clone(),
        site: root_site,
        depth: 0,
        converged: true,
    });

    // Worklist of (parent, parent polygon, depth) pairs still to subdivide.
    let mut pending: Vec<(NodeId, Polygon, u16)> = vec![(root, root_clip, 0)];

    while let Some((parent, polygon, depth)) = pending.pop() {
        let children: Vec<NodeId> = tree.children(parent).collect();
        if children.is_empty() {
            continue;
        }

        // A single child inherits the parent polygon unchanged.
        if children.len() == 1 {
            let child = children[0];
            node_to_cell.insert(child, cells.len());
            cells.push(VoronoiCell {
                node: child,
                site: polygon.centroid(),
                polygon: polygon.clone(),
                depth: depth + 1,
                converged: true,
            });
            pending.push((child, polygon, depth + 1));
            continue;
        }

        let weights = match clamped_weights(tree, parent, &children, config.min_weight_ratio) {
            Ok(w) => w,
            // Zero weight at the layout root is the caller's error; a nested
            // empty directory just ends subdivision for that subtree.
            Err(e) if parent == root => return Err(e),
            Err(_) => {
                tracing::debug!(
                    "skipping subdivision of '{}': children have no positive weight",
                    tree.get(parent).name
                );
                continue;
            }
        };

        let outcome = engine.compute_cells(&weights, &polygon, &params, &mut rng)?;
        if !outcome.converged {
            tracing::debug!(
                "subdivision of '{}' stopped at iteration cap (residual error {:.4})",
                tree.get(parent).name,
                outcome.area_error
            );
        }

        for (child, cell) in children.into_iter().zip(outcome.cells) {
            node_to_cell.insert(child, cells.len());
            cells.push(VoronoiCell {
                node: child,
                site: cell.site,
                polygon: cell.polygon.clone(),
                depth: depth + 1,
                converged: outcome.converged,
            });
            pending.push((child, cell.polygon, depth + 1));
        }
    }

    tracing::info!(
        "voronoi layout: {} cells for {} nodes under '{}'",
        cells.len(),
        tree.len(),
        tree.get(root).name
    );

    Ok(VoronoiLayout {
        cells,
        node_to_cell,
    })
}

/// Child weights with the `min_weight_ratio` floor applied. Rejects the
/// step when no child carries any weight at all.
fn clamped_weights(
    tree: &FileTree,
    parent: NodeId,
    children: &[NodeId],
    min_weight_ratio: f64,
) -> Result<Vec<f64>, LayoutError> {
    let raw: Vec<f64> = children
        .iter()
        .map(|&id| tree.get(id).size as f64)
        .collect();
    let max = raw.iter().cloned().fold(0.0, f64::max);
    if max <= 0.0 {
        return Err(LayoutError::InvalidWeight(format!(
            "children of '{}' have no positive weight to subdivide by",
            tree.get(parent).name
        )));
    }
    let floor = max * min_weight_ratio;
    Ok(raw.into_iter().map(|w| w.max(floor)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::relax::PowerDiagram;
    use crate::tree::arena::{FileNode, NodeKind};

    fn node(name: &str, size: u64, kind: NodeKind) -> FileNode {
        FileNode::new(name, size, kind)
    }

    /// root(100) -> a(75), b(25)
    fn two_child_tree() -> (FileTree, NodeId, NodeId) {
        let mut tree = FileTree::new("root");
        let b = tree.add_child(tree.root, node("b", 25, NodeKind::File));
        let a = tree.add_child(tree.root, node("a", 75, NodeKind::File));
        crate::tree::aggregate::aggregate_sizes(&mut tree);
        (tree, a, b)
    }

    fn square() -> Polygon {
        Polygon::rect(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn root_polygon_is_input_clip_unchanged() {
        let (tree, _, _) = two_child_tree();
        let clip = square();
        let layout =
            compute_voronoi_layout(&tree, tree.root, &clip, &PowerDiagram, &Default::default())
                .unwrap();
        assert_eq!(layout.cell(tree.root).unwrap().polygon, clip);
    }

    #[test]
    fn sibling_areas_track_weights() {
        let (tree, a, b) = two_child_tree();
        let layout =
            compute_voronoi_layout(&tree, tree.root, &square(), &PowerDiagram, &Default::default())
                .unwrap();

        assert!(layout.fully_converged());
        let area_a = layout.cell(a).unwrap().polygon.area();
        let area_b = layout.cell(b).unwrap().polygon.area();
        assert!((area_a - 75.0).abs() < 1.5, "a = {}", area_a);
        assert!((area_b - 25.0).abs() < 1.5, "b = {}", area_b);
    }

    #[test]
    fn leaf_areas_sum_to_root_area() {
        let mut tree = FileTree::new("root");
        let dir = tree.add_child(tree.root, node("dir", 0, NodeKind::Dir));
        tree.add_child(dir, node("x", 40, NodeKind::File));
        tree.add_child(dir, node("y", 20, NodeKind::File));
        tree.add_child(tree.root, node("z", 40, NodeKind::File));
        crate::tree::aggregate::aggregate_sizes(&mut tree);

        let layout =
            compute_voronoi_layout(&tree, tree.root, &square(), &PowerDiagram, &Default::default())
                .unwrap();

        let leaf_total: f64 = layout
            .cells
            .iter()
            .filter(|c| tree.children(c.node).next().is_none())
            .map(|c| c.polygon.area())
            .sum();
        // Leaves partition the root polygon exactly, convergence aside.
        assert!((leaf_total - 100.0).abs() < 1e-6, "leaves = {}", leaf_total);
    }

    #[test]
    fn single_child_inherits_parent_polygon() {
        let mut tree = FileTree::new("root");
        let only = tree.add_child(tree.root, node("only", 10, NodeKind::File));
        crate::tree::aggregate::aggregate_sizes(&mut tree);

        let clip = square();
        let layout =
            compute_voronoi_layout(&tree, tree.root, &clip, &PowerDiagram, &Default::default())
                .unwrap();
        assert_eq!(layout.cell(only).unwrap().polygon, clip);
    }

    #[test]
    fn tiny_sibling_still_gets_positive_area() {
        let mut tree = FileTree::new("root");
        let speck = tree.add_child(tree.root, node("speck", 1, NodeKind::File));
        tree.add_child(tree.root, node("huge", 1_000_000, NodeKind::File));
        crate::tree::aggregate::aggregate_sizes(&mut tree);

        let layout =
            compute_voronoi_layout(&tree, tree.root, &square(), &PowerDiagram, &Default::default())
                .unwrap();
        assert!(layout.cell(speck).unwrap().polygon.area() > 0.0);
    }

    #[test]
    fn same_seed_yields_same_polygons() {
        let (tree, _, _) = two_child_tree();
        let config = VoronoiConfig {
            seed: 42,
            ..Default::default()
        };
        let a = compute_voronoi_layout(&tree, tree.root, &square(), &PowerDiagram, &config)
            .unwrap();
        let b = compute_voronoi_layout(&tree, tree.root, &square(), &PowerDiagram, &config)
            .unwrap();
        for (ca, cb) in a.cells.iter().zip(&b.cells) {
            assert_eq!(ca.polygon, cb.polygon);
        }
    }

    #[test]
    fn zero_total_weight_is_rejected() {
        let mut tree = FileTree::new("root");
        tree.add_child(tree.root, node("a", 0, NodeKind::File));
        tree.add_child(tree.root, node("b", 0, NodeKind::File));

        let err = compute_voronoi_layout(
            &tree,
            tree.root,
            &square(),
            &PowerDiagram,
            &Default::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidWeight(_)));
    }

    #[test]
    fn underspecified_clip_is_rejected() {
        let (tree, _, _) = two_child_tree();
        let line = Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        let err =
            compute_voronoi_layout(&tree, tree.root, &line, &PowerDiagram, &Default::default())
                .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPolygon(_)));
    }
}
