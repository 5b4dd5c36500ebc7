/// Diagnostic tool to verify the scan → tree → layout pipeline
use dirview::geom::Polygon;
use dirview::layout::{
    compute_binary_layout, compute_voronoi_layout, PowerDiagram, RectConfig, VoronoiConfig,
};
use dirview::scanner;
use dirview::tree;
use std::path::PathBuf;
use std::sync::mpsc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dirview=debug".parse().unwrap()),
        )
        .init();

    let scan_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    println!("=== DIAGNOSTIC: Scan → Tree → Layout Pipeline ===");
    println!("Scanning: {}", scan_path.display());

    // Scan
    let (tx, _rx) = mpsc::channel();
    let entries = scanner::scan(&scan_path, tx)?;
    println!("\n[1] Scan completed: {} entries", entries.len());

    // Build tree
    let tree = tree::build_tree(&entries);
    println!("\n[2] Tree built: {} nodes", tree.len());

    let root_node = tree.get(tree.root);
    println!(
        "    Root: '{}' (size={:.2} MB, descendants={})",
        root_node.name,
        root_node.size as f64 / 1_048_576.0,
        root_node.num_descendants
    );

    // Show top 10 children of root by size
    println!("\n[3] Top 10 children of root:");
    let mut root_children: Vec<_> = tree.children(tree.root).collect();
    root_children.sort_by_key(|&id| std::cmp::Reverse(tree.get(id).size));

    for (i, child_id) in root_children.iter().take(10).enumerate() {
        let child = tree.get(*child_id);
        println!(
            "    [{}] '{}' - {:.2} MB (kind={:?}, children={})",
            i,
            child.name,
            child.size as f64 / 1_048_576.0,
            child.kind,
            tree.children(*child_id).count()
        );
    }

    // Binary layout: every leaf rect should land inside the viewport
    let rect_layout =
        compute_binary_layout(&tree, tree.root, 1500.0, 600.0, &RectConfig::default())?;
    println!("\n[4] Binary layout: {} rectangles", rect_layout.rects.len());

    let mut out_of_bounds = 0;
    for r in &rect_layout.rects {
        if r.rect.x0 < -1e-6 || r.rect.y0 < -1e-6 || r.rect.x1 > 1500.0 + 1e-6 || r.rect.y1 > 600.0 + 1e-6 {
            out_of_bounds += 1;
        }
    }
    println!("    Out-of-viewport rects: {}", out_of_bounds);

    // Voronoi layout: sibling cell areas should track sibling weights
    let clip = Polygon::rect(-750.0, -300.0, 750.0, 300.0);
    let voronoi = compute_voronoi_layout(
        &tree,
        tree.root,
        &clip,
        &PowerDiagram,
        &VoronoiConfig::default(),
    )?;
    println!(
        "\n[5] Voronoi layout: {} cells (fully converged: {})",
        voronoi.cells.len(),
        voronoi.fully_converged()
    );

    println!("\n[6] Area vs weight for root children:");
    let root_size = tree.get(tree.root).size.max(1) as f64;
    let clip_area = clip.area();
    for (i, child_id) in root_children.iter().take(10).enumerate() {
        let child = tree.get(*child_id);
        let Some(cell) = voronoi.cell(*child_id) else {
            continue;
        };
        let weight_share = child.size as f64 / root_size;
        let area_share = cell.polygon.area() / clip_area;
        println!(
            "    [{}] '{}' - weight {:.1}%, area {:.1}%",
            i,
            child.name,
            weight_share * 100.0,
            area_share * 100.0
        );
    }

    Ok(())
}
