use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use dirview::chart::{self, ChartError};
use dirview::geom::Polygon;
use dirview::layout::{
    compute_binary_layout, compute_squarify_layout, compute_voronoi_layout, PowerDiagram, Rect,
    RectConfig, RectLayout, VoronoiConfig,
};
use dirview::scanner;
use dirview::tree::{self, arena::FileTree, db};

/// Disk usage browser backend: scan directories, serve weighted hierarchies
/// as chart documents, and lay them out as Voronoi or rectangular treemaps.
#[derive(Parser)]
#[command(name = "dirview")]
#[command(about = "Directory scanner and treemap layout tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree and dump it as a line-delimited JSON database
    Scan {
        /// Directory to scan
        dir: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Extract a depth-limited chart document from a scan database
    Chart {
        /// Database produced by `scan`
        db: PathBuf,
        /// Node id to root the chart at (the tree root when omitted)
        #[arg(long)]
        node: Option<u64>,
        /// How many child levels to embed
        #[arg(long, default_value = "2")]
        depth: u16,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Compute a treemap layout for a chart document
    Layout {
        /// Chart document produced by `chart` (or any weighted hierarchy)
        chart: PathBuf,
        /// Layout algorithm
        #[arg(long, value_enum, default_value_t = LayoutMode::Voronoi)]
        mode: LayoutMode,
        /// Viewport width in layout units
        #[arg(long, default_value = "1500")]
        width: f64,
        /// Viewport height in layout units
        #[arg(long, default_value = "600")]
        height: f64,
        /// Site-placement seed (voronoi only); same seed, same layout
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutMode {
    /// Organic cells, areas proportional to weights
    Voronoi,
    /// Binary splits along the longer side
    Binary,
    /// Row-based squarified tiles
    Squarify,
}

/// One Voronoi cell on the wire: vertex ring plus the label anchor.
#[derive(Serialize)]
struct CellExport {
    name: String,
    id: u64,
    depth: u16,
    converged: bool,
    site: [f64; 2],
    polygon: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct RectExport {
    name: String,
    id: u64,
    depth: u16,
    #[serde(flatten)]
    rect: Rect,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dirview=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { dir, out } => run_scan(&dir, out.as_deref()),
        Commands::Chart {
            db,
            node,
            depth,
            out,
        } => run_chart(&db, node, depth, out.as_deref()),
        Commands::Layout {
            chart,
            mode,
            width,
            height,
            seed,
            out,
        } => run_layout(&chart, mode, width, height, seed, out.as_deref()),
    }
}

fn run_scan(dir: &Path, out: Option<&Path>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let progress = std::thread::spawn(move || {
        for event in rx {
            if let scanner::ScanProgress::Progress {
                files_scanned,
                dirs_scanned,
                total_bytes,
            } = event
            {
                tracing::info!(
                    "scanned {} files, {} dirs, {} bytes so far",
                    files_scanned,
                    dirs_scanned,
                    total_bytes
                );
            }
        }
    });

    let entries = scanner::scan(dir, tx)?;
    progress.join().ok();

    let tree = tree::build_tree(&entries);
    let mut writer = open_output(out)?;
    db::dump_tree(&tree, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn run_chart(db_path: &Path, node: Option<u64>, depth: u16, out: Option<&Path>) -> Result<()> {
    let tree = load_db(db_path)?;
    let root = match node {
        Some(id) => tree.node_by_id(id).ok_or(ChartError::NoSuchNode(id))?,
        None => tree.root,
    };
    let doc = chart::document(&tree, root, depth);

    let mut writer = open_output(out)?;
    serde_json::to_writer(&mut writer, &doc)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn run_layout(
    chart_path: &Path,
    mode: LayoutMode,
    width: f64,
    height: f64,
    seed: u64,
    out: Option<&Path>,
) -> Result<()> {
    let file = File::open(chart_path)
        .with_context(|| format!("cannot open {}", chart_path.display()))?;
    let doc: chart::ChartDocument = serde_json::from_reader(BufReader::new(file))?;
    let tree = chart::to_tree(&doc.root)?;

    let start = Instant::now();
    let mut writer = open_output(out)?;
    match mode {
        LayoutMode::Voronoi => {
            // Layout space is centered on the origin, matching the chart
            // frontend's coordinate system.
            let clip = Polygon::rect(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0);
            let config = VoronoiConfig {
                seed,
                ..Default::default()
            };
            let layout =
                compute_voronoi_layout(&tree, tree.root, &clip, &PowerDiagram, &config)?;
            let cells: Vec<CellExport> = layout
                .cells
                .iter()
                .map(|c| CellExport {
                    name: tree.get(c.node).name.to_string(),
                    id: c.node.0 as u64,
                    depth: c.depth,
                    converged: c.converged,
                    site: [c.site.x, c.site.y],
                    polygon: c.polygon.vertices().iter().map(|p| [p.x, p.y]).collect(),
                })
                .collect();
            serde_json::to_writer(&mut writer, &cells)?;
        }
        LayoutMode::Binary => {
            let layout =
                compute_binary_layout(&tree, tree.root, width, height, &RectConfig::default())?;
            write_rects(&mut writer, &tree, &layout)?;
        }
        LayoutMode::Squarify => {
            let layout =
                compute_squarify_layout(&tree, tree.root, width, height, &RectConfig::default())?;
            write_rects(&mut writer, &tree, &layout)?;
        }
    }
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!(
        "layout of {} nodes took {:.1}ms",
        tree.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

fn write_rects<W: Write>(writer: &mut W, tree: &FileTree, layout: &RectLayout) -> Result<()> {
    let rects: Vec<RectExport> = layout
        .rects
        .iter()
        .map(|r| RectExport {
            name: tree.get(r.node).name.to_string(),
            id: r.node.0 as u64,
            depth: r.depth,
            rect: r.rect,
        })
        .collect();
    serde_json::to_writer(writer, &rects)?;
    Ok(())
}

fn load_db(path: &Path) -> Result<FileTree> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    Ok(db::load_tree(BufReader::new(file))?)
}

fn open_output(out: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    })
}
