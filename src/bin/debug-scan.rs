/// Diagnostic tool to inspect scanner output before tree construction
use dirview::scanner::{self, ScanProgress};
use dirview::tree::arena::NodeKind;
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

    println!("=== DIAGNOSTIC: Scanner ===");
    println!("Scanning: {}", scan_path.display());

    let (tx, rx) = mpsc::channel();
    let entries = scanner::scan(&scan_path, tx)?;

    let mut errors = 0;
    for event in rx.try_iter() {
        match event {
            ScanProgress::Error { path, message } => {
                errors += 1;
                println!("    error: {} ({})", path.display(), message);
            }
            ScanProgress::Completed {
                total_files,
                total_dirs,
                total_bytes,
                elapsed_ms,
            } => {
                println!(
                    "\n[1] Scan completed: {} files, {} dirs, {} bytes in {}ms",
                    total_files, total_dirs, total_bytes, elapsed_ms
                );
            }
            _ => {}
        }
    }
    println!("    Access errors: {}", errors);

    let mut by_kind = [0u64; 4];
    for e in &entries {
        match e.kind {
            NodeKind::Dir | NodeKind::Root => by_kind[0] += 1,
            NodeKind::File => by_kind[1] += 1,
            NodeKind::Link => by_kind[2] += 1,
            NodeKind::Special => by_kind[3] += 1,
        }
    }
    println!(
        "\n[2] Entry kinds: {} dirs, {} files, {} links, {} special",
        by_kind[0], by_kind[1], by_kind[2], by_kind[3]
    );

    println!("\n[3] Top 10 largest files:");
    let mut files: Vec<_> = entries
        .iter()
        .filter(|e| e.kind == NodeKind::File)
        .collect();
    files.sort_by_key(|e| std::cmp::Reverse(e.size));
    for (i, e) in files.iter().take(10).enumerate() {
        println!(
            "    [{}] {} - {:.2} MB",
            i,
            e.path.display(),
            e.size as f64 / 1_048_576.0
        );
    }

    Ok(())
}
