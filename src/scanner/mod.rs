pub mod types;

pub use types::{RawFileEntry, ScanProgress};

use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::Instant;

use anyhow::Result;
use jwalk::WalkDir;
use rayon::prelude::*;

use crate::tree::arena::NodeKind;

/// How many entries between progress updates.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Walk a directory tree and collect flat entries for tree construction.
///
/// Symlinks are reported but never followed, so a link loop cannot blow up
/// the scan. Unreadable directories are logged and skipped; the scan keeps
/// going. Progress sends are best-effort, a dropped receiver is fine.
pub fn scan(root: &Path, progress: Sender<ScanProgress>) -> Result<Vec<RawFileEntry>> {
    let start = Instant::now();
    let _ = progress.send(ScanProgress::Started {
        root: root.to_path_buf(),
    });
    tracing::info!("Scanning {}", root.display());

    let mut entries = Vec::new();
    let mut files: u64 = 0;
    let mut dirs: u64 = 0;
    let mut bytes: u64 = 0;

    // jwalk parallelizes directory reads over the rayon pool internally;
    // this loop only drains the result stream.
    for item in WalkDir::new(root).skip_hidden(false).follow_links(false) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::info!("Could not access {}: {}", path.display(), e);
                let _ = progress.send(ScanProgress::Error {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            NodeKind::Link
        } else if file_type.is_dir() {
            NodeKind::Dir
        } else if file_type.is_file() {
            NodeKind::File
        } else {
            NodeKind::Special
        };

        // Only plain files carry a size; dir totals come from aggregation.
        let size = if kind == NodeKind::File {
            match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::info!("Could not stat {}: {}", path.display(), e);
                    let _ = progress.send(ScanProgress::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                    0
                }
            }
        } else {
            0
        };

        match kind {
            NodeKind::Dir => dirs += 1,
            _ => files += 1,
        }
        bytes += size;

        entries.push(RawFileEntry { path, size, kind });

        if (files + dirs) % PROGRESS_INTERVAL == 0 {
            let _ = progress.send(ScanProgress::Progress {
                files_scanned: files,
                dirs_scanned: dirs,
                total_bytes: bytes,
            });
        }
    }

    // Deterministic order regardless of how the parallel walk interleaved.
    entries.par_sort_unstable_by(|a, b| a.path.cmp(&b.path));

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Scan complete: {} files, {} dirs, {} bytes in {}ms",
        files,
        dirs,
        bytes,
        elapsed_ms
    );
    let _ = progress.send(ScanProgress::Completed {
        total_files: files,
        total_dirs: dirs,
        total_bytes: bytes,
        elapsed_ms,
    });

    Ok(entries)
}
