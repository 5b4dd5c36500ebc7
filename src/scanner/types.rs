use std::path::PathBuf;

use crate::tree::arena::NodeKind;

/// Raw file entry collected during scanning, before tree construction.
#[derive(Debug, Clone)]
pub struct RawFileEntry {
    /// Full path to the file or directory
    pub path: PathBuf,
    /// File size in bytes (0 for directories, links, and specials)
    pub size: u64,
    /// What the entry is on disk
    pub kind: NodeKind,
}

/// Progress updates emitted during scanning.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// Starting scan of a path
    Started { root: PathBuf },
    /// Periodic progress update
    Progress {
        files_scanned: u64,
        dirs_scanned: u64,
        total_bytes: u64,
    },
    /// Scan completed
    Completed {
        total_files: u64,
        total_dirs: u64,
        total_bytes: u64,
        elapsed_ms: u64,
    },
    /// Error encountered (non-fatal)
    Error { path: PathBuf, message: String },
}
