pub mod aggregate;
pub mod arena;
pub mod db;
pub mod navigation;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use self::arena::{FileNode, FileTree, NodeId, NodeKind};
use crate::scanner::types::RawFileEntry;

/// Find the common root path for all entries: the deepest ancestor shared
/// by every scanned path.
fn find_common_root(entries: &[RawFileEntry]) -> PathBuf {
    if entries.is_empty() {
        return PathBuf::from("");
    }

    let mut root = entries[0].path.clone();
    for entry in entries.iter().skip(1).take(100) {
        // Sample first 100
        while !entry.path.starts_with(&root) {
            match root.parent() {
                Some(parent) => root = parent.to_path_buf(),
                None => return PathBuf::from(""),
            }
        }
    }

    root
}

/// Build a FileTree from a flat list of RawFileEntry (from the scanner).
/// The root node gets `NodeKind::Root`; sizes and descendant counts are
/// aggregated and siblings sorted by size before returning.
pub fn build_tree(entries: &[RawFileEntry]) -> FileTree {
    if entries.is_empty() {
        return FileTree::new("(empty)");
    }

    let dir_count = entries
        .iter()
        .filter(|e| e.kind == NodeKind::Dir)
        .count();
    tracing::info!(
        "Building tree from {} entries ({} dirs, {} others)",
        entries.len(),
        dir_count,
        entries.len() - dir_count
    );

    let root_path = find_common_root(entries);
    let root_name = root_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root_path.to_string_lossy().to_string());

    let mut tree = FileTree::new(&root_name);

    // Map from path → NodeId for parent lookups
    let mut path_map: HashMap<PathBuf, NodeId> = HashMap::new();
    path_map.insert(root_path.clone(), tree.root);

    // First pass: create all directory nodes
    for entry in entries.iter().filter(|e| e.kind == NodeKind::Dir) {
        if entry.path == root_path {
            continue;
        }
        ensure_dir_node(&mut tree, &mut path_map, &entry.path);
    }

    // Second pass: create file, link, and special nodes
    for entry in entries.iter().filter(|e| e.kind != NodeKind::Dir) {
        if entry.path == root_path {
            continue;
        }
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let parent_path = entry
            .path
            .parent()
            .unwrap_or(Path::new(""))
            .to_path_buf();
        let parent_id = ensure_dir_node(&mut tree, &mut path_map, &parent_path);

        let id = tree.add_child(parent_id, FileNode::new(&name, entry.size, entry.kind));
        path_map.insert(entry.path.clone(), id);
    }

    aggregate::aggregate_sizes(&mut tree);
    aggregate::aggregate_counts(&mut tree);
    // Sort children by size for the rect layouts
    aggregate::sort_children_by_size(&mut tree);

    tracing::info!(
        "Tree built: {} total nodes, {} direct children of root",
        tree.len(),
        tree.children(tree.root).count()
    );

    tree
}

/// Ensure a directory node exists at the given path, creating intermediate nodes as needed.
/// Uses an iterative approach to avoid stack overflow on deep paths.
fn ensure_dir_node(
    tree: &mut FileTree,
    path_map: &mut HashMap<PathBuf, NodeId>,
    path: &Path,
) -> NodeId {
    // Fast path: already exists
    if let Some(&id) = path_map.get(path) {
        return id;
    }

    // Build list of missing ancestors from root to target
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();

    loop {
        if path_map.contains_key(&current) {
            break;
        }
        missing.push(current.clone());

        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                current = parent.to_path_buf();
            }
            _ => break,
        }
    }

    // Reverse to create from root downward
    missing.reverse();

    let mut last_id = tree.root;
    for ancestor in missing {
        let parent_path = ancestor
            .parent()
            .unwrap_or(Path::new(""))
            .to_path_buf();
        let parent_id = path_map.get(&parent_path).copied().unwrap_or(tree.root);

        let name = ancestor
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let id = tree.add_child(parent_id, FileNode::new(&name, 0, NodeKind::Dir));
        path_map.insert(ancestor.clone(), id);
        last_id = id;
    }

    last_id
}
