use super::arena::{FileTree, NodeId};

/// Compute aggregated sizes for all dir-like nodes (bottom-up).
/// After this, each directory's `size` field equals the sum of all descendant file sizes.
pub fn aggregate_sizes(tree: &mut FileTree) {
    // Process nodes in reverse order (children before parents) since
    // children always have higher indices than their parents in our arena.
    // This is guaranteed by the add_child insertion order.
    let len = tree.nodes.len();
    for i in (0..len).rev() {
        let node = &tree.nodes[i];
        // Childless dir-like nodes keep their own size: chart documents can
        // carry weighted nodes whose children were truncated away.
        if !node.kind.is_dir_like() || node.first_child.is_none() {
            continue;
        }

        // Sum up all direct children
        let mut total: u64 = 0;
        let mut child = node.first_child;
        while let Some(child_id) = child {
            total += tree.nodes[child_id.index()].size;
            child = tree.nodes[child_id.index()].next_sibling;
        }
        tree.nodes[i].size = total;
    }
}

/// Fill `num_descendants` for every node (bottom-up). Chart documents
/// report this as `num_children` so a client can tell that a truncated
/// subtree has more underneath.
pub fn aggregate_counts(tree: &mut FileTree) {
    let len = tree.nodes.len();
    for i in (0..len).rev() {
        let mut total: u32 = 0;
        let mut child = tree.nodes[i].first_child;
        while let Some(child_id) = child {
            total += tree.nodes[child_id.index()].num_descendants + 1;
            child = tree.nodes[child_id.index()].next_sibling;
        }
        tree.nodes[i].num_descendants = total;
    }
}

/// Sort children of each dir-like node by size (descending).
/// The rect layouts expect children sorted by size.
/// This re-links the sibling list without moving nodes in the arena.
pub fn sort_children_by_size(tree: &mut FileTree) {
    let len = tree.nodes.len();
    for i in 0..len {
        if !tree.nodes[i].kind.is_dir_like() || tree.nodes[i].first_child.is_none() {
            continue;
        }

        // Collect children into a vec
        let mut children: Vec<NodeId> = Vec::new();
        let mut child = tree.nodes[i].first_child;
        while let Some(child_id) = child {
            children.push(child_id);
            child = tree.nodes[child_id.index()].next_sibling;
        }

        // Sort by size descending
        children.sort_by(|a, b| {
            tree.nodes[b.index()]
                .size
                .cmp(&tree.nodes[a.index()].size)
        });

        // Re-link the sibling list
        if children.is_empty() {
            continue;
        }
        tree.nodes[i].first_child = Some(children[0]);
        for w in children.windows(2) {
            tree.nodes[w[0].index()].next_sibling = Some(w[1]);
        }
        tree.nodes[children.last().unwrap().index()].next_sibling = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::arena::{FileNode, NodeKind};

    fn sample_tree() -> FileTree {
        let mut tree = FileTree::new("root");
        let dir = tree.add_child(tree.root, FileNode::new("dir", 0, NodeKind::Dir));
        tree.add_child(dir, FileNode::new("big", 90, NodeKind::File));
        tree.add_child(dir, FileNode::new("small", 10, NodeKind::File));
        tree.add_child(tree.root, FileNode::new("loose", 50, NodeKind::File));
        tree
    }

    #[test]
    fn sizes_roll_up_to_the_root() {
        let mut tree = sample_tree();
        aggregate_sizes(&mut tree);

        assert_eq!(tree.get(tree.root).size, 150);
        let dir = tree
            .children(tree.root)
            .find(|&id| tree.get(id).kind == NodeKind::Dir)
            .unwrap();
        assert_eq!(tree.get(dir).size, 100);
    }

    #[test]
    fn descendant_counts_include_nested_nodes() {
        let mut tree = sample_tree();
        aggregate_counts(&mut tree);

        assert_eq!(tree.get(tree.root).num_descendants, 4);
        let dir = tree
            .children(tree.root)
            .find(|&id| tree.get(id).kind == NodeKind::Dir)
            .unwrap();
        assert_eq!(tree.get(dir).num_descendants, 2);
        assert_eq!(
            tree.children(dir)
                .map(|id| tree.get(id).num_descendants)
                .max(),
            Some(0)
        );
    }

    #[test]
    fn children_relink_in_descending_size_order() {
        let mut tree = sample_tree();
        aggregate_sizes(&mut tree);
        sort_children_by_size(&mut tree);

        let sizes: Vec<u64> = tree
            .children(tree.root)
            .map(|id| tree.get(id).size)
            .collect();
        assert_eq!(sizes, vec![100, 50]);
    }
}
