use super::arena::{FileTree, NodeId};

/// The click rule from the chart frontend: only dir-like nodes that
/// actually have something underneath are worth navigating into.
pub fn can_navigate(tree: &FileTree, node: NodeId) -> bool {
    let n = tree.get(node);
    n.kind.is_dir_like() && n.num_descendants > 0
}

/// Navigation state: tracks the current view root and history.
pub struct NavigationState {
    /// Stack of view roots (for back navigation)
    history: Vec<NodeId>,
    /// Current view root
    pub current_root: NodeId,
}

impl NavigationState {
    pub fn new(root: NodeId) -> Self {
        Self {
            history: Vec::new(),
            current_root: root,
        }
    }

    /// Drill down into a navigable node.
    /// Returns true if navigation happened.
    pub fn drill_down(&mut self, node: NodeId, tree: &FileTree) -> bool {
        if node == self.current_root || !can_navigate(tree, node) {
            return false;
        }
        self.history.push(self.current_root);
        self.current_root = node;
        true
    }

    /// Navigate up one level.
    /// Returns true if navigation happened.
    pub fn navigate_up(&mut self) -> bool {
        if let Some(prev) = self.history.pop() {
            self.current_root = prev;
            true
        } else {
            false
        }
    }

    /// Navigate to the absolute root.
    pub fn navigate_home(&mut self, root: NodeId) {
        self.history.clear();
        self.current_root = root;
    }

    /// Current depth in navigation history.
    pub fn depth(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::aggregate;
    use crate::tree::arena::{FileNode, FileTree, NodeKind};

    fn sample() -> (FileTree, NodeId, NodeId) {
        let mut tree = FileTree::new("root");
        let dir = tree.add_child(tree.root, FileNode::new("dir", 0, NodeKind::Dir));
        let file = tree.add_child(dir, FileNode::new("f", 10, NodeKind::File));
        aggregate::aggregate_sizes(&mut tree);
        aggregate::aggregate_counts(&mut tree);
        (tree, dir, file)
    }

    #[test]
    fn files_are_not_navigable() {
        let (tree, dir, file) = sample();
        assert!(can_navigate(&tree, dir));
        assert!(!can_navigate(&tree, file));
    }

    #[test]
    fn empty_dirs_are_not_navigable() {
        let mut tree = FileTree::new("root");
        let empty = tree.add_child(tree.root, FileNode::new("empty", 0, NodeKind::Dir));
        aggregate::aggregate_counts(&mut tree);
        assert!(!can_navigate(&tree, empty));
    }

    #[test]
    fn drill_and_back() {
        let (tree, dir, file) = sample();
        let mut nav = NavigationState::new(tree.root);

        assert!(nav.drill_down(dir, &tree));
        assert_eq!(nav.current_root, dir);
        assert_eq!(nav.depth(), 1);

        // files refuse
        assert!(!nav.drill_down(file, &tree));

        assert!(nav.navigate_up());
        assert_eq!(nav.current_root, tree.root);
        assert!(!nav.navigate_up());
    }

    #[test]
    fn home_clears_history() {
        let (tree, dir, _) = sample();
        let mut nav = NavigationState::new(tree.root);
        nav.drill_down(dir, &tree);
        nav.navigate_home(tree.root);
        assert_eq!(nav.current_root, tree.root);
        assert_eq!(nav.depth(), 0);
    }
}
