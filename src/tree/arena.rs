use compact_str::CompactString;

/// Index into the arena `Vec<FileNode>`. Uses u32 to save memory (supports up to ~4 billion nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node represents on disk. Carries the integer tag used on the
/// wire (`typ` in chart documents and database records).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File,
    /// Behaves like a dir but has special handling in some places
    Root,
    Link,
    Special,
}

impl NodeKind {
    pub fn wire_tag(self) -> i32 {
        match self {
            NodeKind::Dir => 1,
            NodeKind::File => 2,
            NodeKind::Root => 3,
            NodeKind::Link => 4,
            NodeKind::Special => 5,
        }
    }

    pub fn from_wire_tag(tag: i32) -> Option<NodeKind> {
        match tag {
            1 => Some(NodeKind::Dir),
            2 => Some(NodeKind::File),
            3 => Some(NodeKind::Root),
            4 => Some(NodeKind::Link),
            5 => Some(NodeKind::Special),
            _ => None,
        }
    }

    /// Dirs and roots aggregate their children; everything else carries its
    /// own size.
    pub fn is_dir_like(self) -> bool {
        matches!(self, NodeKind::Dir | NodeKind::Root)
    }
}

/// A single node in the file tree, stored in a flat arena.
/// Uses sibling-list representation: each node has `first_child` and `next_sibling`.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File or directory name (not full path)
    pub name: CompactString,
    /// Size in bytes (or chart weight units). For dir-like nodes: aggregated
    /// sum of children, filled by `aggregate::aggregate_sizes`.
    pub size: u64,
    pub kind: NodeKind,
    /// Parent node index (None for root)
    pub parent: Option<NodeId>,
    /// First child node index (None for leaves)
    pub first_child: Option<NodeId>,
    /// Next sibling node index (None if last child)
    pub next_sibling: Option<NodeId>,
    /// Depth in the tree (root = 0)
    pub depth: u16,
    /// Total number of descendants, filled by `aggregate::aggregate_counts`
    pub num_descendants: u32,
}

impl FileNode {
    pub fn new(name: &str, size: u64, kind: NodeKind) -> Self {
        Self {
            name: CompactString::new(name),
            size,
            kind,
            parent: None,
            first_child: None,
            next_sibling: None,
            depth: 0,
            num_descendants: 0,
        }
    }
}

/// The file tree stored as a flat arena of nodes.
#[derive(Debug)]
pub struct FileTree {
    /// All nodes in contiguous memory
    pub nodes: Vec<FileNode>,
    /// Root node index
    pub root: NodeId,
}

impl FileTree {
    /// Create an empty tree with a root node.
    pub fn new(root_name: &str) -> Self {
        FileTree {
            nodes: vec![FileNode::new(root_name, 0, NodeKind::Root)],
            root: NodeId(0),
        }
    }

    /// Add a child node under the given parent. Returns the new node's ID.
    /// Prepends to the parent's child list (O(1)).
    pub fn add_child(&mut self, parent: NodeId, mut node: FileNode) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.depth = self.nodes[parent.index()].depth + 1;

        node.next_sibling = self.nodes[parent.index()].first_child;
        self.nodes[parent.index()].first_child = Some(new_id);

        self.nodes.push(node);
        new_id
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> &FileNode {
        &self.nodes[id.index()]
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> &mut FileNode {
        &mut self.nodes[id.index()]
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty (only root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Look a node up by its raw index, bounds-checked.
    pub fn node_by_id(&self, id: u64) -> Option<NodeId> {
        if (id as usize) < self.nodes.len() {
            Some(NodeId(id as u32))
        } else {
            None
        }
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            current: self.nodes[parent.index()].first_child,
        }
    }

    /// Pre-order iteration of the subtree rooted at `start`, `start`
    /// included. Uses an explicit stack, so tree depth is not limited by
    /// the call stack.
    pub fn descendants(&self, start: NodeId) -> DescendantIter<'_> {
        DescendantIter {
            tree: self,
            stack: vec![start],
        }
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    tree: &'a FileTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.tree.nodes[id.index()].next_sibling;
        Some(id)
    }
}

/// Pre-order subtree iterator.
pub struct DescendantIter<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Push children in reverse so the first child pops first.
        let children: Vec<NodeId> = self.tree.children(id).collect();
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}
