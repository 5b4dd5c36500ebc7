//! Newline-delimited JSON database of a file tree.
//!
//! One JSON object per line, child/parent relationships by node id, root
//! first by convention but not by requirement. Example directory tree:
//!
//! ```text
//! root_dir/hello.txt
//! root_dir/foo/bar.txt
//! ```
//!
//! serializes as:
//!
//! ```text
//! {"name":"root_dir","typ":3,"children":[1,2],"size":0,"parent":null,"id":0}
//! {"name":"hello.txt","typ":2,"children":[],"size":92863,"parent":0,"id":1}
//! {"name":"foo","typ":1,"children":[3],"size":0,"parent":0,"id":2}
//! {"name":"bar.txt","typ":2,"children":[],"size":19459,"parent":2,"id":3}
//! ```
//!
//! Appending entries to a dump at a later time stays possible because the
//! loader links records in a second phase, after parsing everything.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::aggregate;
use super::arena::{FileNode, FileTree, NodeKind};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown node type tag {0}")]
    UnknownTag(i32),
    #[error("database has no root record (parent: null)")]
    MissingRoot,
    #[error("duplicate node id {0}")]
    DuplicateId(u64),
    #[error("record {0} references unknown child {1}")]
    DanglingChild(u64, u64),
    #[error("record {0} is referenced as a child more than once")]
    RepeatedChild(u64),
}

/// One serialized node. Field names are the wire format, do not rename.
#[derive(Debug, Serialize, Deserialize)]
struct DbRecord {
    name: String,
    typ: i32,
    children: Vec<u64>,
    size: u64,
    parent: Option<u64>,
    id: u64,
}

/// Write the whole tree as one record per line. Node ids are the arena
/// indices, so the root always dumps with id 0.
pub fn dump_tree<W: Write>(tree: &FileTree, out: &mut W) -> Result<(), DbError> {
    for id in tree.descendants(tree.root) {
        let node = tree.get(id);
        let record = DbRecord {
            name: node.name.to_string(),
            typ: node.kind.wire_tag(),
            children: tree.children(id).map(|c| c.0 as u64).collect(),
            size: node.size,
            parent: node.parent.map(|p| p.0 as u64),
            id: id.0 as u64,
        };
        serde_json::to_writer(&mut *out, &record)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Load a dumped tree.
///
/// Two phases, mirroring the append-friendly format: parse every record
/// into a cache keyed by the embedded ids, then walk from the root
/// re-establishing child links. Sizes and counts are re-aggregated after
/// the walk, so dumps that store zero for directories load the same as
/// dumps that store aggregated totals.
pub fn load_tree<R: BufRead>(input: R) -> Result<FileTree, DbError> {
    let mut records: HashMap<u64, DbRecord> = HashMap::new();
    let mut root_id = None;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DbRecord = serde_json::from_str(&line)?;
        if record.parent.is_none() {
            root_id = Some(record.id);
        }
        let id = record.id;
        if records.insert(id, record).is_some() {
            return Err(DbError::DuplicateId(id));
        }
    }

    let root_id = root_id.ok_or(DbError::MissingRoot)?;
    let root_record = records.get(&root_id).ok_or(DbError::MissingRoot)?;
    NodeKind::from_wire_tag(root_record.typ).ok_or(DbError::UnknownTag(root_record.typ))?;

    let mut tree = FileTree::new(&root_record.name);
    tree.get_mut(tree.root).size = root_record.size;

    // Walk from the root outward; children are pushed in reverse because
    // add_child prepends to the sibling list. Every record may be linked at
    // most once: a repeat is either a cycle or a child shared by two
    // parents, and both would corrupt the arena.
    let mut linked: HashSet<u64> = HashSet::from([root_id]);
    let mut pending = vec![(root_id, tree.root)];
    while let Some((old_id, new_id)) = pending.pop() {
        let child_ids = records
            .get(&old_id)
            .map(|r| r.children.clone())
            .unwrap_or_default();
        for &child_old in child_ids.iter().rev() {
            if !linked.insert(child_old) {
                return Err(DbError::RepeatedChild(child_old));
            }
            let child = records
                .get(&child_old)
                .ok_or(DbError::DanglingChild(old_id, child_old))?;
            let kind =
                NodeKind::from_wire_tag(child.typ).ok_or(DbError::UnknownTag(child.typ))?;
            let child_new = tree.add_child(new_id, FileNode::new(&child.name, child.size, kind));
            pending.push((child_old, child_new));
        }
    }

    aggregate::aggregate_sizes(&mut tree);
    aggregate::aggregate_counts(&mut tree);

    tracing::info!("Loaded database: {} nodes", tree.len());
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn sample_tree() -> FileTree {
        let mut tree = FileTree::new("root_dir");
        let foo = tree.add_child(tree.root, FileNode::new("foo", 0, NodeKind::Dir));
        tree.add_child(foo, FileNode::new("bar.txt", 19459, NodeKind::File));
        tree.add_child(tree.root, FileNode::new("hello.txt", 92863, NodeKind::File));
        aggregate::aggregate_sizes(&mut tree);
        aggregate::aggregate_counts(&mut tree);
        tree
    }

    #[test]
    fn dump_then_load_preserves_structure() {
        let tree = sample_tree();
        let mut buf = Vec::new();
        dump_tree(&tree, &mut buf).unwrap();

        let loaded = load_tree(BufReader::new(buf.as_slice())).unwrap();
        assert_eq!(loaded.len(), tree.len());
        assert_eq!(loaded.get(loaded.root).name, "root_dir");
        assert_eq!(loaded.get(loaded.root).size, 112_322);
        assert_eq!(loaded.get(loaded.root).num_descendants, 3);

        let names: Vec<String> = loaded
            .children(loaded.root)
            .map(|id| loaded.get(id).name.to_string())
            .collect();
        let original: Vec<String> = tree
            .children(tree.root)
            .map(|id| tree.get(id).name.to_string())
            .collect();
        assert_eq!(names, original);
    }

    #[test]
    fn out_of_order_records_still_link() {
        // children listed before their parents
        let dump = concat!(
            "{\"name\":\"bar.txt\",\"typ\":2,\"children\":[],\"size\":5,\"parent\":1,\"id\":2}\n",
            "{\"name\":\"foo\",\"typ\":1,\"children\":[2],\"size\":0,\"parent\":0,\"id\":1}\n",
            "{\"name\":\"root\",\"typ\":3,\"children\":[1],\"size\":0,\"parent\":null,\"id\":0}\n",
        );
        let tree = load_tree(BufReader::new(dump.as_bytes())).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(tree.root).size, 5);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dump = "{\"name\":\"x\",\"typ\":2,\"children\":[],\"size\":1,\"parent\":7,\"id\":8}\n";
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::MissingRoot));
    }

    #[test]
    fn dangling_child_is_an_error() {
        let dump =
            "{\"name\":\"root\",\"typ\":3,\"children\":[9],\"size\":0,\"parent\":null,\"id\":0}\n";
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::DanglingChild(0, 9)));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let dump =
            "{\"name\":\"root\",\"typ\":42,\"children\":[],\"size\":0,\"parent\":null,\"id\":0}\n";
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::UnknownTag(42)));
    }

    #[test]
    fn duplicate_id_is_an_error() {
        let dump = concat!(
            "{\"name\":\"root\",\"typ\":3,\"children\":[],\"size\":0,\"parent\":null,\"id\":0}\n",
            "{\"name\":\"root\",\"typ\":3,\"children\":[],\"size\":0,\"parent\":null,\"id\":0}\n",
        );
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::DuplicateId(0)));
    }

    #[test]
    fn cyclic_records_are_an_error() {
        // id 0 and id 1 list each other as children
        let dump = concat!(
            "{\"name\":\"root\",\"typ\":3,\"children\":[1],\"size\":0,\"parent\":null,\"id\":0}\n",
            "{\"name\":\"loop\",\"typ\":1,\"children\":[0],\"size\":0,\"parent\":1,\"id\":1}\n",
        );
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::RepeatedChild(0)));
    }

    #[test]
    fn child_shared_by_two_parents_is_an_error() {
        let dump = concat!(
            "{\"name\":\"root\",\"typ\":3,\"children\":[1,2],\"size\":0,\"parent\":null,\"id\":0}\n",
            "{\"name\":\"a\",\"typ\":1,\"children\":[3],\"size\":0,\"parent\":0,\"id\":1}\n",
            "{\"name\":\"b\",\"typ\":1,\"children\":[3],\"size\":0,\"parent\":0,\"id\":2}\n",
            "{\"name\":\"f\",\"typ\":2,\"children\":[],\"size\":9,\"parent\":1,\"id\":3}\n",
        );
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::RepeatedChild(3)));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dump = "not json\n";
        let err = load_tree(BufReader::new(dump.as_bytes())).unwrap_err();
        assert!(matches!(err, DbError::Json(_)));
    }
}
