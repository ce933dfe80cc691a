//! Materialization of the header into the runtime entry tree.
//!
//! Entries live in a flat arena. A directory owns its children through the
//! ids in its child map; a child points back at its parent by id only, so
//! the tree carries no reference cycles.
//!
//! Each `(name, node)` pair of a directory is built into a self-contained
//! fragment with fragment-relative ids. Fragments never read each other, so
//! siblings can be built on the rayon pool and then spliced into the parent
//! in name order. Sequential and parallel builds produce the same arena.

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::header::{FileNode, Header, Node};

/// Index of an entry within a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EntryId(usize);

impl EntryId {
    pub(crate) const ROOT: EntryId = EntryId(0);

    fn rebase(self, base: usize) -> EntryId {
        EntryId(self.0 + base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotKind {
    Directory(BTreeMap<String, EntryId>),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) name: String,
    pub(crate) parent: Option<EntryId>,
    pub(crate) kind: SlotKind,
}

/// Arena holding every entry of one archive; slot 0 is the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Tree {
    slots: Vec<Slot>,
}

impl Tree {
    /// Build the entry tree for `header`.
    pub(crate) fn materialize(header: &Header, parallel: bool) -> Self {
        let mut slots = vec![Slot {
            name: String::new(),
            parent: None,
            kind: SlotKind::Directory(BTreeMap::new()),
        }];

        for (name, fragment) in build_children(header.files(), parallel) {
            splice(&mut slots, EntryId::ROOT, name, fragment);
        }

        Self { slots }
    }

    pub(crate) fn slot(&self, id: EntryId) -> &Slot {
        &self.slots[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

fn build_children(nodes: &BTreeMap<String, Node>, parallel: bool) -> Vec<(&str, Vec<Slot>)> {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            return nodes
                .par_iter()
                .map(|(name, node)| (name.as_str(), build_fragment(name, node, parallel)))
                .collect();
        }
    }

    nodes
        .iter()
        .map(|(name, node)| (name.as_str(), build_fragment(name, node, parallel)))
        .collect()
}

/// Build the subtree for one node. Index 0 of the result is the node itself,
/// with no parent; every other id is relative to the fragment.
fn build_fragment(name: &str, node: &Node, parallel: bool) -> Vec<Slot> {
    match node {
        Node::File(file) => vec![Slot {
            name: name.to_string(),
            parent: None,
            kind: SlotKind::File(*file),
        }],
        Node::Directory(children) => {
            let mut slots = vec![Slot {
                name: name.to_string(),
                parent: None,
                kind: SlotKind::Directory(BTreeMap::new()),
            }];
            for (child_name, fragment) in build_children(children, parallel) {
                splice(&mut slots, EntryId::ROOT, child_name, fragment);
            }
            slots
        }
    }
}

/// Append `fragment` to `slots` and register its head as `name` under `parent`.
fn splice(slots: &mut Vec<Slot>, parent: EntryId, name: &str, fragment: Vec<Slot>) {
    let base = slots.len();

    slots.extend(fragment.into_iter().map(|mut slot| {
        slot.parent = Some(slot.parent.map_or(parent, |p| p.rebase(base)));
        if let SlotKind::Directory(children) = &mut slot.kind {
            for id in children.values_mut() {
                *id = id.rebase(base);
            }
        }
        slot
    }));

    if let SlotKind::Directory(children) = &mut slots[parent.0].kind {
        children.insert(name.to_string(), EntryId(base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header::parse(
            br#"{"files": {
                "a.txt": {"offset": "0", "size": 5},
                "sub": {"files": {
                    "b.txt": {"offset": "5", "size": 3},
                    "deep": {"files": {"c.bin": {"offset": "8", "size": 2}}}
                }},
                "empty": {"files": {}}
            }}"#,
        )
        .unwrap()
    }

    fn child(tree: &Tree, dir: EntryId, name: &str) -> EntryId {
        match &tree.slot(dir).kind {
            SlotKind::Directory(children) => children[name],
            SlotKind::File(_) => panic!("not a directory"),
        }
    }

    #[test]
    fn builds_every_node_with_parent_links() {
        let tree = Tree::materialize(&sample(), false);
        assert_eq!(tree.len(), 7);

        let sub = child(&tree, EntryId::ROOT, "sub");
        let deep = child(&tree, sub, "deep");
        let c = child(&tree, deep, "c.bin");

        assert_eq!(tree.slot(c).name, "c.bin");
        assert_eq!(tree.slot(c).parent, Some(deep));
        assert_eq!(tree.slot(deep).parent, Some(sub));
        assert_eq!(tree.slot(sub).parent, Some(EntryId::ROOT));
        assert_eq!(tree.slot(EntryId::ROOT).parent, None);
        assert!(matches!(
            tree.slot(c).kind,
            SlotKind::File(FileNode { offset: 8, size: 2, .. })
        ));
    }

    #[test]
    fn parallel_matches_sequential() {
        let header = sample();
        assert_eq!(
            Tree::materialize(&header, true),
            Tree::materialize(&header, false)
        );
    }

    #[test]
    fn key_order_does_not_matter() {
        let forward = Header::parse(
            br#"{"files": {"x": {"offset": 1, "size": 1}, "y": {"files": {"z": {"offset": 2, "size": 1}}}}}"#,
        )
        .unwrap();
        let backward = Header::parse(
            br#"{"files": {"y": {"files": {"z": {"offset": 2, "size": 1}}}, "x": {"offset": 1, "size": 1}}}"#,
        )
        .unwrap();

        assert_eq!(
            Tree::materialize(&forward, true),
            Tree::materialize(&backward, false)
        );
    }

    #[test]
    fn empty_header() {
        let tree = Tree::materialize(&Header::default(), true);
        assert_eq!(tree.len(), 1);
    }
}
