//! # button-trie
//!
//! A character-level prefix index over the example queries of canned-response
//! buttons. Every node of the trie records which buttons have at least one
//! query passing through it, so the subtree under a typed prefix tells you
//! which buttons that prefix can still surface.
//!
//! ## Example
//!
//! ```rust
//! use button_trie::Trie;
//!
//! let mut trie = Trie::new();
//! trie.insert("Late", 1);
//! trie.insert("late delivery", 2);
//!
//! let node = trie.lookup_prefix("LAT").unwrap();
//! assert_eq!(node.button_ids(), &[1, 2]);
//! assert!(!node.is_end_of_query());
//! assert!(trie.lookup_prefix("early").is_none());
//! ```
//!
//! Matching is case-insensitive: queries and prefixes are lower-cased with
//! Unicode rules before walking the tree.

use std::borrow::Cow;
use std::fmt;
use std::mem;

use smallvec::SmallVec;
use tracing::trace;

pub mod catalog;
pub mod render;
pub mod shared;
pub mod view;

pub use catalog::{build_index, Button, Catalog, CatalogError};
pub use render::{render_tree, resolve, Fallback, RenderOptions, TreeView};
pub use shared::SharedIndex;
pub use view::{View, ViewMode};

/// Identifier of a catalog button.
pub type ButtonId = u32;

// =============================================================================
// Normalization
// =============================================================================

/// Lower-cases `s` with `str::to_lowercase` (final sigma included), borrowing
/// when every char already maps to itself.
fn normalize(s: &str) -> Cow<'_, str> {
    let canonical = s.chars().all(|c| {
        let mut lower = c.to_lowercase();
        lower.next() == Some(c) && lower.next().is_none()
    });
    if canonical {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_lowercase())
    }
}

// =============================================================================
// Node arena
// =============================================================================

/// Index of a node inside [`NodeArena`]. The root is always slot 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(u32);

impl NodeIdx {
    const ROOT: NodeIdx = NodeIdx(0);

    #[inline]
    fn get(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, Default)]
struct Node {
    /// Incoming edge label; `None` only for the root.
    edge: Option<char>,
    /// Sorted by character.
    children: SmallVec<[(char, NodeIdx); 2]>,
    /// Sorted, no duplicates.
    button_ids: SmallVec<[ButtonId; 2]>,
    is_end_of_query: bool,
}

impl Node {
    #[inline]
    fn child_pos(&self, ch: char) -> Result<usize, usize> {
        self.children.binary_search_by_key(&ch, |&(c, _)| c)
    }

    #[inline]
    fn child(&self, ch: char) -> Option<NodeIdx> {
        self.child_pos(ch).ok().map(|pos| self.children[pos].1)
    }

    /// Adds `id` to the button set. Returns false if it was already present.
    fn tag(&mut self, id: ButtonId) -> bool {
        match self.button_ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.button_ids.insert(pos, id);
                true
            }
        }
    }

    fn heap_bytes(&self) -> usize {
        let mut bytes = 0;
        if self.children.spilled() {
            bytes += self.children.capacity() * mem::size_of::<(char, NodeIdx)>();
        }
        if self.button_ids.spilled() {
            bytes += self.button_ids.capacity() * mem::size_of::<ButtonId>();
        }
        bytes
    }
}

/// Flat node storage. Nodes are only ever appended; a child is referenced by
/// its slot index, so the tree has no pointers and no back references.
#[derive(Clone, Debug)]
struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    #[inline]
    fn get(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.get()]
    }

    #[inline]
    fn get_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.get()]
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a fresh node for `ch` and links it under `parent` at `pos`,
    /// which must come from a failed `child_pos` lookup on `parent`.
    fn push_child(&mut self, parent: NodeIdx, pos: usize, ch: char) -> NodeIdx {
        assert!(
            self.nodes.len() < u32::MAX as usize,
            "trie node capacity exceeded"
        );
        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(Node {
            edge: Some(ch),
            ..Node::default()
        });
        self.get_mut(parent).children.insert(pos, (ch, idx));
        idx
    }

    fn memory_usage(&self) -> usize {
        self.nodes.capacity() * mem::size_of::<Node>()
            + self.nodes.iter().map(Node::heap_bytes).sum::<usize>()
    }

    fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
        for node in &mut self.nodes {
            node.children.shrink_to_fit();
            node.button_ids.shrink_to_fit();
        }
    }
}

// =============================================================================
// Trie
// =============================================================================

/// Case-insensitive character trie tagging every node with the buttons whose
/// queries pass through it.
///
/// The trie only grows: there is no removal. It is meant to be filled once
/// (see [`build_index`]) and then shared read-only; `&Trie` is `Send + Sync`
/// and lookups never allocate nodes.
#[derive(Clone)]
pub struct Trie {
    nodes: NodeArena,
    /// Number of distinct normalized queries (end-of-query nodes).
    queries: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self {
            nodes: NodeArena::new(),
            queries: 0,
        }
    }

    /// Indexes `query` for `button_id`.
    ///
    /// Every node on the lower-cased path gets `button_id` added to its set and
    /// the last one is marked as the end of a query. An empty query tags and
    /// marks the root. Inserting the same pair again changes nothing.
    pub fn insert(&mut self, query: &str, button_id: ButtonId) {
        let key = normalize(query);
        let mut cur = NodeIdx::ROOT;
        let mut created = 0usize;

        for ch in key.chars() {
            cur = match self.nodes.get(cur).child_pos(ch) {
                Ok(pos) => self.nodes.get(cur).children[pos].1,
                Err(pos) => {
                    created += 1;
                    self.nodes.push_child(cur, pos, ch)
                }
            };
            self.nodes.get_mut(cur).tag(button_id);
        }

        let node = self.nodes.get_mut(cur);
        if key.is_empty() {
            node.tag(button_id);
        }
        if !node.is_end_of_query {
            node.is_end_of_query = true;
            self.queries += 1;
        }

        trace!(query = %key, button_id, created, "indexed query");
    }

    /// Returns the node reached by walking `prefix` (lower-cased) from the
    /// root, or `None` as soon as an edge is missing.
    ///
    /// The empty prefix always resolves to the root.
    pub fn lookup_prefix(&self, prefix: &str) -> Option<NodeRef<'_>> {
        let found = self.root().walk(prefix);
        trace!(
            prefix,
            found = found.is_some(),
            buttons = found.map_or(0, |n| n.button_ids().len()),
            "prefix lookup"
        );
        found
    }

    /// Whole queries indexed under `prefix`, in lexicographic order, each
    /// spelled out in full (normalized).
    pub fn completions(&self, prefix: &str) -> Option<Completions<'_>> {
        let key = normalize(prefix);
        let node = self.root().walk_normalized(&key)?;
        Some(Completions::new(node, key.into_owned()))
    }

    /// True if `query` was inserted as a whole query, not just as a prefix.
    pub fn contains_query(&self, query: &str) -> bool {
        self.lookup_prefix(query)
            .is_some_and(|node| node.is_end_of_query())
    }

    #[inline]
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            trie: self,
            idx: NodeIdx::ROOT,
        }
    }

    /// Number of distinct (normalized) queries.
    pub fn len(&self) -> usize {
        self.queries
    }

    pub fn is_empty(&self) -> bool {
        self.queries == 0
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap bytes held by the trie.
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    /// Releases spare capacity. Call once the bulk build is done.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Trie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.root().completions().map(|(q, n)| (q, n.button_ids())))
            .finish()
    }
}

// =============================================================================
// Read-only node views
// =============================================================================

/// Borrowed view of one trie node.
///
/// A `NodeRef` cannot outlive the trie it came from. Two refs compare equal
/// when they point at the same node of the same trie.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    trie: &'a Trie,
    idx: NodeIdx,
}

impl<'a> NodeRef<'a> {
    #[inline]
    fn node(&self) -> &'a Node {
        self.trie.nodes.get(self.idx)
    }

    #[inline]
    fn at(&self, idx: NodeIdx) -> NodeRef<'a> {
        NodeRef {
            trie: self.trie,
            idx,
        }
    }

    /// Label of the edge leading into this node; `None` for the root.
    pub fn edge(&self) -> Option<char> {
        self.node().edge
    }

    pub fn is_root(&self) -> bool {
        self.idx == NodeIdx::ROOT
    }

    /// Buttons with at least one query passing through this node, ascending.
    pub fn button_ids(&self) -> &'a [ButtonId] {
        &self.node().button_ids
    }

    pub fn contains_button(&self, id: ButtonId) -> bool {
        self.node().button_ids.binary_search(&id).is_ok()
    }

    pub fn is_end_of_query(&self) -> bool {
        self.node().is_end_of_query
    }

    pub fn is_leaf(&self) -> bool {
        self.node().children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    /// Child along edge `ch`. Edges are stored lower-cased; `ch` is used as is.
    pub fn child(&self, ch: char) -> Option<NodeRef<'a>> {
        self.node().child(ch).map(|idx| self.at(idx))
    }

    /// Children in ascending edge order.
    pub fn children(&self) -> Children<'a> {
        Children {
            trie: self.trie,
            inner: self.node().children.iter(),
        }
    }

    /// Walks `suffix` (lower-cased) down from this node.
    pub fn walk(&self, suffix: &str) -> Option<NodeRef<'a>> {
        self.walk_normalized(&normalize(suffix))
    }

    fn walk_normalized(&self, key: &str) -> Option<NodeRef<'a>> {
        let mut cur = self.idx;
        for ch in key.chars() {
            cur = self.trie.nodes.get(cur).child(ch)?;
        }
        Some(self.at(cur))
    }

    /// Whole queries ending in this subtree, in lexicographic order.
    ///
    /// Strings are spelled relative to this node: the path from the root down
    /// to it is not included. Use [`Trie::completions`] for full queries.
    pub fn completions(&self) -> Completions<'a> {
        Completions::new(*self, String::new())
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.trie, other.trie) && self.idx == other.idx
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("edge", &self.edge())
            .field("button_ids", &self.button_ids())
            .field("is_end_of_query", &self.is_end_of_query())
            .field("children", &self.child_count())
            .finish()
    }
}

/// Iterator over a node's children, see [`NodeRef::children`].
pub struct Children<'a> {
    trie: &'a Trie,
    inner: std::slice::Iter<'a, (char, NodeIdx)>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (char, NodeRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|&(ch, idx)| {
            (
                ch,
                NodeRef {
                    trie: self.trie,
                    idx,
                },
            )
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

#[derive(Clone, Copy)]
struct Frame {
    idx: NodeIdx,
    /// Buffer length (bytes) of the parent's spelling.
    base: usize,
    /// False only for the starting node, whose edge is already in the seed.
    push_edge: bool,
}

/// Pre-order walk yielding `(query, end node)` for every end-of-query node.
///
/// Children are visited in ascending edge order, so queries come out sorted.
pub struct Completions<'a> {
    trie: &'a Trie,
    stack: Vec<Frame>,
    buf: String,
}

impl<'a> Completions<'a> {
    fn new(start: NodeRef<'a>, seed: String) -> Self {
        let base = seed.len();
        Self {
            trie: start.trie,
            stack: vec![Frame {
                idx: start.idx,
                base,
                push_edge: false,
            }],
            buf: seed,
        }
    }
}

impl<'a> Iterator for Completions<'a> {
    type Item = (String, NodeRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        while let Some(frame) = self.stack.pop() {
            let node = trie.nodes.get(frame.idx);
            self.buf.truncate(frame.base);
            if frame.push_edge {
                if let Some(ch) = node.edge {
                    self.buf.push(ch);
                }
            }

            let base = self.buf.len();
            for &(_, child) in node.children.iter().rev() {
                self.stack.push(Frame {
                    idx: child,
                    base,
                    push_edge: true,
                });
            }

            if node.is_end_of_query {
                let found = NodeRef {
                    trie,
                    idx: frame.idx,
                };
                return Some((self.buf.clone(), found));
            }
        }
        None
    }
}


#[cfg(test)]
mod proptests;
