//! Text rendering of a trie subtree.
//!
//! One line per node, indented two spaces per level:
//!
//! ```text
//! root
//!   l (1, 2)
//!     a (1, 2)
//!       t (1, 2)
//!         e* (1, 2)
//! ```
//!
//! `*` marks a node where a whole query ends. Spaces along an edge are drawn
//! as `␣` so they stay visible.

use std::fmt;

use tracing::trace;

use crate::{NodeRef, Trie};

/// What to show when the typed input matches no indexed prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fallback {
    /// Show the whole tree.
    #[default]
    Root,
    /// Show nothing.
    Empty,
}

/// Looks `input` up and applies `fallback` when there is no match.
pub fn resolve<'a>(trie: &'a Trie, input: &str, fallback: Fallback) -> Option<NodeRef<'a>> {
    match trie.lookup_prefix(input) {
        Some(node) => Some(node),
        None => {
            trace!(input, ?fallback, "no node for input");
            match fallback {
                Fallback::Root => Some(trie.root()),
                Fallback::Empty => None,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append the button ids of each node.
    pub show_ids: bool,
    /// Levels drawn below the top node; deeper subtrees collapse to `…`.
    pub max_depth: Option<usize>,
    /// Label of the top node, whatever its edge.
    pub root_label: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_ids: true,
            max_depth: None,
            root_label: "root".to_string(),
        }
    }
}

/// Display adapter drawing the subtree under `node`.
pub struct TreeView<'a, 'o> {
    pub node: NodeRef<'a>,
    pub options: &'o RenderOptions,
}

impl fmt::Display for TreeView<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // (node, depth); children pushed in reverse so they pop in edge order.
        let mut stack = vec![(self.node, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let indent = "  ".repeat(depth);
            write!(f, "{indent}")?;
            if depth == 0 {
                f.write_str(&self.options.root_label)?;
            } else {
                match node.edge() {
                    Some(' ') => f.write_str("␣")?,
                    Some(ch) => write!(f, "{ch}")?,
                    None => f.write_str(&self.options.root_label)?,
                }
            }
            if node.is_end_of_query() {
                f.write_str("*")?;
            }
            if self.options.show_ids && !node.button_ids().is_empty() {
                f.write_str(" (")?;
                for (i, id) in node.button_ids().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str(")")?;
            }
            writeln!(f)?;

            if node.is_leaf() {
                continue;
            }
            if self.options.max_depth.is_some_and(|max| depth >= max) {
                writeln!(f, "{indent}  …")?;
                continue;
            }
            let children: Vec<_> = node.children().collect();
            for (_, child) in children.into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        Ok(())
    }
}

pub fn render_tree(node: NodeRef<'_>, options: &RenderOptions) -> String {
    TreeView { node, options }.to_string()
}
