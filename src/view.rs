//! Line-oriented presentation of prefix lookups: each input line is echoed
//! and followed by either the resolved subtree or the matching whole queries.

use std::borrow::Cow;
use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::render::{resolve, Fallback, RenderOptions, TreeView};
use crate::{Catalog, Trie};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Draw the subtree under the prefix.
    #[default]
    Tree,
    /// List whole queries under the prefix with their button texts.
    Completions,
}

pub struct View {
    catalog: Catalog,
    trie: Trie,
    pub fallback: Fallback,
    pub render: RenderOptions,
    pub mode: ViewMode,
}

impl View {
    /// Builds the index for `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        let trie = catalog.build_index();
        Self {
            catalog,
            trie,
            fallback: Fallback::default(),
            render: RenderOptions::default(),
            mode: ViewMode::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn show(&self, out: &mut impl Write, input: &str) -> io::Result<()> {
        writeln!(out, "> {input}")?;
        if self.mode == ViewMode::Completions {
            return self.show_completions(out, input);
        }
        match resolve(&self.trie, input, self.fallback) {
            Some(node) => write!(
                out,
                "{}",
                TreeView {
                    node,
                    options: &self.render,
                }
            ),
            None => writeln!(out, "(no matches)"),
        }
    }

    fn show_completions(&self, out: &mut impl Write, input: &str) -> io::Result<()> {
        let Some(completions) = self.trie.completions(input) else {
            return writeln!(out, "(no matches)");
        };
        for (query, node) in completions {
            let texts: Vec<&str> = node
                .button_ids()
                .iter()
                .filter_map(|&id| self.catalog.button(id))
                .map(|b| b.text.as_str())
                .collect();
            writeln!(out, "{query}  [{}]", texts.join(" | "))?;
        }
        Ok(())
    }

    /// Shows every line of `input`, one lookup per line.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD and the line is still looked up;
    /// only I/O failures end the loop.
    pub fn run_lines(&self, mut input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                warn!(bytes = buf.len(), "input line is not valid UTF-8, replacing invalid bytes");
            }
            self.show(out, &line)?;
            out.flush()?;
        }
    }
}
