//! button-trie CLI
//!
//! Builds the query index from a button catalog and prints the subtree under
//! each prefix, either given as arguments or read line by line from stdin.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::Level;

use button_trie::{Catalog, Fallback, View, ViewMode};

#[derive(Parser, Debug)]
#[command(name = "button-trie")]
#[command(version, about = "Show which canned-response buttons a typed prefix can reach")]
struct Cli {
    /// JSON catalog (array of {id, text, queries}); defaults to the bundled one.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// What to show when a prefix matches nothing.
    #[arg(long, value_enum, default_value_t = FallbackArg::Root)]
    fallback: FallbackArg,

    /// Levels drawn below the matched node.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Hide button ids in the tree.
    #[arg(long)]
    no_ids: bool,

    /// List matching whole queries with their buttons instead of the tree.
    #[arg(long)]
    completions: bool,

    /// Log verbosity (-v info, -vv debug, -vvv trace), written to stderr.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Prefixes to look up. Reads stdin when none are given.
    prefixes: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackArg {
    Root,
    Empty,
}

impl From<FallbackArg> for Fallback {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Root => Fallback::Root,
            FallbackArg::Empty => Fallback::Empty,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::bundled(),
    };
    let mut view = View::new(catalog);
    view.fallback = cli.fallback.into();
    view.render.show_ids = !cli.no_ids;
    view.render.max_depth = cli.max_depth;
    if cli.completions {
        view.mode = ViewMode::Completions;
    }
    tracing::info!(
        buttons = view.catalog().len(),
        queries = view.trie().len(),
        nodes = view.trie().node_count(),
        "index ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.prefixes.is_empty() {
        view.run_lines(io::stdin().lock(), &mut out).context("reading stdin")?;
    } else {
        for prefix in &cli.prefixes {
            view.show(&mut out, prefix)?;
        }
    }
    Ok(())
}
