//! Button catalog: the records a [`Trie`] is built from.
//!
//! A catalog file is a JSON array of buttons:
//!
//! ```json
//! [{ "id": 3, "text": "Cancel delivery", "queries": ["cancel delivery"] }]
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{ButtonId, Trie};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid catalog json")]
    Json(#[from] serde_json::Error),
}

/// A canned-response button and the example queries that should surface it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: ButtonId,
    pub text: String,
    #[serde(default)]
    pub queries: Vec<String>,
}

impl Button {
    pub fn new<Q: Into<String>>(
        id: ButtonId,
        text: impl Into<String>,
        queries: impl IntoIterator<Item = Q>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            queries: queries.into_iter().map(Into::into).collect(),
        }
    }
}

const BUNDLED: &[(ButtonId, &str, &[&str])] = &[
    (
        1,
        "Where is my order",
        &[
            "where is my order",
            "late",
            "track my order",
            "order status",
            "check order",
            "order tracking",
        ],
    ),
    (
        2,
        "What can I do now (my package is late)",
        &[
            "where is my order",
            "late",
            "my package is late",
            "package delayed",
            "late delivery",
            "delivery not on time",
            "package hasn't arrived",
        ],
    ),
    (
        3,
        "Cancel delivery",
        &[
            "cancel delivery",
            "stop delivery",
            "abort delivery",
            "delivery cancellation",
            "cancel my shipment",
            "where do I cancel the delivery",
            "who do i contact for canceling delivery",
        ],
    ),
    (
        4,
        "Change delivery address",
        &[
            "change delivery address",
            "update shipping address",
            "modify delivery location",
            "new delivery address",
            "alter shipping address",
        ],
    ),
];

/// Ordered, read-only list of buttons.
///
/// Ids are expected to be unique and every button to carry queries, but
/// neither is enforced; loading only warns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Button>", into = "Vec<Button>")]
pub struct Catalog {
    buttons: Vec<Button>,
}

impl From<Vec<Button>> for Catalog {
    fn from(buttons: Vec<Button>) -> Self {
        Self::new(buttons)
    }
}

impl From<Catalog> for Vec<Button> {
    fn from(catalog: Catalog) -> Self {
        catalog.buttons
    }
}

impl Catalog {
    pub fn new(buttons: Vec<Button>) -> Self {
        let catalog = Self { buttons };
        catalog.audit();
        catalog
    }

    /// The four delivery-support buttons shipped with the crate.
    pub fn bundled() -> Self {
        Self {
            buttons: BUNDLED
                .iter()
                .map(|&(id, text, queries)| Button::new(id, text, queries.iter().copied()))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!(path = %path.display(), buttons = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// First button with `id`.
    pub fn button(&self, id: ButtonId) -> Option<&Button> {
        self.buttons.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn build_index(&self) -> Trie {
        build_index(&self.buttons)
    }

    fn audit(&self) {
        let mut ids = HashSet::with_capacity(self.buttons.len());
        for button in &self.buttons {
            if !ids.insert(button.id) {
                warn!(id = button.id, text = %button.text, "duplicate button id in catalog");
            }
            if button.queries.is_empty() {
                warn!(id = button.id, text = %button.text, "button has no queries");
            }
        }
    }
}

/// Inserts every query of every button, tagged with the button's id.
///
/// Insertion order does not affect the result. The returned trie has its
/// spare capacity released and is ready to be shared read-only.
pub fn build_index(buttons: &[Button]) -> Trie {
    let mut trie = Trie::new();
    let mut inserted = 0usize;
    for button in buttons {
        for query in &button.queries {
            trie.insert(query, button.id);
            inserted += 1;
        }
    }
    trie.shrink_to_fit();

    debug!(
        buttons = buttons.len(),
        inserted,
        distinct = trie.len(),
        nodes = trie.node_count(),
        bytes = trie.memory_usage(),
        "built query index"
    );
    trie
}
