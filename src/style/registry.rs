//! Document-wide style registry.
//!
//! Maps (font, quantized size, color) to stable `gsN` ids. Entries are
//! append-only: once an id is handed out it keeps its style for the rest of
//! the document's life, including across re-exports that start from a
//! previously saved table.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{GlobalStyleId, Style, StyleKey, StyleRef};

/// Append-only map of global style ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<GlobalStyleId, Style>",
    into = "BTreeMap<GlobalStyleId, Style>"
)]
pub struct StyleRegistry {
    entries: BTreeMap<GlobalStyleId, Style>,
    index: HashMap<StyleKey, GlobalStyleId>,
    next_id: u32,
}

impl StyleRegistry {
    /// Create an empty registry. The first id handed out is `gs1`.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Return the id for a style, allocating the next id if it is new.
    ///
    /// The stored entry carries the quantized size; existing entries are
    /// never modified.
    pub fn resolve_or_create(&mut self, style: &Style) -> GlobalStyleId {
        let key = style.key();
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        let id = GlobalStyleId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        log::debug!(
            "New global style {}: {} {} {}",
            id,
            style.font,
            style.quantized_size(),
            style.color_hex()
        );
        self.entries.insert(id, key.to_style());
        self.index.insert(key, id);
        id
    }

    /// Id of an already registered style.
    pub fn lookup(&self, style: &Style) -> Option<GlobalStyleId> {
        self.index.get(&style.key()).copied()
    }

    /// Style registered under an id.
    pub fn get(&self, id: GlobalStyleId) -> Option<&Style> {
        self.entries.get(&id)
    }

    /// Style registered under a tag name such as `gs3`.
    pub fn get_by_tag(&self, tag: &str) -> Option<&Style> {
        tag.parse::<GlobalStyleId>()
            .ok()
            .and_then(|id| self.entries.get(&id))
    }

    /// Resolve a style reference into a concrete style.
    ///
    /// Unknown ids degrade to `fallback`.
    pub fn resolve(&self, style_ref: &StyleRef, fallback: &Style) -> Style {
        match style_ref {
            StyleRef::Direct(style) => style.clone(),
            StyleRef::Named(id) => match self.entries.get(id) {
                Some(style) => style.clone(),
                None => {
                    log::warn!("Unknown global style {}, using fallback", id);
                    fallback.clone()
                }
            },
        }
    }

    /// Number of registered styles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GlobalStyleId, &Style)> {
        self.entries.iter().map(|(id, style)| (*id, style))
    }
}

impl From<BTreeMap<GlobalStyleId, Style>> for StyleRegistry {
    fn from(entries: BTreeMap<GlobalStyleId, Style>) -> Self {
        let mut index = HashMap::new();
        // BTreeMap iterates in id order, so a duplicated triple maps to its lowest id.
        for (id, style) in &entries {
            index.entry(style.key()).or_insert(*id);
        }
        let next_id = entries.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        Self {
            entries,
            index,
            next_id,
        }
    }
}

impl From<StyleRegistry> for BTreeMap<GlobalStyleId, Style> {
    fn from(registry: StyleRegistry) -> Self {
        registry.entries
    }
}
